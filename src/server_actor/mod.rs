//! # Backend Cart Actor
//!
//! An in-memory stand-in for the remote cart service, run by the same
//! framework as the mirror. It assigns line ids (`line_1`, `line_2`, ...),
//! merges adds by strict offer identity, enforces stock ceilings and keeps a
//! price book that price re-validation reads from.
//!
//! [`ServerCartClient`](crate::clients::ServerCartClient) exposes it through
//! the [`CartService`](crate::clients::CartService) trait.

pub mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;

use crate::framework::{ResourceActor, ResourceClient};
use crate::model::ServerCart;

/// Creates a new backend cart actor and its client.
pub fn new(buffer_size: usize) -> (ResourceActor<ServerCart>, ResourceClient<ServerCart>) {
    ResourceActor::new(buffer_size)
}
