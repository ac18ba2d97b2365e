//! # Cart Actor
//!
//! The local mirror of the remote cart, owned by one
//! [`ResourceActor<Cart>`](crate::framework::ResourceActor).
//!
//! ## Structure
//!
//! - [`entity`] - [`ActorEntity`](crate::framework::ActorEntity) implementation for [`Cart`]
//! - [`error`] - [`CartError`], whose `Display` is the user-facing message
//! - [`actions`] - [`CartAction`] and [`CartActionResult`]
//! - [`reconcile`] - merging server line lists while keeping overlay and order
//! - [`new()`] - Factory function that creates the actor and client
//!
//! ## Key Features
//!
//! - **Server-confirmed state**: lines change only when a reply is merged
//! - **Stock preconditions**: checked inside the actor, before any call
//! - **Derived summary**: rebuilt from the lines after every change

pub mod actions;
pub mod entity;
pub mod error;
pub mod reconcile;

pub use actions::*;
pub use error::*;

use crate::framework::{ResourceActor, ResourceClient};
use crate::model::Cart;

/// Creates a new Cart actor and its client.
pub fn new(buffer_size: usize) -> (ResourceActor<Cart>, ResourceClient<Cart>) {
    ResourceActor::new(buffer_size)
}
