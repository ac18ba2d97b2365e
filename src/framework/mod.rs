//! Generic actor framework for mirrored resources.
//!
//! # Main Components
//!
//! - [`ActorEntity`] - Trait that resource types implement to be managed by actors
//! - [`ResourceActor`] - Generic actor that owns the entities and processes requests in order
//! - [`ResourceClient`] - Cloneable handle that sends requests to the actor
//! - [`FrameworkError`] - Errors raised by the plumbing (closed channels, missing ids)
//!
//! Entities are keyed by caller-supplied ids and every committed change is
//! republished on a per-entity `watch` channel, which is how presentation
//! code observes the cart without polling.
//!
//! # Testing
//!
//! See [`mock`] for utilities to test clients without spawning full actors.

pub mod actor;
pub mod client;
pub mod entity;
pub mod error;
pub mod message;
pub mod mock;

pub use actor::ResourceActor;
pub use client::ResourceClient;
pub use entity::ActorEntity;
pub use error::FrameworkError;
pub use message::{ResourceRequest, Response};
