//! # ActorEntity Trait
//!
//! The `ActorEntity` trait is the contract every resource managed by a
//! [`ResourceActor`](super::ResourceActor) implements: the local cart mirror
//! ([`Cart`](crate::model::Cart)) and the in-memory backend cart
//! ([`ServerCart`](crate::model::ServerCart)) both go through it.
//!
//! # Provided Methods (Hooks)
//! - [`ActorEntity::on_create`]
//! - [`ActorEntity::on_delete`]
//!
//! Both default to `Ok(())`.
//!
//! # Identity
//! Ids are chosen by the caller and passed in with the create request. The
//! actor never invents them, so a mirror of a remote resource can be keyed by
//! the same id the remote side uses.

use async_trait::async_trait;
use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Trait that any resource entity must implement to be managed by ResourceActor.
///
/// # Async & Context
/// The trait is `#[async_trait]` so hooks may await other actors. The
/// `Context` type is injected into every hook at `run()` time ("late binding").
///
/// # Snapshots
/// `PartialEq` is required so the actor only republishes a snapshot to
/// watchers when a request actually changed the entity.
#[async_trait]
pub trait ActorEntity: Clone + PartialEq + Send + Sync + 'static {
    /// The unique identifier for this entity, supplied by the caller on create.
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug;

    /// The data required to create a new instance.
    type Create: Send + Sync + Debug;

    /// The data required to update an existing instance.
    type Update: Send + Sync + Debug;

    /// Resource-specific operations (e.g. `ToggleSelect`, `AddLine`).
    type Action: Send + Sync + Debug;

    /// The result type returned by custom actions.
    type ActionResult: Send + Sync + Debug;

    /// The runtime context (dependencies) injected into the actor.
    /// Use `()` if no dependencies are needed.
    type Context: Send + Sync;

    /// Per-actor error type. One enum covers every action of the entity.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Construct the full entity from the id and payload.
    /// Called synchronously before `on_create`.
    fn from_create_params(id: Self::Id, params: Self::Create) -> Result<Self, Self::Error>;

    // --- Lifecycle Hooks (Async) ---

    /// Called after the entity is constructed and before it is stored.
    async fn on_create(&mut self, _ctx: &Self::Context) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called when an update request is received.
    async fn on_update(
        &mut self,
        update: Self::Update,
        _ctx: &Self::Context,
    ) -> Result<(), Self::Error>;

    /// Called immediately before the entity is removed.
    async fn on_delete(&self, _ctx: &Self::Context) -> Result<(), Self::Error> {
        Ok(())
    }

    // --- Action Handler (Async) ---

    /// Handle a resource-specific action.
    ///
    /// An `Err` must leave the entity unchanged: the actor does not roll back
    /// partial edits.
    async fn handle_action(
        &mut self,
        action: Self::Action,
        _ctx: &Self::Context,
    ) -> Result<Self::ActionResult, Self::Error>;
}
