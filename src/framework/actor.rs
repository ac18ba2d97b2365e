//! # Generic Actor Server
//!
//! `ResourceActor<T>` owns every entity of type `T` and processes requests
//! sequentially in its own Tokio task, so entity state needs no locks.

use super::client::ResourceClient;
use super::entity::ActorEntity;
use super::error::FrameworkError;
use super::message::ResourceRequest;
use std::collections::HashMap;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// An entity together with the watch channel its observers listen on.
struct Slot<T: ActorEntity> {
    entity: T,
    watch: watch::Sender<T>,
}

impl<T: ActorEntity> Slot<T> {
    fn new(entity: T) -> Self {
        let (watch, _) = watch::channel(entity.clone());
        Self { entity, watch }
    }

    /// Pushes the current entity to watchers if it differs from the last
    /// published snapshot.
    fn publish(&self) -> bool {
        let entity = &self.entity;
        self.watch.send_if_modified(|current| {
            if current == entity {
                false
            } else {
                *current = entity.clone();
                true
            }
        })
    }
}

/// The generic actor that manages a collection of entities.
///
/// **Concurrency Model**: one message at a time. A request handler may await
/// an entity hook, and nothing else touches the store meanwhile.
///
/// # Usage Pattern
///
/// 1. **Create**: `ResourceActor::new()` returns the actor and its client.
/// 2. **Wire**: pass dependencies into `actor.run(context)`.
/// 3. **Run**: spawn the run loop in a background task.
///
/// # Operations
///
/// * **Create**: rejects ids already present, builds the entity with
///   `from_create_params`, runs `on_create`, stores it and opens its watch
///   channel.
/// * **Get**: clones the entity if present.
/// * **Update** / **Action**: run the hook on the stored entity, then publish
///   the new snapshot if it changed.
/// * **Delete**: runs `on_delete`, removes the entity and closes its watch
///   channel.
/// * **Subscribe**: returns a receiver primed with the current snapshot.
pub struct ResourceActor<T: ActorEntity> {
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    store: HashMap<T::Id, Slot<T>>,
}

impl<T: ActorEntity> ResourceActor<T> {
    /// Creates a new `ResourceActor` and its associated `ResourceClient`.
    ///
    /// `buffer_size` is the capacity of the request channel; callers wait for
    /// space when it is full.
    pub fn new(buffer_size: usize) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            store: HashMap::new(),
        };
        let client = ResourceClient::new(sender);
        (actor, client)
    }

    /// Runs the actor's event loop, processing messages until every client
    /// has been dropped.
    pub async fn run(mut self, context: T::Context) {
        // Extract just the type name (e.g., "Cart" instead of "cart_sync::model::cart::Cart")
        let entity_type = std::any::type_name::<T>()
            .split("::")
            .last()
            .unwrap_or("Unknown");
        info!(entity_type, "Actor started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ResourceRequest::Create {
                    id,
                    params,
                    respond_to,
                } => {
                    debug!(entity_type, %id, ?params, "Create");
                    if self.store.contains_key(&id) {
                        warn!(entity_type, %id, "Already exists");
                        let _ = respond_to.send(Err(FrameworkError::AlreadyExists(id.to_string())));
                        continue;
                    }

                    match T::from_create_params(id.clone(), params) {
                        Ok(mut item) => {
                            if let Err(e) = item.on_create(&context).await {
                                warn!(entity_type, %id, error = %e, "on_create failed");
                                let _ =
                                    respond_to.send(Err(FrameworkError::EntityError(Box::new(e))));
                                continue;
                            }
                            self.store.insert(id.clone(), Slot::new(item));
                            info!(entity_type, %id, size = self.store.len(), "Created");
                            let _ = respond_to.send(Ok(id));
                        }
                        Err(e) => {
                            warn!(entity_type, %id, error = %e, "Create failed");
                            let _ = respond_to.send(Err(FrameworkError::EntityError(Box::new(e))));
                        }
                    }
                }
                ResourceRequest::Get { id, respond_to } => {
                    let item = self.store.get(&id).map(|slot| slot.entity.clone());
                    let found = item.is_some();
                    debug!(entity_type, %id, found, "Get");
                    let _ = respond_to.send(Ok(item));
                }
                ResourceRequest::Update {
                    id,
                    update,
                    respond_to,
                } => {
                    debug!(entity_type, %id, ?update, "Update");
                    if let Some(slot) = self.store.get_mut(&id) {
                        if let Err(e) = slot.entity.on_update(update, &context).await {
                            warn!(entity_type, %id, error = %e, "Update failed");
                            let _ = respond_to.send(Err(FrameworkError::EntityError(Box::new(e))));
                            continue;
                        }
                        let published = slot.publish();
                        info!(entity_type, %id, published, "Updated");
                        let _ = respond_to.send(Ok(slot.entity.clone()));
                    } else {
                        warn!(entity_type, %id, "Not found");
                        let _ = respond_to.send(Err(FrameworkError::NotFound(id.to_string())));
                    }
                }
                ResourceRequest::Delete { id, respond_to } => {
                    debug!(entity_type, %id, "Delete");
                    if let Some(slot) = self.store.get(&id) {
                        if let Err(e) = slot.entity.on_delete(&context).await {
                            warn!(entity_type, %id, error = %e, "on_delete failed");
                            let _ = respond_to.send(Err(FrameworkError::EntityError(Box::new(e))));
                            continue;
                        }
                        self.store.remove(&id);
                        info!(entity_type, %id, size = self.store.len(), "Deleted");
                        let _ = respond_to.send(Ok(()));
                    } else {
                        warn!(entity_type, %id, "Not found");
                        let _ = respond_to.send(Err(FrameworkError::NotFound(id.to_string())));
                    }
                }
                ResourceRequest::Action {
                    id,
                    action,
                    respond_to,
                } => {
                    debug!(entity_type, %id, ?action, "Action");
                    if let Some(slot) = self.store.get_mut(&id) {
                        let result = slot
                            .entity
                            .handle_action(action, &context)
                            .await
                            .map_err(|e| FrameworkError::EntityError(Box::new(e)));
                        match &result {
                            Ok(_) => {
                                let published = slot.publish();
                                debug!(entity_type, %id, published, "Action ok");
                            }
                            Err(e) => warn!(entity_type, %id, error = %e, "Action failed"),
                        }
                        let _ = respond_to.send(result);
                    } else {
                        warn!(entity_type, %id, "Not found");
                        let _ = respond_to.send(Err(FrameworkError::NotFound(id.to_string())));
                    }
                }
                ResourceRequest::Subscribe { id, respond_to } => {
                    let receiver = self.store.get(&id).map(|slot| slot.watch.subscribe());
                    debug!(entity_type, %id, found = receiver.is_some(), "Subscribe");
                    let _ = respond_to
                        .send(receiver.ok_or_else(|| FrameworkError::NotFound(id.to_string())));
                }
            }
        }

        info!(entity_type, size = self.store.len(), "Shutdown");
    }
}
