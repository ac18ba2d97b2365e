use crate::framework::{ActorEntity, FrameworkError, ResourceClient};
use async_trait::async_trait;
use tokio::sync::watch;

/// Trait for resource-specific clients to inherit the standard read
/// operations.
///
/// This trait reduces boilerplate by providing default implementations for
/// `get` and `subscribe` with the client's own error mapping.
#[async_trait]
pub trait ActorClient<T: ActorEntity>: Send + Sync {
    /// The resource-specific error type.
    type Error: From<String> + Send + Sync;

    /// Access the inner generic ResourceClient.
    fn inner(&self) -> &ResourceClient<T>;

    /// Map framework errors to the specific resource error type.
    fn map_error(e: FrameworkError) -> Self::Error;

    /// Fetch an entity by ID.
    #[tracing::instrument(skip(self))]
    async fn get(&self, id: T::Id) -> Result<Option<T>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().get(id).await.map_err(Self::map_error)
    }

    /// Subscribe to snapshots of an entity.
    #[tracing::instrument(skip(self))]
    async fn subscribe(&self, id: T::Id) -> Result<watch::Receiver<T>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().subscribe(id).await.map_err(Self::map_error)
    }
}
