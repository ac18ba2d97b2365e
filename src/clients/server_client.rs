//! # Server Cart Client
//!
//! Wraps a `ResourceClient<ServerCart>` and serves it as a [`CartService`].
//! Backend rejections become `success: false` replies; an unreachable actor
//! becomes [`ServiceError::Transport`].
use crate::clients::actor_client::ActorClient;
use crate::clients::service::{CartService, ServiceError};
use crate::framework::{FrameworkError, ResourceClient};
use crate::model::{
    CartId, LineId, MutationReply, NewCartItem, OfferIdentity, PriceBookUpdate, PriceUpdateReply,
    RemoteLine, ServerCart, ServerCartCreate,
};
use crate::server_actor::{ServerCartAction, ServerCartResult, ServerError};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Client for one cart held by the backend actor.
#[derive(Clone)]
pub struct ServerCartClient {
    inner: ResourceClient<ServerCart>,
    cart: CartId,
}

#[async_trait]
impl ActorClient<ServerCart> for ServerCartClient {
    type Error = ServerError;

    fn inner(&self) -> &ResourceClient<ServerCart> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        match e.entity_error::<ServerError>() {
            Some(err) => err.clone(),
            None => ServerError::ActorCommunicationError(e.to_string()),
        }
    }
}

/// Reply text for a refused request, or the transport failure that kept it
/// from being answered.
fn refusal(e: FrameworkError) -> Result<String, ServiceError> {
    if e.is_transport() {
        return Err(ServiceError::Transport(e.to_string()));
    }
    if let Some(err) = e.entity_error::<ServerError>() {
        return Ok(err.to_string());
    }
    match e {
        FrameworkError::NotFound(id) => Ok(format!("Cart not found: {id}")),
        other => Err(ServiceError::Rejected(other.to_string())),
    }
}

fn unexpected(result: ServerCartResult) -> ServiceError {
    ServiceError::Protocol(format!("{result:?}"))
}

impl ServerCartClient {
    pub fn new(inner: ResourceClient<ServerCart>, cart: CartId) -> Self {
        Self { inner, cart }
    }

    pub fn cart_id(&self) -> &CartId {
        &self.cart
    }

    /// Opens the backend cart with optional starting lines.
    #[instrument(skip(self))]
    pub async fn open(&self, params: ServerCartCreate) -> Result<CartId, ServerError> {
        debug!("Sending request");
        self.inner
            .create(self.cart.clone(), params)
            .await
            .map_err(Self::map_error)
    }

    /// Publishes a catalog price for an offer. Lines pick it up on the next
    /// re-validation.
    #[instrument(skip(self))]
    pub async fn set_price(&self, offer: OfferIdentity, price: f64) -> Result<(), ServerError> {
        debug!("Sending request");
        self.inner
            .update(self.cart.clone(), PriceBookUpdate { offer, price })
            .await
            .map(|_| ())
            .map_err(Self::map_error)
    }

    async fn mutate(&self, action: ServerCartAction) -> Result<MutationReply, ServiceError> {
        match self.inner.perform_action(self.cart.clone(), action).await {
            Ok(
                ServerCartResult::Add(lines)
                | ServerCartResult::Remove(lines)
                | ServerCartResult::SetQuantity(lines),
            ) => Ok(MutationReply::ok(lines)),
            Ok(ServerCartResult::Clear(())) => Ok(MutationReply::ok(Vec::new())),
            Ok(other) => Err(unexpected(other)),
            Err(e) => refusal(e).map(MutationReply::rejected),
        }
    }
}

#[async_trait]
impl CartService for ServerCartClient {
    #[instrument(skip(self), fields(cart = %self.cart))]
    async fn get_cart(&self) -> Result<Vec<RemoteLine>, ServiceError> {
        debug!("Sending request");
        match self.inner.get(self.cart.clone()).await {
            Ok(cart) => Ok(cart.map(|cart| cart.lines).unwrap_or_default()),
            Err(e) if e.is_transport() => Err(ServiceError::Transport(e.to_string())),
            Err(e) => Err(ServiceError::Rejected(e.to_string())),
        }
    }

    #[instrument(skip(self, item), fields(cart = %self.cart, name = %item.name, quantity = item.quantity))]
    async fn add_to_cart(&self, item: NewCartItem) -> Result<MutationReply, ServiceError> {
        debug!("Sending request");
        self.mutate(ServerCartAction::Add(item)).await
    }

    #[instrument(skip(self), fields(cart = %self.cart))]
    async fn remove_from_cart(&self, line: LineId) -> Result<MutationReply, ServiceError> {
        debug!("Sending request");
        self.mutate(ServerCartAction::Remove(line)).await
    }

    #[instrument(skip(self), fields(cart = %self.cart))]
    async fn update_quantity(
        &self,
        line: LineId,
        quantity: u32,
    ) -> Result<MutationReply, ServiceError> {
        debug!("Sending request");
        self.mutate(ServerCartAction::SetQuantity { line, quantity })
            .await
    }

    #[instrument(skip(self), fields(cart = %self.cart))]
    async fn update_prices(&self) -> Result<PriceUpdateReply, ServiceError> {
        debug!("Sending request");
        match self
            .inner
            .perform_action(self.cart.clone(), ServerCartAction::RevalidatePrices)
            .await
        {
            Ok(ServerCartResult::RevalidatePrices { lines, changes }) => {
                Ok(PriceUpdateReply::ok(lines, changes))
            }
            Ok(other) => Err(unexpected(other)),
            Err(e) => refusal(e).map(PriceUpdateReply::rejected),
        }
    }

    #[instrument(skip(self), fields(cart = %self.cart))]
    async fn clear_cart(&self) -> Result<MutationReply, ServiceError> {
        debug!("Sending request");
        self.mutate(ServerCartAction::Clear).await
    }
}
