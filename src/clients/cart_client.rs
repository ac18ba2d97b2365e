//! # Cart Client
//!
//! Typed access to the local mirror. Each method sends one [`CartAction`] and
//! unwraps the matching [`CartActionResult`] variant. Entity errors come back
//! as the original [`CartError`], so precondition failures keep their type.
use crate::cart_actor::{
    CartAction, CartActionResult, CartError, MergeMode, Merged, QuantityPlan, Repriced,
};
use crate::clients::actor_client::ActorClient;
use crate::framework::{FrameworkError, ResourceClient};
use crate::model::{
    Cart, CartCreate, CartId, CartUpdate, LineId, OfferIdentity, RemoteLine, RemotePriceChange,
};
use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, instrument};

/// Client for the cart mirror actor, bound to one cart.
#[derive(Clone)]
pub struct CartClient {
    inner: ResourceClient<Cart>,
    id: CartId,
}

#[async_trait]
impl ActorClient<Cart> for CartClient {
    type Error = CartError;

    fn inner(&self) -> &ResourceClient<Cart> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        match e.entity_error::<CartError>() {
            Some(err) => err.clone(),
            None => CartError::ActorCommunicationError(e.to_string()),
        }
    }
}

/// Unwraps the result variant an action must produce.
macro_rules! expect_result {
    ($result:expr, $variant:ident) => {
        match $result {
            CartActionResult::$variant(value) => Ok(value),
            other => Err(CartError::ActorCommunicationError(format!(
                "{} returned {:?}",
                stringify!($variant),
                other
            ))),
        }
    };
}

impl CartClient {
    pub fn new(inner: ResourceClient<Cart>, id: CartId) -> Self {
        Self { inner, id }
    }

    pub fn id(&self) -> &CartId {
        &self.id
    }

    /// Creates the mirror entity.
    #[instrument(skip(self))]
    pub async fn open(&self, params: CartCreate) -> Result<CartId, CartError> {
        debug!("Sending request");
        self.inner
            .create(self.id.clone(), params)
            .await
            .map_err(Self::map_error)
    }

    /// Current snapshot of the mirror.
    pub async fn snapshot(&self) -> Result<Cart, CartError> {
        self.get(self.id.clone())
            .await?
            .ok_or_else(|| CartError::ActorCommunicationError(format!("Cart {} is not open", self.id)))
    }

    /// Receiver primed with the current snapshot and updated on every change.
    pub async fn watch(&self) -> Result<watch::Receiver<Cart>, CartError> {
        self.subscribe(self.id.clone()).await
    }

    #[instrument(skip(self))]
    pub async fn update(&self, update: CartUpdate) -> Result<Cart, CartError> {
        debug!("Sending request");
        self.inner
            .update(self.id.clone(), update)
            .await
            .map_err(Self::map_error)
    }

    async fn act(&self, action: CartAction) -> Result<CartActionResult, CartError> {
        self.inner
            .perform_action(self.id.clone(), action)
            .await
            .map_err(Self::map_error)
    }

    /// Stock check for an add; marks the call in flight when it passes and
    /// returns the revision to merge the reply against.
    #[instrument(skip(self))]
    pub async fn prepare_add(
        &self,
        identity: OfferIdentity,
        quantity: u32,
        stock: Option<u32>,
    ) -> Result<u64, CartError> {
        let result = self
            .act(CartAction::PrepareAdd {
                identity,
                quantity,
                stock,
            })
            .await?;
        expect_result!(result, PrepareAdd)
    }

    #[instrument(skip(self))]
    pub async fn prepare_quantity(
        &self,
        line: LineId,
        quantity: u32,
    ) -> Result<QuantityPlan, CartError> {
        let result = self
            .act(CartAction::PrepareQuantity { line, quantity })
            .await?;
        expect_result!(result, PrepareQuantity)
    }

    pub async fn begin(&self) -> Result<u64, CartError> {
        let result = self.act(CartAction::Begin).await?;
        expect_result!(result, Begin)
    }

    /// Folds a current server line list into the mirror.
    pub async fn merge(&self, lines: Vec<RemoteLine>, mode: MergeMode) -> Result<Merged, CartError> {
        self.merge_from(lines, mode, None).await
    }

    /// Folds a line list produced for the call that started at `basis`.
    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn merge_from(
        &self,
        lines: Vec<RemoteLine>,
        mode: MergeMode,
        basis: Option<u64>,
    ) -> Result<Merged, CartError> {
        let result = self.act(CartAction::Merge { lines, mode, basis }).await?;
        expect_result!(result, Merge)
    }

    #[instrument(skip(self, survivors))]
    pub async fn drop_line(
        &self,
        line: LineId,
        survivors: Option<Vec<RemoteLine>>,
        basis: u64,
    ) -> Result<Merged, CartError> {
        let result = self
            .act(CartAction::DropLine {
                line,
                survivors,
                basis,
            })
            .await?;
        expect_result!(result, DropLine)
    }

    pub async fn reset(&self) -> Result<(), CartError> {
        let result = self.act(CartAction::Reset).await?;
        expect_result!(result, Reset)
    }

    pub async fn finish(&self, error: Option<String>) -> Result<(), CartError> {
        let result = self.act(CartAction::Finish(error)).await?;
        expect_result!(result, Finish)
    }

    pub async fn record_error(&self, error: String) -> Result<(), CartError> {
        let result = self.act(CartAction::RecordError(error)).await?;
        expect_result!(result, RecordError)
    }

    pub async fn clear_error(&self) -> Result<(), CartError> {
        let result = self.act(CartAction::ClearError).await?;
        expect_result!(result, ClearError)
    }

    pub async fn toggle_select(&self, line: LineId) -> Result<bool, CartError> {
        let result = self.act(CartAction::ToggleSelect(line)).await?;
        expect_result!(result, ToggleSelect)
    }

    pub async fn toggle_favorite(&self, line: LineId) -> Result<bool, CartError> {
        let result = self.act(CartAction::ToggleFavorite(line)).await?;
        expect_result!(result, ToggleFavorite)
    }

    pub async fn set_comment(&self, line: LineId, comment: String) -> Result<(), CartError> {
        let result = self.act(CartAction::SetComment { line, comment }).await?;
        expect_result!(result, SetComment)
    }

    pub async fn select_all(&self) -> Result<bool, CartError> {
        let result = self.act(CartAction::SelectAll).await?;
        expect_result!(result, SelectAll)
    }

    /// Takes the price-refresh slot and returns the revision; `None` when it
    /// is busy or the cart is empty.
    pub async fn begin_price_refresh(&self) -> Result<Option<u64>, CartError> {
        let result = self.act(CartAction::BeginPriceRefresh).await?;
        expect_result!(result, BeginPriceRefresh)
    }

    #[instrument(skip(self, lines, changes), fields(changes = changes.len()))]
    pub async fn apply_prices(
        &self,
        lines: Option<Vec<RemoteLine>>,
        changes: Vec<RemotePriceChange>,
        basis: u64,
    ) -> Result<Repriced, CartError> {
        let result = self
            .act(CartAction::ApplyPrices {
                lines,
                changes,
                basis,
            })
            .await?;
        expect_result!(result, ApplyPrices)
    }

    pub async fn abort_price_refresh(&self, error: Option<String>) -> Result<(), CartError> {
        let result = self.act(CartAction::AbortPriceRefresh(error)).await?;
        expect_result!(result, AbortPriceRefresh)
    }

    pub async fn dismiss_price_changes(&self) -> Result<(), CartError> {
        let result = self.act(CartAction::DismissPriceChanges).await?;
        expect_result!(result, DismissPriceChanges)
    }
}
