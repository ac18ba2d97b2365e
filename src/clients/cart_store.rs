//! # Cart Store
//!
//! The public surface of the cart. Every server-calling operation follows
//! the same request / await / merge protocol:
//!
//! 1. wait for the line's lane, check preconditions in the mirror and mark
//!    the call in flight;
//! 2. call the [`CartService`];
//! 3. merge the confirmed reply into the mirror in one actor message;
//! 4. close the call and emit a notice.
//!
//! Step 1 returns the mirror's revision and step 3 merges against it, so a
//! slow reply cannot undo lines that other calls added or removed meanwhile.
//! A merge that finds a line above its stock clamps it and, once the
//! operation's lanes are free, asks the backend to store the ceiling.
//!
//! Precondition failures, refusals and transport errors all end up in
//! `last_error`, an error notice and the returned [`CartError`]. The in-flight
//! count is decremented on every path.
//!
//! Presentation code observes the cart through [`CartStore::watch`] and the
//! notices through [`CartStore::events`].

use crate::cart_actor::{Capped, CartError, MergeMode};
use crate::clients::cart_client::CartClient;
use crate::clients::lanes::{line_lane, LineLanes};
use crate::clients::service::{CartService, ServiceError};
use crate::model::{
    Cart, CartUpdate, DeliveryUpdate, LineId, MutationReply, NewCartItem, Notice, OfferIdentity,
    PriceChange, PriceUpdateReply, RemoteLine, StoreEvent,
};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

/// Server-calling operations and the messages shown for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Load,
    Add,
    Remove,
    UpdateQuantity,
    Clear,
    UpdatePrices,
}

impl Operation {
    /// Shown when the backend refuses without saying why.
    fn refused(self) -> &'static str {
        match self {
            Operation::Load => "Failed to load the cart",
            Operation::Add => "Failed to add the item",
            Operation::Remove => "Failed to remove the item",
            Operation::UpdateQuantity => "Failed to update the quantity",
            Operation::Clear => "Failed to clear the cart",
            Operation::UpdatePrices => "Failed to update prices",
        }
    }

    /// Shown when the backend could not be reached.
    fn unavailable(self) -> &'static str {
        match self {
            Operation::Load => "Could not load the cart",
            Operation::Add => "Could not add the item to the cart",
            Operation::Remove => "Could not remove the item from the cart",
            Operation::UpdateQuantity => "Could not update the item quantity",
            Operation::Clear => "Could not clear the cart",
            Operation::UpdatePrices => "Could not check current prices",
        }
    }

    /// Default success notice; `None` for operations that succeed quietly.
    fn succeeded(self) -> Option<&'static str> {
        match self {
            Operation::Remove => Some("Item removed from cart"),
            Operation::UpdateQuantity => Some("Quantity updated"),
            Operation::Clear => Some("Cart cleared"),
            Operation::Load | Operation::Add | Operation::UpdatePrices => None,
        }
    }
}

/// Accepts a successful reply or turns the outcome into the user-facing error.
fn accept(op: Operation, outcome: Result<MutationReply, ServiceError>) -> Result<MutationReply, CartError> {
    match outcome {
        Ok(reply) if reply.success => Ok(reply),
        Ok(reply) => {
            let message = reply
                .error
                .filter(|error| !error.trim().is_empty())
                .unwrap_or_else(|| op.refused().to_string());
            warn!(operation = ?op, %message, "Refused by cart service");
            Err(CartError::Service(message))
        }
        Err(ServiceError::Rejected(message)) if !message.trim().is_empty() => {
            warn!(operation = ?op, %message, "Cart service error");
            Err(CartError::Service(message))
        }
        Err(error) => {
            warn!(operation = ?op, %error, "Cart service call failed");
            Err(CartError::Service(op.unavailable().to_string()))
        }
    }
}

/// Splits the clamped lines off an applied reply.
fn take_capped<T>(
    applied: Result<(T, Vec<Capped>), CartError>,
) -> (Result<T, CartError>, Vec<Capped>) {
    match applied {
        Ok((value, capped)) => (Ok(value), capped),
        Err(error) => (Err(error), Vec::new()),
    }
}

fn cap_notice(ceiling: u32) -> Notice {
    Notice::info(format!(
        "Only {ceiling} available, quantity limited to {ceiling}"
    ))
}

/// Public cart API over the mirror actor and a remote [`CartService`].
///
/// Cheap to clone; clones share the mirror, the service and the lanes.
#[derive(Clone)]
pub struct CartStore {
    cart: CartClient,
    service: Arc<dyn CartService>,
    events: broadcast::Sender<StoreEvent>,
    lanes: LineLanes,
    currency: Arc<str>,
}

impl CartStore {
    pub fn new(cart: CartClient, service: Arc<dyn CartService>, event_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        Self {
            cart,
            service,
            events,
            lanes: LineLanes::new(),
            currency: Arc::from("RUB"),
        }
    }

    /// Currency filled into added items that do not name one.
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Arc::from(currency.into());
        self
    }

    // --- Observation ---

    pub async fn snapshot(&self) -> Result<Cart, CartError> {
        self.cart.snapshot().await
    }

    /// Snapshots of the mirror, pushed after every change.
    pub async fn watch(&self) -> Result<watch::Receiver<Cart>, CartError> {
        self.cart.watch().await
    }

    /// Notices and price-change announcements.
    pub fn events(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Whether an add of `offer` would increment an existing line.
    pub async fn contains_offer(&self, offer: &OfferIdentity) -> Result<bool, CartError> {
        Ok(self.cart.snapshot().await?.contains_offer(offer))
    }

    fn notify(&self, notice: Notice) {
        info!(level = ?notice.level, message = %notice.message, "Notice");
        // No subscribers is fine.
        let _ = self.events.send(StoreEvent::Notice(notice));
    }

    // --- Shared protocol steps ---

    /// Reports a failure that happened before any server call.
    async fn refuse(&self, error: CartError) -> CartError {
        if let Err(e) = self.cart.record_error(error.to_string()).await {
            warn!(error = %e, "Could not record cart error");
        }
        self.notify(Notice::error(error.to_string()));
        error
    }

    async fn refetch(&self, op: Operation) -> Result<Vec<RemoteLine>, CartError> {
        self.service.get_cart().await.map_err(|error| {
            warn!(operation = ?op, %error, "Refetch after mutation failed");
            CartError::Service(op.unavailable().to_string())
        })
    }

    /// Accepts the reply and merges the full cart it carries, refetching when
    /// the reply came without one. Returns the backend's message.
    async fn merge_reply(
        &self,
        op: Operation,
        outcome: Result<MutationReply, ServiceError>,
        basis: u64,
    ) -> Result<(Option<String>, Vec<Capped>), CartError> {
        let reply = accept(op, outcome)?;
        let message = reply.message.clone();
        let lines = match reply.into_items() {
            Some(lines) => lines,
            None => self.refetch(op).await?,
        };
        let merged = self
            .cart
            .merge_from(lines, MergeMode::Full, Some(basis))
            .await?;
        Ok((message, merged.capped))
    }

    /// Announces lines clamped during a merge and stores their ceiling on
    /// the backend, one lane at a time. Failures are logged only.
    async fn settle_capped(&self, capped: Vec<Capped>) {
        for Capped { line, ceiling } in capped {
            self.notify(cap_notice(ceiling));
            let _lane = self.lanes.acquire(Some(line_lane(&line))).await;
            let basis = match self.cart.begin().await {
                Ok(basis) => basis,
                Err(error) => {
                    warn!(%line, %error, "Could not sync clamped quantity");
                    continue;
                }
            };
            let outcome = self.service.update_quantity(line.clone(), ceiling).await;
            let (applied, still_over) = take_capped(
                self.merge_reply(Operation::UpdateQuantity, outcome, basis)
                    .await,
            );
            if !still_over.is_empty() {
                debug!(lines = still_over.len(), "Backend still above stock");
            }
            match self.conclude(Operation::UpdateQuantity, true, applied).await {
                Ok(()) => debug!(%line, ceiling, "Clamped quantity stored"),
                Err(error) => warn!(%line, %error, "Could not sync clamped quantity"),
            }
        }
    }

    /// Closes an in-flight call and emits its notice.
    async fn conclude(
        &self,
        op: Operation,
        silent: bool,
        applied: Result<Option<String>, CartError>,
    ) -> Result<(), CartError> {
        match applied {
            Ok(message) => {
                self.cart.finish(None).await?;
                if !silent {
                    if let Some(default) = op.succeeded() {
                        self.notify(Notice::success(message.unwrap_or_else(|| default.to_string())));
                    }
                }
                Ok(())
            }
            Err(error) => {
                if let Err(e) = self.cart.finish(Some(error.to_string())).await {
                    warn!(error = %e, "Could not close cart call");
                }
                if !silent {
                    self.notify(Notice::error(error.to_string()));
                }
                Err(error)
            }
        }
    }

    // --- Server-confirmed operations ---

    /// Fetches the remote cart into the mirror.
    ///
    /// Failures are logged and returned but not announced: an anonymous
    /// visitor without a cart is not an error worth showing.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<usize, CartError> {
        let basis = self.cart.begin().await?;
        let result = match self.service.get_cart().await {
            Ok(lines) => {
                self.cart
                    .merge_from(lines, MergeMode::Full, Some(basis))
                    .await
            }
            Err(error) => {
                warn!(%error, "Cart load failed");
                Err(CartError::Service(Operation::Load.unavailable().to_string()))
            }
        };
        self.cart.finish(None).await?;
        let merged = result?;
        info!(lines = merged.lines, "Cart loaded");
        self.settle_capped(merged.capped).await;
        Ok(merged.lines)
    }

    /// Adds an offer, or increments the line holding the same offer.
    #[instrument(skip(self, item), fields(name = %item.name, quantity = item.quantity))]
    pub async fn add_item(&self, mut item: NewCartItem) -> Result<(), CartError> {
        if item.currency.trim().is_empty() {
            item.currency = self.currency.to_string();
        }
        let (result, capped) = self.add_in_lane(item).await;
        self.settle_capped(capped).await;
        result
    }

    async fn add_in_lane(&self, item: NewCartItem) -> (Result<(), CartError>, Vec<Capped>) {
        let identity = item.identity();
        let _offer_lane = self.lanes.acquire(identity.lane_key()).await;
        let existing = match self.cart.snapshot().await {
            Ok(cart) => cart.find_offer(&identity).map(|line| line.id().clone()),
            Err(error) => return (Err(self.refuse(error).await), Vec::new()),
        };
        let _line_lane = self.lanes.acquire(existing.as_ref().map(line_lane)).await;

        let basis = match self
            .cart
            .prepare_add(identity, item.quantity, item.stock)
            .await
        {
            Ok(basis) => basis,
            Err(error) => return (Err(self.refuse(error).await), Vec::new()),
        };
        let outcome = self.service.add_to_cart(item).await;
        let (applied, capped) =
            take_capped(self.merge_reply(Operation::Add, outcome, basis).await);
        (self.conclude(Operation::Add, false, applied).await, capped)
    }

    /// Sets a line's quantity, clamped to its stock ceiling.
    ///
    /// Quantities below one are ignored. A clamped request is announced and
    /// the ceiling is sent instead; nothing is sent when the line already
    /// holds it.
    #[instrument(skip(self))]
    pub async fn update_quantity(&self, line: LineId, quantity: u32) -> Result<(), CartError> {
        if quantity < 1 {
            debug!("Ignoring quantity below one");
            return Ok(());
        }
        let (result, capped) = self.quantity_in_lane(line, quantity).await;
        self.settle_capped(capped).await;
        result
    }

    async fn quantity_in_lane(
        &self,
        line: LineId,
        quantity: u32,
    ) -> (Result<(), CartError>, Vec<Capped>) {
        let _lane = self.lanes.acquire(Some(line_lane(&line))).await;
        let plan = match self.cart.prepare_quantity(line.clone(), quantity).await {
            Ok(plan) => plan,
            Err(error) => return (Err(self.refuse(error).await), Vec::new()),
        };
        if let Some(cap) = plan.capped_at {
            self.notify(cap_notice(cap));
        }
        let Some(send) = plan.send else {
            return (Ok(()), Vec::new());
        };

        let outcome = self.service.update_quantity(line, send).await;
        let (applied, capped) = take_capped(
            self.merge_reply(Operation::UpdateQuantity, outcome, plan.basis)
                .await,
        );
        (
            self.conclude(Operation::UpdateQuantity, false, applied).await,
            capped,
        )
    }

    /// Removes a line and announces it.
    pub async fn remove_item(&self, line: LineId) -> Result<(), CartError> {
        self.remove(line, false).await
    }

    /// Removes a line without any notice, success or failure.
    pub async fn remove_item_silently(&self, line: LineId) -> Result<(), CartError> {
        self.remove(line, true).await
    }

    #[instrument(skip(self))]
    async fn remove(&self, line: LineId, silent: bool) -> Result<(), CartError> {
        let (result, capped) = self.remove_in_lane(line, silent).await;
        self.settle_capped(capped).await;
        result
    }

    async fn remove_in_lane(
        &self,
        line: LineId,
        silent: bool,
    ) -> (Result<(), CartError>, Vec<Capped>) {
        let _lane = self.lanes.acquire(Some(line_lane(&line))).await;
        let basis = match self.cart.begin().await {
            Ok(basis) => basis,
            Err(error) => {
                let error = if silent { error } else { self.refuse(error).await };
                return (Err(error), Vec::new());
            }
        };
        let outcome = self.service.remove_from_cart(line.clone()).await;
        let applied = match accept(Operation::Remove, outcome) {
            Ok(reply) => {
                let message = reply.message.clone();
                self.cart
                    .drop_line(line, reply.into_items(), basis)
                    .await
                    .map(|merged| (message, merged.capped))
            }
            Err(error) => Err(error),
        };
        let (applied, capped) = take_capped(applied);
        (self.conclude(Operation::Remove, silent, applied).await, capped)
    }

    /// Removes every selected line concurrently and announces the outcome
    /// once. Returns how many were removed.
    #[instrument(skip(self))]
    pub async fn remove_selected(&self) -> Result<usize, CartError> {
        let selected = self.cart.snapshot().await?.selected_ids();
        if selected.is_empty() {
            return Ok(0);
        }

        let mut removals = JoinSet::new();
        for line in selected {
            let store = self.clone();
            removals.spawn(async move { store.remove_item_silently(line).await });
        }

        let (mut removed, mut failed) = (0usize, 0usize);
        while let Some(joined) = removals.join_next().await {
            match joined {
                Ok(Ok(())) => removed += 1,
                Ok(Err(error)) => {
                    debug!(%error, "Bulk removal failed for one line");
                    failed += 1;
                }
                Err(error) => {
                    warn!(%error, "Bulk removal task failed");
                    failed += 1;
                }
            }
        }

        if failed == 0 {
            self.notify(Notice::success(format!("Removed: {removed}")));
        } else {
            self.notify(Notice::error(format!("Removed: {removed}, failed: {failed}")));
        }
        Ok(removed)
    }

    /// Empties the cart on the server and locally.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<(), CartError> {
        if let Err(error) = self.cart.begin().await {
            return Err(self.refuse(error).await);
        }
        let outcome = self.service.clear_cart().await;
        let applied = match accept(Operation::Clear, outcome) {
            Ok(reply) => self.cart.reset().await.map(|_| reply.message),
            Err(error) => Err(error),
        };
        self.conclude(Operation::Clear, false, applied).await
    }

    /// Same as [`CartStore::clear_cart`].
    pub async fn remove_all(&self) -> Result<(), CartError> {
        self.clear_cart().await
    }

    /// Re-validates prices against the server.
    ///
    /// Returns `Ok(None)` when skipped because a refresh is already running
    /// or the cart is empty. Otherwise returns the price moves, which are also
    /// kept on the cart until dismissed and announced as
    /// [`StoreEvent::PricesChanged`].
    #[instrument(skip(self))]
    pub async fn update_prices(&self) -> Result<Option<Vec<PriceChange>>, CartError> {
        let Some(basis) = self.cart.begin_price_refresh().await? else {
            debug!("Price refresh skipped");
            return Ok(None);
        };

        let (outcome, moves) = match self.service.update_prices().await {
            Ok(PriceUpdateReply {
                reply,
                price_changes,
            }) => (Ok(reply), price_changes),
            Err(error) => (Err(error), Vec::new()),
        };
        let reply = match accept(Operation::UpdatePrices, outcome) {
            Ok(reply) => reply,
            Err(error) => {
                if let Err(e) = self.cart.abort_price_refresh(Some(error.to_string())).await {
                    warn!(error = %e, "Could not release price refresh");
                }
                self.notify(Notice::error(error.to_string()));
                return Err(error);
            }
        };

        let repriced = match self.cart.apply_prices(reply.into_items(), moves, basis).await {
            Ok(repriced) => repriced,
            Err(error) => {
                if let Err(e) = self.cart.abort_price_refresh(Some(error.to_string())).await {
                    warn!(error = %e, "Could not release price refresh");
                }
                self.notify(Notice::error(error.to_string()));
                return Err(error);
            }
        };
        let changes = repriced.changes;
        if !changes.is_empty() {
            info!(count = changes.len(), "Prices changed");
            let _ = self.events.send(StoreEvent::PricesChanged(changes.clone()));
        }
        self.settle_capped(repriced.capped).await;
        Ok(Some(changes))
    }

    pub async fn dismiss_price_changes(&self) -> Result<(), CartError> {
        self.cart.dismiss_price_changes().await
    }

    // --- Local-only operations ---

    /// Flips a line's checkout flag; returns the new value.
    pub async fn toggle_select(&self, line: LineId) -> Result<bool, CartError> {
        self.cart.toggle_select(line).await
    }

    pub async fn toggle_favorite(&self, line: LineId) -> Result<bool, CartError> {
        self.cart.toggle_favorite(line).await
    }

    pub async fn update_comment(&self, line: LineId, comment: impl Into<String>) -> Result<(), CartError> {
        self.cart.set_comment(line, comment.into()).await
    }

    /// Selects all lines, or deselects all when every line is selected.
    /// Returns the flag now carried by every line.
    pub async fn select_all(&self) -> Result<bool, CartError> {
        self.cart.select_all().await
    }

    pub async fn update_order_comment(&self, comment: impl Into<String>) -> Result<(), CartError> {
        self.cart
            .update(CartUpdate {
                order_comment: Some(comment.into()),
                ..Default::default()
            })
            .await
            .map(|_| ())
    }

    pub async fn update_delivery(&self, delivery: DeliveryUpdate) -> Result<(), CartError> {
        self.cart
            .update(CartUpdate {
                delivery: Some(delivery),
                ..Default::default()
            })
            .await
            .map(|_| ())
    }

    pub async fn clear_error(&self) -> Result<(), CartError> {
        self.cart.clear_error().await
    }
}
