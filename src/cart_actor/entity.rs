//! [`ActorEntity`] implementation for the local cart mirror.
//!
//! Every action validates before it touches state, so a rejected action
//! leaves the cart exactly as it was.

use super::actions::{
    Capped, CartAction, CartActionResult, MergeMode, Merged, QuantityPlan, Repriced,
};
use super::error::CartError;
use super::reconcile::reconcile;
use crate::framework::ActorEntity;
use crate::model::{
    Cart, CartCreate, CartId, CartItem, CartUpdate, LineId, OfferIdentity, PriceChange,
    RemoteLine,
};
use async_trait::async_trait;

impl Cart {
    /// Stock ceiling check for adding `quantity` of `identity`.
    ///
    /// The ceiling is the matched line's known stock, falling back to the
    /// stock advertised with the new item.
    fn check_add(
        &self,
        identity: &OfferIdentity,
        quantity: u32,
        stock: Option<u32>,
    ) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }
        let existing = self.find_offer(identity);
        let ceiling = existing.and_then(|item| item.line.stock).or(stock);
        let current = existing.map_or(0, |item| item.quantity());

        match ceiling {
            Some(0) => Err(CartError::OutOfStock),
            Some(stock) if current.saturating_add(quantity) > stock => {
                Err(CartError::QuantityExceedsStock {
                    requested: quantity,
                    remaining: stock.saturating_sub(current),
                    stock,
                })
            }
            _ => Ok(()),
        }
    }

    fn plan_quantity(&self, line: &LineId, quantity: u32) -> Result<QuantityPlan, CartError> {
        let item = self
            .item(line)
            .ok_or_else(|| CartError::LineNotFound(line.to_string()))?;
        let basis = self.history.revision();
        Ok(match item.line.stock {
            Some(0) => return Err(CartError::OutOfStock),
            Some(stock) if quantity > stock => QuantityPlan {
                send: (stock != item.quantity()).then_some(stock),
                capped_at: Some(stock),
                basis,
            },
            _ => QuantityPlan {
                send: Some(quantity),
                capped_at: None,
                basis,
            },
        })
    }

    /// Folds a reply taken at revision `basis` into the lines.
    fn fold(&mut self, lines: Vec<RemoteLine>, mode: MergeMode, basis: u64) -> Vec<Capped> {
        let (items, capped) = reconcile(&self.items, lines, mode, basis, &mut self.history);
        self.items = items;
        self.recompute_summary();
        capped
    }

    fn merged(&self, capped: Vec<Capped>) -> Merged {
        Merged {
            lines: self.items.len(),
            capped,
        }
    }

    fn begin_call(&mut self) {
        self.pending = self.pending.saturating_add(1);
        self.last_error = None;
    }

    fn line_mut(&mut self, line: &LineId) -> Result<&mut CartItem, CartError> {
        self.item_mut(line)
            .ok_or_else(|| CartError::LineNotFound(line.to_string()))
    }
}

#[async_trait]
impl ActorEntity for Cart {
    type Id = CartId;
    type Create = CartCreate;
    type Update = CartUpdate;
    type Action = CartAction;
    type ActionResult = CartActionResult;
    type Context = ();
    type Error = CartError;

    fn from_create_params(id: CartId, params: CartCreate) -> Result<Self, CartError> {
        Ok(Cart::new(id, params.delivery))
    }

    /// Checkout fields: partial delivery change and the order comment.
    async fn on_update(&mut self, update: CartUpdate, _ctx: &()) -> Result<(), CartError> {
        if let Some(delivery) = update.delivery {
            self.delivery.apply(delivery);
            self.recompute_summary();
        }
        if let Some(comment) = update.order_comment {
            self.order_comment = comment;
        }
        Ok(())
    }

    async fn handle_action(
        &mut self,
        action: CartAction,
        _ctx: &(),
    ) -> Result<CartActionResult, CartError> {
        match action {
            CartAction::PrepareAdd {
                identity,
                quantity,
                stock,
            } => {
                self.check_add(&identity, quantity, stock)?;
                self.begin_call();
                Ok(CartActionResult::PrepareAdd(self.history.revision()))
            }
            CartAction::PrepareQuantity { line, quantity } => {
                if quantity == 0 {
                    return Err(CartError::InvalidQuantity(quantity));
                }
                let plan = self.plan_quantity(&line, quantity)?;
                if plan.send.is_some() {
                    self.begin_call();
                }
                Ok(CartActionResult::PrepareQuantity(plan))
            }
            CartAction::Begin => {
                self.begin_call();
                Ok(CartActionResult::Begin(self.history.revision()))
            }
            CartAction::Merge { lines, mode, basis } => {
                let basis = basis.unwrap_or_else(|| self.history.revision());
                let capped = self.fold(lines, mode, basis);
                Ok(CartActionResult::Merge(self.merged(capped)))
            }
            CartAction::DropLine {
                line,
                survivors,
                basis,
            } => {
                if let Some(position) = self.items.iter().position(|item| item.id() == &line) {
                    let item = self.items.remove(position);
                    let revision = self.history.advance();
                    self.history.depart(&line, item.overlay, revision);
                }
                let capped = match survivors {
                    Some(lines) => self.fold(lines, MergeMode::Survivors, basis),
                    None => {
                        self.recompute_summary();
                        Vec::new()
                    }
                };
                Ok(CartActionResult::DropLine(self.merged(capped)))
            }
            CartAction::Reset => {
                let revision = self.history.advance();
                for item in self.items.drain(..) {
                    self.history.depart(&item.line.id, item.overlay, revision);
                }
                self.price_changes.clear();
                self.recompute_summary();
                Ok(CartActionResult::Reset(()))
            }
            CartAction::Finish(error) => {
                self.pending = self.pending.saturating_sub(1);
                if error.is_some() {
                    self.last_error = error;
                }
                Ok(CartActionResult::Finish(()))
            }
            CartAction::RecordError(error) => {
                self.last_error = Some(error);
                Ok(CartActionResult::RecordError(()))
            }
            CartAction::ClearError => {
                self.last_error = None;
                Ok(CartActionResult::ClearError(()))
            }
            CartAction::ToggleSelect(line) => {
                let item = self.line_mut(&line)?;
                item.overlay.selected = !item.overlay.selected;
                let selected = item.overlay.selected;
                self.recompute_summary();
                Ok(CartActionResult::ToggleSelect(selected))
            }
            CartAction::ToggleFavorite(line) => {
                let item = self.line_mut(&line)?;
                item.overlay.favorite = !item.overlay.favorite;
                Ok(CartActionResult::ToggleFavorite(item.overlay.favorite))
            }
            CartAction::SetComment { line, comment } => {
                self.line_mut(&line)?.overlay.comment = comment;
                Ok(CartActionResult::SetComment(()))
            }
            CartAction::SelectAll => {
                let selected = !self.all_selected();
                for item in &mut self.items {
                    item.overlay.selected = selected;
                }
                self.recompute_summary();
                Ok(CartActionResult::SelectAll(selected))
            }
            CartAction::BeginPriceRefresh => {
                if self.refreshing_prices || self.items.is_empty() {
                    return Ok(CartActionResult::BeginPriceRefresh(None));
                }
                self.refreshing_prices = true;
                Ok(CartActionResult::BeginPriceRefresh(Some(
                    self.history.revision(),
                )))
            }
            CartAction::ApplyPrices {
                lines,
                changes,
                basis,
            } => {
                let capped = match lines {
                    Some(lines) => self.fold(lines, MergeMode::Full, basis),
                    None => Vec::new(),
                };
                let resolved = PriceChange::resolve(&self.items, &changes);
                if !resolved.is_empty() {
                    self.price_changes = resolved.clone();
                }
                self.refreshing_prices = false;
                Ok(CartActionResult::ApplyPrices(Repriced {
                    changes: resolved,
                    capped,
                }))
            }
            CartAction::AbortPriceRefresh(error) => {
                self.refreshing_prices = false;
                if error.is_some() {
                    self.last_error = error;
                }
                Ok(CartActionResult::AbortPriceRefresh(()))
            }
            CartAction::DismissPriceChanges => {
                self.price_changes.clear();
                Ok(CartActionResult::DismissPriceChanges(()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DeliveryInfo, NewCartItem, RemoteLine};

    fn cart_with(lines: Vec<RemoteLine>) -> Cart {
        let mut cart = Cart::new(CartId::from("c1"), DeliveryInfo::default());
        cart.items = lines.into_iter().map(CartItem::fresh).collect();
        cart.recompute_summary();
        cart
    }

    fn offer(id: &str, key: &str, quantity: u32, stock: Option<u32>) -> RemoteLine {
        let mut item = NewCartItem::new(key, 100.0, quantity).with_offer_key(key);
        item.stock = stock;
        RemoteLine::from_new(LineId::from(id), item)
    }

    async fn act(cart: &mut Cart, action: CartAction) -> Result<CartActionResult, CartError> {
        cart.handle_action(action, &()).await
    }

    #[tokio::test]
    async fn test_add_rejected_past_ceiling_leaves_cart_untouched() {
        let mut cart = cart_with(vec![offer("l1", "X", 3, Some(5))]);
        let before = cart.clone();

        let err = act(
            &mut cart,
            CartAction::PrepareAdd {
                identity: OfferIdentity::offer("X"),
                quantity: 3,
                stock: Some(5),
            },
        )
        .await
        .unwrap_err();

        assert_eq!(
            err,
            CartError::QuantityExceedsStock {
                requested: 3,
                remaining: 2,
                stock: 5
            }
        );
        assert_eq!(cart, before);
    }

    #[tokio::test]
    async fn test_add_uses_matched_line_stock_before_item_stock() {
        let mut cart = cart_with(vec![offer("l1", "X", 1, Some(0))]);
        let err = act(
            &mut cart,
            CartAction::PrepareAdd {
                identity: OfferIdentity::offer("X"),
                quantity: 1,
                stock: Some(10),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err, CartError::OutOfStock);

        // A different offer of the same part uses its own stock.
        act(
            &mut cart,
            CartAction::PrepareAdd {
                identity: OfferIdentity::offer("Y"),
                quantity: 1,
                stock: Some(10),
            },
        )
        .await
        .unwrap();
        assert_eq!(cart.pending, 1);
    }

    #[tokio::test]
    async fn test_add_without_known_stock_is_allowed() {
        let mut cart = cart_with(vec![]);
        act(
            &mut cart,
            CartAction::PrepareAdd {
                identity: OfferIdentity::product("p1"),
                quantity: 50,
                stock: None,
            },
        )
        .await
        .unwrap();
        assert!(cart.is_loading());
    }

    #[tokio::test]
    async fn test_quantity_plan_clamps_to_stock() {
        let mut cart = cart_with(vec![offer("l1", "X", 2, Some(5)), offer("l2", "Y", 5, Some(5))]);

        let plan = act(
            &mut cart,
            CartAction::PrepareQuantity {
                line: LineId::from("l1"),
                quantity: 10,
            },
        )
        .await
        .unwrap();
        assert_eq!(
            plan,
            CartActionResult::PrepareQuantity(QuantityPlan {
                send: Some(5),
                capped_at: Some(5),
                basis: 0
            })
        );
        assert_eq!(cart.pending, 1);

        // Already at the ceiling: nothing to send, nothing in flight.
        let plan = act(
            &mut cart,
            CartAction::PrepareQuantity {
                line: LineId::from("l2"),
                quantity: 9,
            },
        )
        .await
        .unwrap();
        assert_eq!(
            plan,
            CartActionResult::PrepareQuantity(QuantityPlan {
                send: None,
                capped_at: Some(5),
                basis: 0
            })
        );
        assert_eq!(cart.pending, 1);
    }

    #[tokio::test]
    async fn test_quantity_plan_errors() {
        let mut cart = cart_with(vec![offer("l1", "X", 2, Some(0))]);
        let missing = act(
            &mut cart,
            CartAction::PrepareQuantity {
                line: LineId::from("nope"),
                quantity: 1,
            },
        )
        .await;
        assert!(matches!(missing, Err(CartError::LineNotFound(_))));

        let empty = act(
            &mut cart,
            CartAction::PrepareQuantity {
                line: LineId::from("l1"),
                quantity: 1,
            },
        )
        .await;
        assert_eq!(empty, Err(CartError::OutOfStock));
        assert_eq!(cart.pending, 0);
    }

    #[tokio::test]
    async fn test_finish_records_error_and_never_underflows() {
        let mut cart = cart_with(vec![]);
        act(&mut cart, CartAction::Begin).await.unwrap();
        act(&mut cart, CartAction::Finish(Some("boom".into())))
            .await
            .unwrap();
        act(&mut cart, CartAction::Finish(None)).await.unwrap();
        assert_eq!(cart.pending, 0);
        assert_eq!(cart.last_error.as_deref(), Some("boom"));

        act(&mut cart, CartAction::Begin).await.unwrap();
        assert_eq!(cart.last_error, None);
    }

    #[tokio::test]
    async fn test_select_all_flips_between_all_and_none() {
        let mut cart = cart_with(vec![offer("l1", "X", 1, None), offer("l2", "Y", 1, None)]);
        act(&mut cart, CartAction::ToggleSelect(LineId::from("l1")))
            .await
            .unwrap();
        assert_eq!(cart.summary.total_items, 1);

        let r = act(&mut cart, CartAction::SelectAll).await.unwrap();
        assert_eq!(r, CartActionResult::SelectAll(true));
        assert_eq!(cart.summary.total_items, 2);

        let r = act(&mut cart, CartAction::SelectAll).await.unwrap();
        assert_eq!(r, CartActionResult::SelectAll(false));
        assert_eq!(cart.summary.total_items, 0);
        assert_eq!(cart.summary.final_price, 39.0);
    }

    #[tokio::test]
    async fn test_drop_line_keeps_survivor_overlay() {
        let mut cart = cart_with(vec![
            offer("l1", "X", 1, None),
            offer("l2", "Y", 1, None),
            offer("l3", "Z", 1, None),
        ]);
        cart.items[2].overlay.selected = false;

        // The reply still lists l1, which another removal is about to drop.
        act(
            &mut cart,
            CartAction::DropLine {
                line: LineId::from("l2"),
                survivors: Some(vec![offer("l1", "X", 1, None), offer("l3", "Z", 2, None)]),
                basis: 0,
            },
        )
        .await
        .unwrap();
        assert_eq!(cart.items.len(), 2);
        assert_eq!(cart.items[1].id(), &LineId::from("l3"));
        assert!(!cart.items[1].overlay.selected);
        assert_eq!(cart.items[1].quantity(), 2);
    }

    #[tokio::test]
    async fn test_price_refresh_slot() {
        let mut cart = cart_with(vec![]);
        let r = act(&mut cart, CartAction::BeginPriceRefresh).await.unwrap();
        assert_eq!(r, CartActionResult::BeginPriceRefresh(None));

        let mut cart = cart_with(vec![offer("l1", "X", 2, None)]);
        let first = act(&mut cart, CartAction::BeginPriceRefresh).await.unwrap();
        let second = act(&mut cart, CartAction::BeginPriceRefresh).await.unwrap();
        assert_eq!(first, CartActionResult::BeginPriceRefresh(Some(0)));
        assert_eq!(second, CartActionResult::BeginPriceRefresh(None));

        let mut repriced = offer("l1", "X", 2, None);
        repriced.price = 120.0;
        let r = act(
            &mut cart,
            CartAction::ApplyPrices {
                lines: Some(vec![repriced]),
                changes: vec![crate::model::RemotePriceChange {
                    item_id: Some(LineId::from("l1")),
                    offer_key: None,
                    product_id: None,
                    old_price: 100.0,
                    new_price: 120.0,
                }],
                basis: 0,
            },
        )
        .await
        .unwrap();
        match r {
            CartActionResult::ApplyPrices(repriced) => assert_eq!(repriced.changes.len(), 1),
            other => panic!("unexpected result {other:?}"),
        }
        assert!(!cart.refreshing_prices);
        assert_eq!(cart.price_changes.len(), 1);
        assert_eq!(cart.summary.total_price, 240.0);

        act(&mut cart, CartAction::DismissPriceChanges).await.unwrap();
        assert!(cart.price_changes.is_empty());
    }

    #[tokio::test]
    async fn test_checkout_fields_update() {
        let mut cart = cart_with(vec![]);
        cart.on_update(
            CartUpdate {
                delivery: Some(crate::model::DeliveryUpdate {
                    method: Some("Pickup".into()),
                    ..Default::default()
                }),
                order_comment: Some("call first".into()),
            },
            &(),
        )
        .await
        .unwrap();
        assert_eq!(cart.delivery.method, "Pickup");
        assert_eq!(cart.order_comment, "call first");
    }

    #[tokio::test]
    async fn test_delivery_price_update_moves_summary() {
        let mut cart = cart_with(vec![offer("l1", "X", 1, None)]);
        assert_eq!(cart.summary.final_price, 139.0);
        cart.on_update(
            CartUpdate {
                delivery: Some(crate::model::DeliveryUpdate {
                    price: Some(250.0),
                    ..Default::default()
                }),
                order_comment: None,
            },
            &(),
        )
        .await
        .unwrap();
        assert_eq!(cart.summary.delivery_price, 250.0);
        assert_eq!(cart.summary.final_price, 350.0);
    }

    #[tokio::test]
    async fn test_reply_taken_before_clear_cannot_refill_cart() {
        let mut cart = cart_with(vec![]);
        act(
            &mut cart,
            CartAction::Merge {
                lines: vec![offer("l1", "X", 1, None)],
                mode: MergeMode::Full,
                basis: None,
            },
        )
        .await
        .unwrap();
        let basis = match act(&mut cart, CartAction::Begin).await.unwrap() {
            CartActionResult::Begin(basis) => basis,
            other => panic!("unexpected result {other:?}"),
        };

        act(&mut cart, CartAction::Reset).await.unwrap();
        let r = act(
            &mut cart,
            CartAction::Merge {
                lines: vec![offer("l1", "X", 2, None)],
                mode: MergeMode::Full,
                basis: Some(basis),
            },
        )
        .await
        .unwrap();
        assert_eq!(r, CartActionResult::Merge(Merged::default()));
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_repriced_line_over_new_stock_is_capped() {
        let mut cart = cart_with(vec![offer("l1", "X", 4, Some(10))]);
        let basis = match act(&mut cart, CartAction::BeginPriceRefresh).await.unwrap() {
            CartActionResult::BeginPriceRefresh(Some(basis)) => basis,
            other => panic!("unexpected result {other:?}"),
        };

        let r = act(
            &mut cart,
            CartAction::ApplyPrices {
                lines: Some(vec![offer("l1", "X", 4, Some(2))]),
                changes: Vec::new(),
                basis,
            },
        )
        .await
        .unwrap();
        assert_eq!(
            r,
            CartActionResult::ApplyPrices(Repriced {
                changes: Vec::new(),
                capped: vec![Capped {
                    line: LineId::from("l1"),
                    ceiling: 2
                }],
            })
        );
        assert_eq!(cart.items[0].quantity(), 2);
        assert_eq!(cart.summary.total_items, 2);
    }
}
