//! [`ActorEntity`] implementation for the backend cart.

use super::actions::{ServerCartAction, ServerCartResult};
use super::error::ServerError;
use crate::framework::ActorEntity;
use crate::model::{
    CartId, LineId, NewCartItem, PriceBookUpdate, RemoteLine, RemotePriceChange, ServerCart,
    ServerCartCreate,
};
use async_trait::async_trait;

fn check_stock(requested: u32, stock: Option<u32>) -> Result<(), ServerError> {
    match stock {
        Some(available) if requested > available => Err(ServerError::InsufficientStock {
            requested,
            available,
        }),
        _ => Ok(()),
    }
}

impl ServerCart {
    fn add(&mut self, item: NewCartItem) -> Result<(), ServerError> {
        if item.quantity == 0 {
            return Err(ServerError::InvalidQuantity(item.quantity));
        }
        let identity = item.identity();
        if let Some(key) = identity.lane_key() {
            self.price_book.entry(key).or_insert(item.price);
        }

        if let Some(line) = self.find_offer_mut(&identity) {
            let quantity = line.quantity.saturating_add(item.quantity);
            check_stock(quantity, line.stock.or(item.stock))?;
            line.quantity = quantity;
            return Ok(());
        }

        check_stock(item.quantity, item.stock)?;
        let id = self.allocate_line_id();
        self.lines.push(RemoteLine::from_new(id, item));
        Ok(())
    }

    fn line_mut(&mut self, id: &LineId) -> Result<&mut RemoteLine, ServerError> {
        self.lines
            .iter_mut()
            .find(|line| &line.id == id)
            .ok_or_else(|| ServerError::LineNotFound(id.to_string()))
    }

    fn revalidate(&mut self) -> Vec<RemotePriceChange> {
        let mut changes = Vec::new();
        for line in &mut self.lines {
            let current = line
                .identity()
                .lane_key()
                .and_then(|key| self.price_book.get(&key).copied());
            match current {
                Some(price) if price != line.price => {
                    changes.push(RemotePriceChange {
                        item_id: Some(line.id.clone()),
                        offer_key: line.offer_key.clone(),
                        product_id: line.product_id.clone(),
                        old_price: line.price,
                        new_price: price,
                    });
                    line.price = price;
                }
                _ => {}
            }
        }
        changes
    }
}

#[async_trait]
impl ActorEntity for ServerCart {
    type Id = CartId;
    type Create = ServerCartCreate;
    type Update = PriceBookUpdate;
    type Action = ServerCartAction;
    type ActionResult = ServerCartResult;
    type Context = ();
    type Error = ServerError;

    fn from_create_params(id: CartId, params: ServerCartCreate) -> Result<Self, ServerError> {
        let mut cart = ServerCart::new(id);
        for item in params.lines {
            cart.add(item)?;
        }
        Ok(cart)
    }

    /// Publishes a catalog price. Lines keep their price until the next
    /// re-validation.
    async fn on_update(&mut self, update: PriceBookUpdate, _ctx: &()) -> Result<(), ServerError> {
        let key = update.offer.lane_key().ok_or(ServerError::AnonymousOffer)?;
        self.price_book.insert(key, update.price);
        Ok(())
    }

    async fn handle_action(
        &mut self,
        action: ServerCartAction,
        _ctx: &(),
    ) -> Result<ServerCartResult, ServerError> {
        match action {
            ServerCartAction::Add(item) => {
                self.add(item)?;
                Ok(ServerCartResult::Add(self.lines.clone()))
            }
            ServerCartAction::Remove(id) => {
                let before = self.lines.len();
                self.lines.retain(|line| line.id != id);
                if self.lines.len() == before {
                    return Err(ServerError::LineNotFound(id.to_string()));
                }
                Ok(ServerCartResult::Remove(self.lines.clone()))
            }
            ServerCartAction::SetQuantity { line, quantity } => {
                if quantity == 0 {
                    return Err(ServerError::InvalidQuantity(quantity));
                }
                let target = self.line_mut(&line)?;
                check_stock(quantity, target.stock)?;
                target.quantity = quantity;
                Ok(ServerCartResult::SetQuantity(self.lines.clone()))
            }
            ServerCartAction::Clear => {
                self.lines.clear();
                Ok(ServerCartResult::Clear(()))
            }
            ServerCartAction::RevalidatePrices => {
                let changes = self.revalidate();
                Ok(ServerCartResult::RevalidatePrices {
                    lines: self.lines.clone(),
                    changes,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OfferIdentity;

    fn cart() -> ServerCart {
        ServerCart::new(CartId::from("guest"))
    }

    async fn act(cart: &mut ServerCart, action: ServerCartAction) -> Result<ServerCartResult, ServerError> {
        cart.handle_action(action, &()).await
    }

    #[tokio::test]
    async fn test_add_merges_by_offer_key_only() {
        let mut cart = cart();
        let pad = |key: &str| {
            NewCartItem::new("Brake pad", 10.0, 1)
                .with_offer_key(key)
                .with_part("BOSCH", "0986494")
        };
        act(&mut cart, ServerCartAction::Add(pad("wh1"))).await.unwrap();
        act(&mut cart, ServerCartAction::Add(pad("wh1"))).await.unwrap();
        let result = act(&mut cart, ServerCartAction::Add(pad("wh2"))).await.unwrap();

        match result {
            ServerCartResult::Add(lines) => {
                assert_eq!(lines.len(), 2);
                assert_eq!(lines[0].id, LineId::from("line_1"));
                assert_eq!(lines[0].quantity, 2);
                assert_eq!(lines[1].id, LineId::from("line_2"));
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_stock_is_enforced() {
        let mut cart = cart();
        let filter = NewCartItem::new("Filter", 5.0, 4).with_product_id("p1").with_stock(5);
        act(&mut cart, ServerCartAction::Add(filter.clone())).await.unwrap();

        let err = act(&mut cart, ServerCartAction::Add(filter)).await.unwrap_err();
        assert_eq!(
            err,
            ServerError::InsufficientStock {
                requested: 8,
                available: 5
            }
        );

        let err = act(
            &mut cart,
            ServerCartAction::SetQuantity {
                line: LineId::from("line_1"),
                quantity: 6,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServerError::InsufficientStock { .. }));
        assert_eq!(cart.lines[0].quantity, 4);
    }

    #[tokio::test]
    async fn test_remove_unknown_line() {
        let mut cart = cart();
        let err = act(&mut cart, ServerCartAction::Remove(LineId::from("line_9")))
            .await
            .unwrap_err();
        assert_eq!(err, ServerError::LineNotFound("line_9".into()));
    }

    #[tokio::test]
    async fn test_revalidate_applies_price_book() {
        let mut cart = ServerCart::from_create_params(
            CartId::from("guest"),
            ServerCartCreate {
                lines: vec![
                    NewCartItem::new("Oil", 100.0, 2).with_offer_key("X"),
                    NewCartItem::new("Wipers", 30.0, 1).with_offer_key("Y"),
                ],
            },
        )
        .unwrap();
        cart.on_update(
            PriceBookUpdate {
                offer: OfferIdentity::offer("X"),
                price: 110.0,
            },
            &(),
        )
        .await
        .unwrap();
        assert_eq!(cart.lines[0].price, 100.0);

        match act(&mut cart, ServerCartAction::RevalidatePrices).await.unwrap() {
            ServerCartResult::RevalidatePrices { lines, changes } => {
                assert_eq!(lines[0].price, 110.0);
                assert_eq!(changes.len(), 1);
                assert_eq!(changes[0].item_id, Some(LineId::from("line_1")));
                assert_eq!(changes[0].old_price, 100.0);
            }
            other => panic!("unexpected result {other:?}"),
        }

        let err = cart
            .on_update(
                PriceBookUpdate {
                    offer: OfferIdentity::default(),
                    price: 1.0,
                },
                &(),
            )
            .await
            .unwrap_err();
        assert_eq!(err, ServerError::AnonymousOffer);
    }
}
