use super::history::LineHistory;
use super::line::{CartItem, LineId, OfferIdentity};
use super::price::PriceChange;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Identifier of a cart, shared by the local mirror and the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartId(pub String);

impl From<&str> for CartId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for CartId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Display for CartId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derived totals over the selected lines. Never stored on its own; always
/// rebuilt from the item list.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CartSummary {
    pub total_items: u32,
    pub total_price: f64,
    pub total_discount: f64,
    pub delivery_price: f64,
    pub final_price: f64,
}

impl CartSummary {
    pub fn derive(items: &[CartItem], delivery_price: f64) -> Self {
        let selected = items.iter().filter(|item| item.is_selected());
        let (total_items, total_price) = selected.fold((0u32, 0.0), |(count, price), item| {
            (count.saturating_add(item.quantity()), price + item.line_total())
        });
        let total_discount = 0.0;
        Self {
            total_items,
            total_price,
            total_discount,
            delivery_price,
            final_price: total_price + delivery_price - total_discount,
        }
    }
}

/// How the order is delivered. Only changed by an explicit update.
///
/// `price` is the delivery charge the summary adds to the selected lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryInfo {
    pub method: String,
    pub address: String,
    pub price: f64,
}

impl Default for DeliveryInfo {
    fn default() -> Self {
        Self {
            method: "Courier delivery".to_string(),
            address: String::new(),
            price: 39.0,
        }
    }
}

/// Partial delivery change; `None` fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeliveryUpdate {
    pub method: Option<String>,
    pub address: Option<String>,
    pub price: Option<f64>,
}

impl DeliveryInfo {
    pub fn apply(&mut self, update: DeliveryUpdate) {
        if let Some(method) = update.method {
            self.method = method;
        }
        if let Some(address) = update.address {
            self.address = address;
        }
        if let Some(price) = update.price {
            self.price = price;
        }
    }
}

/// Payload for creating the local mirror.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartCreate {
    pub delivery: DeliveryInfo,
}

/// Checkout-side fields that live next to the lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartUpdate {
    pub delivery: Option<DeliveryUpdate>,
    pub order_comment: Option<String>,
}

/// The local mirror of one remote cart.
///
/// Every field here is what presentation code sees through a snapshot. The
/// line list only changes through server-confirmed merges or overlay edits.
#[derive(Debug, Clone, PartialEq)]
pub struct Cart {
    pub id: CartId,
    pub items: Vec<CartItem>,
    pub summary: CartSummary,
    pub delivery: DeliveryInfo,
    pub order_comment: String,
    /// Server calls currently in flight.
    pub pending: u32,
    pub last_error: Option<String>,
    /// Single-slot guard for price re-validation.
    pub refreshing_prices: bool,
    /// Price changes awaiting acknowledgement.
    pub price_changes: Vec<PriceChange>,
    /// When each line entered or left the mirror.
    pub history: LineHistory,
}

impl Cart {
    pub fn new(id: CartId, delivery: DeliveryInfo) -> Self {
        Self {
            id,
            items: Vec::new(),
            summary: CartSummary::derive(&[], delivery.price),
            delivery,
            order_comment: String::new(),
            pending: 0,
            last_error: None,
            refreshing_prices: false,
            price_changes: Vec::new(),
            history: LineHistory::default(),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.pending > 0
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, id: &LineId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn item_mut(&mut self, id: &LineId) -> Option<&mut CartItem> {
        self.items.iter_mut().find(|item| item.id() == id)
    }

    /// The line an add of `identity` would increment, if any.
    pub fn find_offer(&self, identity: &OfferIdentity) -> Option<&CartItem> {
        self.items.iter().find(|item| item.identity().matches(identity))
    }

    pub fn contains_offer(&self, identity: &OfferIdentity) -> bool {
        self.find_offer(identity).is_some()
    }

    /// True for an empty cart as well.
    pub fn all_selected(&self) -> bool {
        self.items.iter().all(CartItem::is_selected)
    }

    pub fn selected_ids(&self) -> Vec<LineId> {
        self.items
            .iter()
            .filter(|item| item.is_selected())
            .map(|item| item.id().clone())
            .collect()
    }

    pub fn recompute_summary(&mut self) {
        self.summary = CartSummary::derive(&self.items, self.delivery.price);
    }
}
