use super::cart::CartId;
use super::line::{LineId, NewCartItem, OfferIdentity, RemoteLine};
use std::collections::BTreeMap;

/// The backend's view of a cart, as kept by the in-memory cart service.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerCart {
    pub id: CartId,
    pub lines: Vec<RemoteLine>,
    /// Current catalog prices keyed by offer lane (`offer:…` / `product:…`).
    pub price_book: BTreeMap<String, f64>,
    pub(crate) next_line: u64,
}

impl ServerCart {
    pub fn new(id: CartId) -> Self {
        Self {
            id,
            lines: Vec::new(),
            price_book: BTreeMap::new(),
            next_line: 1,
        }
    }

    /// A cart pre-filled with `lines`, for scripted replies in tests. New
    /// ids continue after the highest `line_N` already present.
    pub fn with_lines(id: CartId, lines: Vec<RemoteLine>) -> Self {
        let next_line = lines
            .iter()
            .filter_map(|line| line.id.0.strip_prefix("line_")?.parse::<u64>().ok())
            .max()
            .unwrap_or(0)
            .max(lines.len() as u64)
            + 1;
        Self {
            id,
            lines,
            price_book: BTreeMap::new(),
            next_line,
        }
    }

    pub fn line(&self, id: &LineId) -> Option<&RemoteLine> {
        self.lines.iter().find(|line| &line.id == id)
    }

    pub(crate) fn allocate_line_id(&mut self) -> LineId {
        let id = LineId(format!("line_{}", self.next_line));
        self.next_line += 1;
        id
    }

    pub(crate) fn find_offer_mut(&mut self, identity: &OfferIdentity) -> Option<&mut RemoteLine> {
        self.lines
            .iter_mut()
            .find(|line| line.identity().matches(identity))
    }
}

/// Payload for creating a backend cart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerCartCreate {
    /// Lines the cart starts with.
    pub lines: Vec<NewCartItem>,
}

/// A catalog price movement, applied to the price book.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBookUpdate {
    pub offer: OfferIdentity,
    pub price: f64,
}
