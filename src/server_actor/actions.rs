//! Custom actions for the backend cart actor, one per remote mutation.

use crate::model::{LineId, NewCartItem, RemoteLine, RemotePriceChange};

#[derive(Debug, Clone)]
pub enum ServerCartAction {
    /// Adds an offer, incrementing the line with the same offer identity.
    ///
    /// # Errors
    /// Fails if the resulting quantity exceeds the line's stock.
    Add(NewCartItem),
    Remove(LineId),
    SetQuantity { line: LineId, quantity: u32 },
    Clear,
    /// Re-prices every line from the price book and reports what moved.
    RevalidatePrices,
}

/// Results from ServerCartActions - variants match 1:1 with ServerCartAction.
/// Line lists are the whole cart after the mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerCartResult {
    Add(Vec<RemoteLine>),
    Remove(Vec<RemoteLine>),
    SetQuantity(Vec<RemoteLine>),
    Clear(()),
    RevalidatePrices {
        lines: Vec<RemoteLine>,
        changes: Vec<RemotePriceChange>,
    },
}
