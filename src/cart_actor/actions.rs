//! Custom actions for the Cart actor.
//!
//! The cart actor never talks to the backend. [`CartStore`](crate::clients::CartStore)
//! runs each operation as a short protocol against it: a `Prepare*` or
//! `Begin` step checks preconditions and marks the call in flight, the store
//! performs the remote call, and a `Merge` / `DropLine` / `Reset` step applies
//! the reply before `Finish` closes the call. Each step is one message, so a
//! reply is merged completely or not at all.
//!
//! The opening step returns the mirror's revision. The reply is merged
//! against it: lines that arrived or left after that revision are kept as
//! they are, whatever the reply says about them.

use crate::model::{LineId, OfferIdentity, PriceChange, RemoteLine, RemotePriceChange};

/// How a server line list is folded into the mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Known ids keep overlay and position, unknown ids are appended in
    /// server order, ids missing from the reply are dropped.
    Full,
    /// Like `Full` but never appends. Used after removals so a reply that
    /// raced with another removal cannot bring lines back.
    Survivors,
}

/// Custom actions for Cart entities.
#[derive(Debug, Clone)]
pub enum CartAction {
    /// Checks the stock ceiling for an add and marks the call in flight.
    /// Returns the revision to merge the reply against.
    ///
    /// # Errors
    /// `InvalidQuantity`, `OutOfStock` or `QuantityExceedsStock`.
    PrepareAdd {
        identity: OfferIdentity,
        quantity: u32,
        stock: Option<u32>,
    },
    /// Clamps a quantity change to the line's stock ceiling. Marks the call in
    /// flight only when something has to be sent.
    ///
    /// # Errors
    /// `LineNotFound` or `OutOfStock`.
    PrepareQuantity { line: LineId, quantity: u32 },
    /// Marks an unconditional server call in flight; returns the revision.
    Begin,
    /// Folds a server line list into the mirror. Without a `basis` the reply
    /// is taken as current.
    Merge {
        lines: Vec<RemoteLine>,
        mode: MergeMode,
        basis: Option<u64>,
    },
    /// Drops a removed line, then refreshes the survivors from the reply.
    DropLine {
        line: LineId,
        survivors: Option<Vec<RemoteLine>>,
        basis: u64,
    },
    /// Empties the line list.
    Reset,
    /// Closes an in-flight call, recording its error if it failed.
    Finish(Option<String>),
    /// Records an error without touching the in-flight count.
    RecordError(String),
    ClearError,
    ToggleSelect(LineId),
    ToggleFavorite(LineId),
    SetComment { line: LineId, comment: String },
    /// Selects every line, or deselects all if all are selected.
    SelectAll,
    /// Takes the price-refresh slot and returns the revision. Fails softly
    /// when it is taken or the cart is empty.
    BeginPriceRefresh,
    /// Applies re-validated lines and price moves, then frees the slot.
    ApplyPrices {
        lines: Option<Vec<RemoteLine>>,
        changes: Vec<RemotePriceChange>,
        basis: u64,
    },
    /// Frees the price-refresh slot after a failed call.
    AbortPriceRefresh(Option<String>),
    DismissPriceChanges,
}

/// What the store should send for a quantity change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantityPlan {
    /// Quantity to send, `None` when the line already holds it.
    pub send: Option<u32>,
    /// Set when the requested quantity was clamped to this ceiling.
    pub capped_at: Option<u32>,
    /// Revision to merge the reply against.
    pub basis: u64,
}

/// A line the server reported above its stock, clamped in the mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capped {
    pub line: LineId,
    pub ceiling: u32,
}

/// Outcome of folding a reply into the mirror.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Merged {
    /// Number of lines after the merge.
    pub lines: usize,
    pub capped: Vec<Capped>,
}

/// Outcome of a price re-validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Repriced {
    pub changes: Vec<PriceChange>,
    pub capped: Vec<Capped>,
}

/// Results from CartActions - variants match 1:1 with CartAction
#[derive(Debug, Clone, PartialEq)]
pub enum CartActionResult {
    PrepareAdd(u64),
    PrepareQuantity(QuantityPlan),
    Begin(u64),
    Merge(Merged),
    DropLine(Merged),
    Reset(()),
    Finish(()),
    RecordError(()),
    ClearError(()),
    /// New `selected` flag of the line.
    ToggleSelect(bool),
    /// New `favorite` flag of the line.
    ToggleFavorite(bool),
    SetComment(()),
    /// New `selected` flag of every line.
    SelectAll(bool),
    /// The revision when the slot was taken, `None` when skipped.
    BeginPriceRefresh(Option<u64>),
    ApplyPrices(Repriced),
    AbortPriceRefresh(()),
    DismissPriceChanges(()),
}
