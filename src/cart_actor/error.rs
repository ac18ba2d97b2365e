//! Error types for the Cart actor.
//!
//! The `Display` text of every variant is the message shown to the user.

use thiserror::Error;

/// Errors that can occur during cart operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CartError {
    /// Quantities start at one.
    #[error("Quantity must be at least 1")]
    InvalidQuantity(u32),

    /// The offer has no stock left at all.
    #[error("This item is out of stock")]
    OutOfStock,

    /// The add would push the line past its stock ceiling.
    #[error("Cannot add {requested} more: remaining {remaining} of {stock} in stock")]
    QuantityExceedsStock {
        requested: u32,
        remaining: u32,
        stock: u32,
    },

    /// No line with this id in the local mirror.
    #[error("Cart line not found: {0}")]
    LineNotFound(String),

    /// The backend answered and refused, or could not be reached. Carries the
    /// server-supplied message or a generic one.
    #[error("{0}")]
    Service(String),

    /// An error occurred while communicating with the actor system.
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<String> for CartError {
    fn from(msg: String) -> Self {
        CartError::ActorCommunicationError(msg)
    }
}

impl CartError {
    /// Failures detected locally, before any server call.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            CartError::InvalidQuantity(_)
                | CartError::OutOfStock
                | CartError::QuantityExceedsStock { .. }
                | CartError::LineNotFound(_)
        )
    }
}
