//! Error types for the backend cart actor.

use thiserror::Error;

/// Rejections of the in-memory cart service. Sent back to the store as the
/// `error` string of a failed mutation reply.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ServerError {
    /// The provided quantity is invalid (zero).
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(u32),

    /// The requested quantity exceeds the available stock.
    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: u32, available: u32 },

    /// No line with this id in the cart.
    #[error("Cart item not found: {0}")]
    LineNotFound(String),

    /// A price was published for an offer without a key or product id.
    #[error("Offer has neither an offer key nor a product id")]
    AnonymousOffer,

    /// An error occurred while communicating with the actor system.
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<String> for ServerError {
    fn from(msg: String) -> Self {
        ServerError::ActorCommunicationError(msg)
    }
}
