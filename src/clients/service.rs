//! # Remote Cart Service
//!
//! The boundary between the store and whatever owns cart truth. Each method
//! maps to one backend operation (`getCart`, `addToCart`, `removeFromCart`,
//! `updateCartItemQuantity`, `updateCartPrices`, `clearCart`). A session is
//! bound to one cart, so no method takes a cart id.
//!
//! Refusals travel inside the reply (`success: false` plus an `error`
//! string). `Err` is reserved for calls that never produced a reply.

use crate::model::{LineId, MutationReply, NewCartItem, PriceUpdateReply, RemoteLine};
use async_trait::async_trait;
use thiserror::Error;

/// Failures outside a mutation reply.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ServiceError {
    /// The backend could not be reached or hung up.
    #[error("Cart service unreachable: {0}")]
    Transport(String),

    /// The backend reported an error outside the reply payload.
    #[error("{0}")]
    Rejected(String),

    /// The backend answered with something other than what was asked for.
    #[error("Unexpected reply from cart service: {0}")]
    Protocol(String),
}

#[async_trait]
pub trait CartService: Send + Sync {
    /// The current cart lines. An absent cart is an empty one.
    async fn get_cart(&self) -> Result<Vec<RemoteLine>, ServiceError>;

    async fn add_to_cart(&self, item: NewCartItem) -> Result<MutationReply, ServiceError>;

    async fn remove_from_cart(&self, line: LineId) -> Result<MutationReply, ServiceError>;

    async fn update_quantity(
        &self,
        line: LineId,
        quantity: u32,
    ) -> Result<MutationReply, ServiceError>;

    /// Re-validates every line's price against the catalog.
    async fn update_prices(&self) -> Result<PriceUpdateReply, ServiceError>;

    async fn clear_cart(&self) -> Result<MutationReply, ServiceError>;
}
