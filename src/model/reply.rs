//! Reply payloads of the remote cart service, shaped like its GraphQL
//! mutation results (`{ success, message, error, cart { items } }`).

use super::line::RemoteLine;
use super::price::RemotePriceChange;
use serde::{Deserialize, Serialize};

/// The cart as the backend returns it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCart {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub items: Vec<RemoteLine>,
}

/// Outcome of a cart mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationReply {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub cart: Option<RemoteCart>,
}

impl MutationReply {
    pub fn ok(items: Vec<RemoteLine>) -> Self {
        Self {
            success: true,
            message: None,
            error: None,
            cart: Some(RemoteCart { id: None, items }),
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
            cart: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Full line list, when the backend sent one.
    pub fn items(&self) -> Option<&[RemoteLine]> {
        self.cart.as_ref().map(|cart| cart.items.as_slice())
    }

    pub fn into_items(self) -> Option<Vec<RemoteLine>> {
        self.cart.map(|cart| cart.items)
    }
}

/// Outcome of price re-validation: a mutation reply plus the per-line moves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceUpdateReply {
    #[serde(flatten)]
    pub reply: MutationReply,
    #[serde(default)]
    pub price_changes: Vec<RemotePriceChange>,
}

impl PriceUpdateReply {
    pub fn ok(items: Vec<RemoteLine>, price_changes: Vec<RemotePriceChange>) -> Self {
        Self {
            reply: MutationReply::ok(items),
            price_changes,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            reply: MutationReply::rejected(error),
            price_changes: Vec::new(),
        }
    }
}
