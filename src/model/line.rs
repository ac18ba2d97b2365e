//! Cart lines: the server-owned projection, the client-owned overlay and the
//! add-to-cart input.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Display;

/// Server-assigned identifier of a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineId(pub String);

impl From<&str> for LineId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for LineId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Display for LineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Catalog identity of an offer.
///
/// Two identities match only on an exact offer key or an exact product id.
/// Article and brand are deliberately not part of it: distinct offers from
/// different warehouses share them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct OfferIdentity {
    pub product_id: Option<String>,
    pub offer_key: Option<String>,
}

impl OfferIdentity {
    pub fn offer(offer_key: impl Into<String>) -> Self {
        Self {
            product_id: None,
            offer_key: Some(offer_key.into()),
        }
    }

    pub fn product(product_id: impl Into<String>) -> Self {
        Self {
            product_id: Some(product_id.into()),
            offer_key: None,
        }
    }

    pub fn matches(&self, other: &OfferIdentity) -> bool {
        let same = |a: &Option<String>, b: &Option<String>| matches!((a, b), (Some(a), Some(b)) if a == b);
        same(&self.offer_key, &other.offer_key) || same(&self.product_id, &other.product_id)
    }

    /// Key used to serialise concurrent adds of the same offer.
    /// `None` when the identity is empty and every add creates its own line.
    pub fn lane_key(&self) -> Option<String> {
        match (&self.offer_key, &self.product_id) {
            (Some(key), _) => Some(format!("offer:{key}")),
            (None, Some(id)) => Some(format!("product:{id}")),
            (None, None) => None,
        }
    }
}

/// Loose scalar as sent by the catalog backends: a number or free text.
#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Number(f64),
    Text(String),
}

/// Reads a stock ceiling from `5`, `"10 шт"` or `"В наличии: 5"`.
///
/// Text without digits and `null` mean the ceiling is unknown.
pub fn parse_stock(text: &str) -> Option<u32> {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .collect();
    if digits.is_empty() {
        return None;
    }
    // Absurdly long digit runs saturate instead of being discarded.
    Some(digits.parse().unwrap_or(u32::MAX))
}

fn stock_ceiling<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Loose>::deserialize(deserializer)? {
        None => None,
        Some(Loose::Number(n)) if n.is_finite() => Some(n.max(0.0).min(f64::from(u32::MAX)) as u32),
        Some(Loose::Number(_)) => None,
        Some(Loose::Text(text)) => parse_stock(&text),
    })
}

fn loose_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Loose>::deserialize(deserializer)? {
        None => None,
        Some(Loose::Number(n)) if n.fract() == 0.0 => Some(format!("{n:.0}")),
        Some(Loose::Number(n)) => Some(n.to_string()),
        Some(Loose::Text(text)) => Some(text),
    })
}

pub(crate) fn default_currency() -> String {
    "RUB".to_string()
}

/// Server-owned projection of a cart line: identity, price, quantity, stock
/// and the descriptive fields. Replaced wholesale on every server reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteLine {
    pub id: LineId,
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub offer_key: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub article: String,
    pub price: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub quantity: u32,
    #[serde(default, deserialize_with = "stock_ceiling")]
    pub stock: Option<u32>,
    #[serde(default, deserialize_with = "loose_text")]
    pub delivery_time: Option<String>,
    #[serde(default)]
    pub warehouse: Option<String>,
    #[serde(default)]
    pub supplier: Option<String>,
    #[serde(default)]
    pub is_external: bool,
    #[serde(default)]
    pub image: Option<String>,
}

impl RemoteLine {
    /// Materialises an add-to-cart request as a stored line.
    pub fn from_new(id: LineId, item: NewCartItem) -> Self {
        Self {
            id,
            product_id: item.product_id,
            offer_key: item.offer_key,
            name: item.name,
            description: item.description,
            brand: item.brand,
            article: item.article,
            price: item.price,
            currency: item.currency,
            quantity: item.quantity,
            stock: item.stock,
            delivery_time: item.delivery_time,
            warehouse: item.warehouse,
            supplier: item.supplier,
            is_external: item.is_external,
            image: item.image,
        }
    }

    pub fn identity(&self) -> OfferIdentity {
        OfferIdentity {
            product_id: self.product_id.clone(),
            offer_key: self.offer_key.clone(),
        }
    }
}

/// Client-owned flags the server never sees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineOverlay {
    pub selected: bool,
    pub favorite: bool,
    pub comment: String,
}

impl Default for LineOverlay {
    fn default() -> Self {
        Self {
            selected: true,
            favorite: false,
            comment: String::new(),
        }
    }
}

/// A cart line as the store presents it: server projection plus overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub line: RemoteLine,
    pub overlay: LineOverlay,
}

impl CartItem {
    /// A line seen for the first time: selected, not favorite, no comment.
    pub fn fresh(line: RemoteLine) -> Self {
        Self {
            line,
            overlay: LineOverlay::default(),
        }
    }

    pub fn id(&self) -> &LineId {
        &self.line.id
    }

    pub fn quantity(&self) -> u32 {
        self.line.quantity
    }

    pub fn is_selected(&self) -> bool {
        self.overlay.selected
    }

    pub fn line_total(&self) -> f64 {
        self.line.price * f64::from(self.line.quantity)
    }

    pub fn identity(&self) -> OfferIdentity {
        self.line.identity()
    }
}

/// Add-to-cart input: everything a line carries except the server id and the
/// overlay. Serialises as the backend's `AddToCartInput`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCartItem {
    pub product_id: Option<String>,
    pub offer_key: Option<String>,
    pub name: String,
    pub description: String,
    pub brand: String,
    pub article: String,
    pub price: f64,
    pub currency: String,
    pub quantity: u32,
    pub stock: Option<u32>,
    pub delivery_time: Option<String>,
    pub warehouse: Option<String>,
    pub supplier: Option<String>,
    pub is_external: bool,
    pub image: Option<String>,
}

impl NewCartItem {
    pub fn new(name: impl Into<String>, price: f64, quantity: u32) -> Self {
        Self {
            product_id: None,
            offer_key: None,
            name: name.into(),
            description: String::new(),
            brand: String::new(),
            article: String::new(),
            price,
            currency: default_currency(),
            quantity,
            stock: None,
            delivery_time: None,
            warehouse: None,
            supplier: None,
            is_external: false,
            image: None,
        }
    }

    /// External aggregated offer, identified by its offer key.
    pub fn with_offer_key(mut self, offer_key: impl Into<String>) -> Self {
        self.offer_key = Some(offer_key.into());
        self.is_external = true;
        self
    }

    /// Internal catalog item, identified by its product id.
    pub fn with_product_id(mut self, product_id: impl Into<String>) -> Self {
        self.product_id = Some(product_id.into());
        self
    }

    pub fn with_stock(mut self, stock: u32) -> Self {
        self.stock = Some(stock);
        self
    }

    pub fn with_part(mut self, brand: impl Into<String>, article: impl Into<String>) -> Self {
        self.brand = brand.into();
        self.article = article.into();
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn identity(&self) -> OfferIdentity {
        OfferIdentity {
            product_id: self.product_id.clone(),
            offer_key: self.offer_key.clone(),
        }
    }
}
