use super::line::{CartItem, LineId, OfferIdentity};
use serde::{Deserialize, Serialize};

/// One price movement reported by the backend's re-validation.
///
/// Carries enough identity to find the local line again: the line id when
/// the backend knows it, otherwise the offer key or product id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemotePriceChange {
    #[serde(default)]
    pub item_id: Option<LineId>,
    #[serde(default)]
    pub offer_key: Option<String>,
    #[serde(default)]
    pub product_id: Option<String>,
    pub old_price: f64,
    pub new_price: f64,
}

impl RemotePriceChange {
    fn identity(&self) -> OfferIdentity {
        OfferIdentity {
            product_id: self.product_id.clone(),
            offer_key: self.offer_key.clone(),
        }
    }
}

/// A price change resolved against a local line, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceChange {
    pub line_id: LineId,
    pub name: String,
    pub brand: String,
    pub article: String,
    pub image: Option<String>,
    pub old_price: f64,
    pub new_price: f64,
    pub quantity: u32,
}

impl PriceChange {
    /// Absolute difference per unit.
    pub fn difference(&self) -> f64 {
        (self.new_price - self.old_price).abs()
    }

    pub fn is_increase(&self) -> bool {
        self.new_price > self.old_price
    }

    /// Relative change in percent, always positive. Zero when the old price
    /// was zero.
    pub fn percentage(&self) -> f64 {
        percentage(self.old_price, self.new_price)
    }

    /// Resolves backend records against the current lines.
    ///
    /// Records that match no line, or that do not actually move the price,
    /// are skipped.
    pub fn resolve(items: &[CartItem], changes: &[RemotePriceChange]) -> Vec<PriceChange> {
        changes
            .iter()
            .filter(|change| change.old_price != change.new_price)
            .filter_map(|change| {
                let by_id = change
                    .item_id
                    .as_ref()
                    .and_then(|id| items.iter().find(|item| item.id() == id));
                let item = by_id.or_else(|| {
                    let identity = change.identity();
                    items.iter().find(|item| item.identity().matches(&identity))
                })?;
                Some(PriceChange {
                    line_id: item.id().clone(),
                    name: item.line.name.clone(),
                    brand: item.line.brand.clone(),
                    article: item.line.article.clone(),
                    image: item.line.image.clone(),
                    old_price: change.old_price,
                    new_price: change.new_price,
                    quantity: item.quantity(),
                })
            })
            .collect()
    }
}

fn percentage(old: f64, new: f64) -> f64 {
    if old == 0.0 {
        return 0.0;
    }
    ((new - old) / old * 100.0).abs()
}

/// Totals of a batch of price changes, weighted by quantity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceChangeSummary {
    pub total_old: f64,
    pub total_new: f64,
}

impl PriceChangeSummary {
    pub fn of(changes: &[PriceChange]) -> Self {
        changes.iter().fold(
            Self {
                total_old: 0.0,
                total_new: 0.0,
            },
            |acc, change| {
                let quantity = f64::from(change.quantity);
                Self {
                    total_old: acc.total_old + change.old_price * quantity,
                    total_new: acc.total_new + change.new_price * quantity,
                }
            },
        )
    }

    pub fn difference(&self) -> f64 {
        (self.total_new - self.total_old).abs()
    }

    pub fn is_increase(&self) -> bool {
        self.total_new > self.total_old
    }

    pub fn percentage(&self) -> f64 {
        percentage(self.total_old, self.total_new)
    }
}
