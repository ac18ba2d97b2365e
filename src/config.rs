//! # Configuration
//!
//! [`CartConfig`] comes from defaults, an optional TOML document and a few
//! environment overrides, applied in that order.
//!
//! ```toml
//! delivery_price = 39.0
//! currency = "RUB"
//! price_refresh_interval_secs = 120
//!
//! [delivery]
//! method = "Courier delivery"
//! address = ""
//! ```

use crate::model::DeliveryInfo;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

pub const ENV_DELIVERY_PRICE: &str = "CART_DELIVERY_PRICE";
pub const ENV_CURRENCY: &str = "CART_CURRENCY";
pub const ENV_PRICE_REFRESH_SECS: &str = "CART_PRICE_REFRESH_SECS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid cart configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CartConfig {
    /// Fixed delivery price added to every summary. Replaces `delivery.price`
    /// when the cart is opened.
    pub delivery_price: f64,
    /// Currency assumed for lines that do not name one.
    pub currency: String,
    /// Period of the background price re-validation.
    pub price_refresh_interval_secs: u64,
    /// Request buffer of each actor.
    pub channel_capacity: usize,
    /// Buffer of the notice broadcast; slow subscribers skip older events.
    pub event_capacity: usize,
    pub delivery: DeliveryInfo,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            delivery_price: 39.0,
            currency: "RUB".to_string(),
            price_refresh_interval_secs: 120,
            channel_capacity: 32,
            event_capacity: 64,
            delivery: DeliveryInfo::default(),
        }
    }
}

impl CartConfig {
    /// Parses a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validated()
    }

    /// Applies `CART_DELIVERY_PRICE`, `CART_CURRENCY` and
    /// `CART_PRICE_REFRESH_SECS` from the process environment.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from any key lookup.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(value) = lookup(ENV_DELIVERY_PRICE) {
            self.delivery_price = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    key: ENV_DELIVERY_PRICE,
                    value,
                })?;
        }
        if let Some(value) = lookup(ENV_CURRENCY) {
            self.currency = value.trim().to_string();
        }
        if let Some(value) = lookup(ENV_PRICE_REFRESH_SECS) {
            self.price_refresh_interval_secs =
                value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue {
                        key: ENV_PRICE_REFRESH_SECS,
                        value,
                    })?;
        }
        self.validated()
    }

    pub fn price_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.price_refresh_interval_secs)
    }

    fn validated(self) -> Result<Self, ConfigError> {
        if !self.delivery_price.is_finite() || self.delivery_price < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "delivery_price",
                value: self.delivery_price.to_string(),
            });
        }
        if self.currency.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "currency",
                value: self.currency,
            });
        }
        if self.price_refresh_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "price_refresh_interval_secs",
                value: "0".to_string(),
            });
        }
        if self.channel_capacity == 0 || self.event_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "channel_capacity",
                value: format!("{}/{}", self.channel_capacity, self.event_capacity),
            });
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CartConfig::default();
        assert_eq!(config.delivery_price, 39.0);
        assert_eq!(config.currency, "RUB");
        assert_eq!(config.price_refresh_interval(), Duration::from_secs(120));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = CartConfig::from_toml_str(
            r#"
            price_refresh_interval_secs = 30

            [delivery]
            method = "Pickup"
            address = "Warehouse 4"
            price = 0.0
            "#,
        )
        .unwrap();
        assert_eq!(config.price_refresh_interval_secs, 30);
        assert_eq!(config.delivery.method, "Pickup");
        assert_eq!(config.delivery_price, 39.0);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            CartConfig::from_toml_str("delivery_price = \"free\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            CartConfig::from_toml_str("price_refresh_interval_secs = 0"),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_overrides() {
        let config = CartConfig::default()
            .with_overrides(|key| match key {
                ENV_DELIVERY_PRICE => Some("0".into()),
                ENV_CURRENCY => Some("EUR".into()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.delivery_price, 0.0);
        assert_eq!(config.currency, "EUR");
        assert_eq!(config.price_refresh_interval_secs, 120);

        let err = CartConfig::default()
            .with_overrides(|key| (key == ENV_PRICE_REFRESH_SECS).then(|| "soon".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("CART_PRICE_REFRESH_SECS"));
    }
}
