//! Runtime orchestration and lifecycle management.
//!
//! This module contains the infrastructure that runs a cart, including:
//!
//! - **Actor lifecycle management**: starting, wiring and shutting down the
//!   mirror actor and the in-memory backend
//! - **Background work**: the periodic price re-validation
//! - **Observability setup**: initializing tracing and logging
//!
//! # Main Components
//!
//! - [`CartSystem`] - Starts a cart against a [`CartService`](crate::clients::CartService)
//!   and stops it again
//! - [`PriceRefresh`] - Handle of the refresh loop started by [`price_refresh::spawn`]
//! - [`setup_tracing`] - Initializes the tracing/logging infrastructure

pub mod cart_system;
pub mod price_refresh;
pub mod tracing;

pub use cart_system::*;
pub use price_refresh::PriceRefresh;
pub use self::tracing::setup_tracing;
