//! # Cart Sync
//!
//! > **A server-confirmed shopping cart for an auto-parts storefront.**
//!
//! This crate keeps a local mirror of a remote cart. The remote cart service
//! is the source of truth: line lists change only when a confirmed reply is
//! merged in. Client-only state (selection, favorites, comments, delivery
//! details) lives beside the lines and survives every merge.
//!
//! ## 🏗️ Design
//!
//! The mirror is an actor. One [`ResourceActor<Cart>`](framework::ResourceActor)
//! owns the cart and applies [`CartAction`](cart_actor::CartAction)s one at a
//! time, so every merge is a single step and watchers never see half of one.
//! Server calls happen outside the actor, in [`CartStore`](clients::CartStore),
//! which brackets each call between a prepare step and a merge step:
//!
//! ```text
//! CartStore::add_item
//!   ├─ PrepareAdd     (actor: stock check, pending += 1, returns revision)
//!   ├─ add_to_cart    (CartService)
//!   ├─ Merge          (actor: reconcile lines against that revision, clamp to stock)
//!   └─ Finish         (actor: pending -= 1, record error)
//! ```
//!
//! Operations on the same line wait for each other; operations on different
//! lines run concurrently, and a slow reply never removes a line another
//! call added in the meantime. Price re-validation is single-flight.
//!
//! ## 👩‍💻 Architecture Notes
//!
//! ### 1. Type-Safe Error Handling
//! Each actor defines its own error type ([`CartError`](cart_actor::CartError),
//! [`ServerError`](server_actor::ServerError)). The `Display` text of a
//! `CartError` is exactly the message a shopper sees.
//!
//! ### 2. Pluggable Backend
//! The store talks to a [`CartService`](clients::CartService). The crate ships
//! an in-memory implementation built on the same actor framework
//! ([`server_actor`]), which the demo and the tests run against.
//!
//! ### 3. Observability
//! Structured `tracing` everywhere; see [`lifecycle::tracing`].
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Engine ([`framework`])
//! The generic `ResourceActor<T>`, its client and the mock client for tests.
//!
//! ### 2. The Orchestrator ([`lifecycle`])
//! - **Key items**: [`CartSystem`](lifecycle::CartSystem),
//!   [`PriceRefresh`](lifecycle::PriceRefresh).
//!
//! ### 3. The Interface ([`clients`])
//! - **Key items**: [`CartStore`](clients::CartStore),
//!   [`CartClient`](clients::CartClient),
//!   [`ServerCartClient`](clients::ServerCartClient).
//!
//! ### 4. The Implementation ([`cart_actor`], [`server_actor`])
//! Concrete `ActorEntity` implementations for the mirror and the backend.
//!
//! ### 5. Data ([`model`], [`config`])
//! Lines, wire replies, price changes, notices and configuration.
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! RUST_LOG=info cargo run
//! cargo test
//! ```

pub mod cart_actor;
pub mod clients;
pub mod config;
pub mod framework;
pub mod lifecycle;
pub mod model;
pub mod server_actor;
