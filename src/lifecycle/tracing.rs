//! # Observability & Tracing
//!
//! [`setup_tracing`] initializes structured logging with the `tracing` crate.
//! The compact format hides the module prefix (`with_target(false)`) and shows
//! spans inline, so a log line reads as the path of the request that caused
//! it.
//!
//! ## What Gets Traced
//!
//! - **Actor Lifecycle**: startup, shutdown and final state of each actor
//! - **Store Operations**: one span per public operation (`add_item`,
//!   `update_quantity`, `update_prices`, ...) with the line and quantity as fields
//! - **Service Calls**: refusals and transport failures with the backend's message
//! - **Notices**: every notice the store emits, with its level
//!
//! ## Usage Examples
//!
//! ```bash
//! # Compact logs
//! RUST_LOG=info cargo run
//!
//! # Show actions and payloads
//! RUST_LOG=debug cargo run
//!
//! # Only the store
//! RUST_LOG=cart_sync::clients=debug cargo run
//! ```
//!
//! ## Workflow Trace Example
//!
//! Starting a cart and clamping a quantity, with `RUST_LOG=info`:
//!
//! ```text
//! INFO Actor started entity_type="Cart"
//! INFO Created entity_type="Cart" id=cart_1 size=1
//! INFO load: Cart loaded lines=0
//! INFO Cart system started
//! INFO update_quantity{line=line_1 quantity=10}: Notice level=Info message=Only 4 available, quantity limited to 4
//! INFO update_quantity{line=line_1 quantity=10}: Notice level=Success message=Quantity updated
//! ```

/// Installs the global subscriber. Filters come from `RUST_LOG`.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false) // Module paths add nothing; spans carry the context
        .compact()
        .init();
}
