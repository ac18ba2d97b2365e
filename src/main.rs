//! # Cart Sync Demo
//!
//! Runs a cart against the in-memory backend and walks through a short
//! shopping session:
//! 1.  Adding parts, twice for the same offer.
//! 2.  Deselecting a line and clamping a quantity to stock.
//! 3.  A catalog price move picked up by re-validation.
//! 4.  Removing the selected lines.

use cart_sync::config::CartConfig;
use cart_sync::lifecycle::{setup_tracing, CartSystem};
use cart_sync::model::{NewCartItem, OfferIdentity, PriceChangeSummary, StoreEvent};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn, Instrument};

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let config = CartConfig::default()
        .with_env_overrides()
        .map_err(|e| e.to_string())?;
    info!(?config, "Starting cart demo");

    let system = CartSystem::in_memory(config, "cart_1".into(), Default::default())
        .await
        .map_err(|e| e.to_string())?;

    let mut events = system.store.events();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(StoreEvent::Notice(notice)) => {
                    info!(level = ?notice.level, "{}", notice.message)
                }
                Ok(StoreEvent::PricesChanged(changes)) => {
                    let summary = PriceChangeSummary::of(&changes);
                    info!(
                        lines = changes.len(),
                        difference = summary.difference(),
                        percentage = summary.percentage(),
                        "Prices changed"
                    );
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Missed notices"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let store = &system.store;
    let pads = NewCartItem::new("Brake pads", 2450.0, 1)
        .with_offer_key("wh1-0986494")
        .with_part("BOSCH", "0986494")
        .with_stock(4);
    let filter = NewCartItem::new("Oil filter", 640.0, 2)
        .with_product_id("p-oc90")
        .with_part("MAHLE", "OC 90");

    async {
        store.add_item(pads.clone()).await?;
        store.add_item(pads).await?;
        store.add_item(filter).await
    }
    .instrument(tracing::info_span!("shopping"))
    .await
    .map_err(|e| e.to_string())?;

    let cart = store.snapshot().await.map_err(|e| e.to_string())?;
    info!(lines = cart.items.len(), total = cart.summary.final_price, "Cart filled");

    let (Some(pads_line), Some(filter_line)) = (
        cart.items.first().map(|item| item.id().clone()),
        cart.items.get(1).map(|item| item.id().clone()),
    ) else {
        return Err("Cart is missing the added lines".to_string());
    };
    store
        .toggle_select(filter_line)
        .await
        .map_err(|e| e.to_string())?;
    store
        .update_quantity(pads_line, 10)
        .await
        .map_err(|e| e.to_string())?;

    if let Some(backend) = &system.backend {
        backend
            .set_price(OfferIdentity::offer("wh1-0986494"), 2590.0)
            .await
            .map_err(|e| e.to_string())?;
    }
    match store.update_prices().await {
        Ok(Some(changes)) => info!(changes = changes.len(), "Prices re-validated"),
        Ok(None) => info!("Price check already running"),
        Err(e) => warn!(error = %e, "Price check failed"),
    }
    store
        .dismiss_price_changes()
        .await
        .map_err(|e| e.to_string())?;

    let removed = store.remove_selected().await.map_err(|e| e.to_string())?;
    let cart = store.snapshot().await.map_err(|e| e.to_string())?;
    info!(
        removed,
        lines = cart.items.len(),
        total = cart.summary.final_price,
        "Checkout basket"
    );

    system.shutdown().await?;
    if let Err(e) = printer.await {
        warn!(error = %e, "Notice printer failed");
    }

    info!("Application completed successfully");
    Ok(())
}
