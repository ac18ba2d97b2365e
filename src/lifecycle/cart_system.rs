use crate::cart_actor::{self, CartError};
use crate::clients::{CartClient, CartService, CartStore, ServerCartClient};
use crate::config::CartConfig;
use crate::lifecycle::price_refresh::{self, PriceRefresh};
use crate::model::{CartCreate, CartId, DeliveryInfo, ServerCartCreate};
use crate::server_actor;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Starts, wires and stops everything one cart needs.
///
/// `CartSystem` is responsible for:
/// - **Lifecycle Management**: spawning the mirror actor (and the in-memory
///   backend when asked to) and stopping them again
/// - **Startup Sequence**: opening the mirror, loading the remote cart and
///   running the first price re-validation
/// - **Background Work**: the periodic price refresh
///
/// # Example
///
/// ```ignore
/// let system = CartSystem::in_memory(CartConfig::default(), "cart_1".into(), Default::default()).await?;
///
/// system.store.add_item(NewCartItem::new("Brake pads", 2450.0, 1)).await?;
///
/// system.shutdown().await?;
/// ```
pub struct CartSystem {
    /// Public cart API.
    pub store: CartStore,

    /// Direct handle to the in-memory backend, for seeding catalog prices.
    /// `None` when connected to an external service.
    pub backend: Option<ServerCartClient>,

    refresh: Option<PriceRefresh>,

    /// Task handles for all running actors (used for graceful shutdown)
    handles: Vec<JoinHandle<()>>,
}

impl CartSystem {
    /// Starts a cart backed by the in-memory backend actor, seeded with
    /// `seed`.
    pub async fn in_memory(
        config: CartConfig,
        cart_id: CartId,
        seed: ServerCartCreate,
    ) -> Result<Self, CartError> {
        let (server_actor, server_client) = server_actor::new(config.channel_capacity);
        let server_handle = tokio::spawn(server_actor.run(()));

        let backend = ServerCartClient::new(server_client, cart_id.clone());
        backend
            .open(seed)
            .await
            .map_err(|e| CartError::Service(e.to_string()))?;

        let mut system = Self::connect(config, cart_id, Arc::new(backend.clone())).await?;
        system.backend = Some(backend);
        system.handles.push(server_handle);
        Ok(system)
    }

    /// Starts a cart against any [`CartService`].
    ///
    /// Load and the first price check run before this returns. Their
    /// failures are logged only; the cart starts empty.
    pub async fn connect(
        config: CartConfig,
        cart_id: CartId,
        service: Arc<dyn CartService>,
    ) -> Result<Self, CartError> {
        let (cart_actor, cart_client) = cart_actor::new(config.channel_capacity);
        let cart_handle = tokio::spawn(cart_actor.run(()));

        let cart = CartClient::new(cart_client, cart_id);
        cart.open(CartCreate {
            delivery: DeliveryInfo {
                price: config.delivery_price,
                ..config.delivery.clone()
            },
        })
        .await?;

        let store = CartStore::new(cart, service, config.event_capacity)
            .with_currency(config.currency.clone());

        if let Err(e) = store.load().await {
            warn!(error = %e, "Initial cart load failed");
        }
        if let Err(e) = store.update_prices().await {
            warn!(error = %e, "Initial price check failed");
        }
        let refresh = price_refresh::spawn(store.clone(), config.price_refresh_interval());

        info!("Cart system started");
        Ok(Self {
            store,
            backend: None,
            refresh: Some(refresh),
            handles: vec![cart_handle],
        })
    }

    /// Gracefully shuts down the system.
    ///
    /// Stops the refresh loop, then drops every client so each actor sees its
    /// channel close and exits. Clones of the store held elsewhere keep the
    /// actors alive; drop them first.
    pub async fn shutdown(mut self) -> Result<(), String> {
        info!("Shutting down cart system...");

        if let Some(refresh) = self.refresh.take() {
            refresh.stop().await;
        }
        drop(self.store);
        drop(self.backend);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(format!("Actor task failed: {:?}", e));
            }
        }

        info!("Cart system shutdown complete.");
        Ok(())
    }
}
