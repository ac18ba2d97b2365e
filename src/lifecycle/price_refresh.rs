//! # Price Refresh Loop
//!
//! Re-validates prices on a fixed period while the cart has lines. The loop
//! follows the cart through its watch channel: it idles while the cart is
//! empty, restarts the period when lines appear and exits on the stop signal
//! or when the cart actor goes away.

use crate::clients::CartStore;
use crate::model::Cart;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Handle of a running refresh loop.
pub struct PriceRefresh {
    stop: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl PriceRefresh {
    /// Signals the loop and waits for it to exit. A refresh already in
    /// flight completes first.
    pub async fn stop(self) {
        let _ = self.stop.send(());
        if let Err(error) = self.handle.await {
            warn!(%error, "Price refresh task failed");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Starts the loop. The first refresh happens one `period` from now.
pub fn spawn(store: CartStore, period: Duration) -> PriceRefresh {
    let (stop, stopped) = oneshot::channel();
    let handle = tokio::spawn(run(store, period, stopped));
    PriceRefresh { stop, handle }
}

enum Phase {
    Idle,
    Ticking,
    Done,
}

async fn run(store: CartStore, period: Duration, mut stopped: oneshot::Receiver<()>) {
    let mut cart = match store.watch().await {
        Ok(cart) => cart,
        Err(error) => {
            warn!(%error, "Price refresh cannot observe the cart");
            return;
        }
    };
    info!(period_secs = period.as_secs(), "Price refresh started");

    let mut phase = if cart.borrow_and_update().is_empty() {
        Phase::Idle
    } else {
        Phase::Ticking
    };
    loop {
        phase = match phase {
            Phase::Idle => idle(&mut cart, &mut stopped).await,
            Phase::Ticking => tick(&store, period, &mut cart, &mut stopped).await,
            Phase::Done => break,
        };
    }
    info!("Price refresh stopped");
}

/// Waits until the cart has lines.
async fn idle(cart: &mut watch::Receiver<Cart>, stopped: &mut oneshot::Receiver<()>) -> Phase {
    debug!("Price refresh idle");
    loop {
        tokio::select! {
            _ = &mut *stopped => return Phase::Done,
            changed = cart.changed() => {
                if changed.is_err() {
                    return Phase::Done;
                }
                if !cart.borrow_and_update().is_empty() {
                    return Phase::Ticking;
                }
            }
        }
    }
}

/// Refreshes every `period` until the cart empties.
async fn tick(
    store: &CartStore,
    period: Duration,
    cart: &mut watch::Receiver<Cart>,
    stopped: &mut oneshot::Receiver<()>,
) -> Phase {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = &mut *stopped => return Phase::Done,
            _ = ticker.tick() => {
                match store.update_prices().await {
                    Ok(Some(changes)) => debug!(changes = changes.len(), "Scheduled price refresh"),
                    Ok(None) => debug!("Scheduled price refresh skipped"),
                    Err(error) => debug!(%error, "Scheduled price refresh failed"),
                }
            }
            changed = cart.changed() => {
                if changed.is_err() {
                    return Phase::Done;
                }
                if cart.borrow_and_update().is_empty() {
                    return Phase::Idle;
                }
            }
        }
    }
}
