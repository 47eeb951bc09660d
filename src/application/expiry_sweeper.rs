//! ExpirySweeper - background task that expires lapsed subscriptions.
//!
//! ## Configuration
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `interval` | 24h | Time between sweeps |
//!
//! The first sweep runs immediately on start. A failed sweep is logged and
//! the loop keeps going; the next tick retries naturally.
//!
//! ## Graceful Shutdown
//!
//! The loop listens on a watch channel and returns once it flips to `true`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;
use tracing::{error, info};

use super::{EngineError, SubscriptionLifecycle};

pub struct ExpirySweeper {
    lifecycle: Arc<SubscriptionLifecycle>,
    interval: Duration,
}

impl ExpirySweeper {
    pub fn new(lifecycle: Arc<SubscriptionLifecycle>, interval: Duration) -> Self {
        Self { lifecycle, interval }
    }

    /// Run sweeps until the shutdown signal is received.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.interval);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
        info!(interval_secs = self.interval.as_secs(), "Expiry sweeper started");

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Expiry sweeper stopping");
                        return;
                    }
                }

                _ = interval.tick() => {
                    if let Err(e) = self.sweep_once().await {
                        error!(error = %e, "Expiry sweep failed");
                    }
                }
            }
        }
    }

    /// Run exactly one sweep.
    pub async fn sweep_once(&self) -> Result<u64, EngineError> {
        self.lifecycle.expire_lapsed().await
    }
}
