use crate::services::admission::RateStore;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;

/// Periodically drops expired admission records so the store stays bounded.
#[derive(Debug)]
pub struct RateStoreSweeper {
    store: Arc<dyn RateStore>,
    interval: Duration,
}

impl RateStoreSweeper {
    #[must_use]
    pub fn new(store: Arc<dyn RateStore>, interval: Duration) -> Self {
        Self { store, interval }
    }

    pub async fn run(self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.interval);

        while !*shutdown.borrow() {
            tokio::select! {
                _ = interval.tick() => {
                    self.sweep_once().instrument(tracing::debug_span!("rate_store_sweep_iteration")).await;
                }
                _ = shutdown.changed() => {}
            }
        }
        tracing::info!("Rate store sweeper shutting down...");
    }

    /// Runs a single sweep and returns the number of records removed.
    pub async fn sweep_once(&self) -> usize {
        match self.store.sweep(Instant::now()).await {
            Ok(removed) => {
                if removed > 0 {
                    tracing::info!(count = %removed, "Swept expired rate records");
                }
                removed
            }
            Err(e) => {
                tracing::error!(error = %e, "Rate store sweep failed");
                0
            }
        }
    }
}
