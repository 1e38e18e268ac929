#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::todo)]
#![warn(clippy::panic)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(unreachable_pub)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![deny(unused_must_use)]

pub mod adapters;
pub mod api;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod services;
pub mod telemetry;
pub mod workers;

use crate::adapters::memory::MemoryRateStore;
use crate::adapters::redis::{RedisClient, RedisRateStore};
use crate::adapters::resend::ResendChannel;
use crate::api::client_ip::ClientIdResolver;
use crate::api::{AppState, MgmtState};
use crate::config::{Config, RateStoreBackend};
use crate::services::admission::{AdmissionController, RatePolicy, RateStore};
use crate::services::delivery::DeliveryChannel;
use crate::services::health_service::HealthService;
use crate::services::submission_service::SubmissionService;
use crate::workers::RateStoreSweeper;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Fully wired application: routers plus the background workers they rely on.
#[derive(Debug)]
pub struct App {
    pub router: axum::Router,
    pub mgmt_router: axum::Router,
    pub workers: Workers,
}

#[derive(Debug, Default)]
pub struct Workers {
    pub sweeper: Option<RateStoreSweeper>,
}

impl Workers {
    #[must_use]
    pub fn spawn_all(self, shutdown_rx: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        let mut tasks = Vec::new();
        if let Some(sweeper) = self.sweeper {
            tasks.push(tokio::spawn(sweeper.run(shutdown_rx)));
        }
        tasks
    }
}

#[derive(Debug)]
pub struct AppBuilder {
    config: Config,
    rate_store: Option<Arc<dyn RateStore>>,
    delivery_channel: Option<Arc<dyn DeliveryChannel>>,
}

impl AppBuilder {
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config, rate_store: None, delivery_channel: None }
    }

    #[must_use]
    pub fn with_rate_store(mut self, store: Arc<dyn RateStore>) -> Self {
        self.rate_store = Some(store);
        self
    }

    #[must_use]
    pub fn with_delivery_channel(mut self, channel: Arc<dyn DeliveryChannel>) -> Self {
        self.delivery_channel = Some(channel);
        self
    }

    /// Wires stores, channels and services into routers.
    ///
    /// # Errors
    /// Returns an error if the configured rate store cannot be reached or the HTTP client cannot be built.
    pub async fn build(self) -> anyhow::Result<App> {
        let config = self.config;

        let (rate_store, sweep) = match self.rate_store {
            Some(store) => (store, false),
            None => Self::default_rate_store(&config).await?,
        };

        let delivery_channel = match self.delivery_channel {
            Some(channel) => channel,
            None => {
                let http = reqwest::Client::builder()
                    .user_agent(concat!("contact-relay/", env!("CARGO_PKG_VERSION")))
                    .build()?;
                Arc::new(ResendChannel::new(http, &config.delivery)) as Arc<dyn DeliveryChannel>
            }
        };

        if !delivery_channel.is_configured() {
            tracing::warn!("Delivery API key not configured; submissions will be answered with 503");
        }

        let policy = RatePolicy::new(Duration::from_secs(config.rate_limit.window_secs), config.rate_limit.max_requests);
        let admission = AdmissionController::new(Arc::clone(&rate_store), policy);
        let submission_service = SubmissionService::new(
            admission,
            Arc::clone(&delivery_channel),
            Duration::from_millis(config.delivery.timeout_ms),
        );
        let health_service =
            HealthService::new(Arc::clone(&rate_store), delivery_channel, Duration::from_millis(config.delivery.timeout_ms));

        let state = AppState {
            submission_service,
            client_ids: ClientIdResolver::new(
                config.rate_limit.client_ip_mode,
                config.rate_limit.trusted_proxies.clone(),
            ),
        };

        let workers = Workers {
            sweeper: sweep.then(|| {
                RateStoreSweeper::new(rate_store, Duration::from_secs(config.rate_limit.sweep_interval_secs.max(1)))
            }),
        };

        Ok(App {
            router: api::app_router(&config.server, state),
            mgmt_router: api::mgmt_router(MgmtState { health_service }),
            workers,
        })
    }

    async fn default_rate_store(config: &Config) -> anyhow::Result<(Arc<dyn RateStore>, bool)> {
        match config.rate_limit.backend {
            RateStoreBackend::Memory => Ok((Arc::new(MemoryRateStore::new()) as Arc<dyn RateStore>, true)),
            RateStoreBackend::Redis => {
                let url = config
                    .rate_limit
                    .redis_url
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("redis backend selected but no redis URL configured"))?;
                let redis = RedisClient::new(url).await?;
                Ok((Arc::new(RedisRateStore::new(redis)) as Arc<dyn RateStore>, false))
            }
        }
    }
}

/// Routes panics through `tracing` so they land in the structured log stream.
pub fn setup_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let location = info.location().map(ToString::to_string).unwrap_or_default();
        tracing::error!(panic = %info, location = %location, "Panic occurred");
    }));
}

/// Flips the shutdown channel on SIGINT or SIGTERM.
pub fn spawn_signal_handler(shutdown_tx: watch::Sender<bool>) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to listen for SIGTERM");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            () = ctrl_c => {},
            () = terminate => {},
        }

        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });
}
