use crate::services::admission::RateStore;
use crate::services::delivery::DeliveryChannel;
use opentelemetry::{KeyValue, global, metrics::Gauge};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

#[derive(Clone, Debug)]
struct Metrics {
    status: Gauge<i64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("contact-relay");
        Self {
            status: meter
                .i64_gauge("contact_relay_health_status")
                .with_description("Status of health checks (1 for ok, 0 for error)")
                .build(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct HealthService {
    store: Arc<dyn RateStore>,
    channel: Arc<dyn DeliveryChannel>,
    store_timeout: Duration,
    metrics: Metrics,
}

impl HealthService {
    #[must_use]
    pub fn new(store: Arc<dyn RateStore>, channel: Arc<dyn DeliveryChannel>, store_timeout: Duration) -> Self {
        Self { store, channel, store_timeout, metrics: Metrics::new() }
    }

    /// Checks that the rate store answers.
    ///
    /// # Errors
    /// Returns a string describing the failure if the store is unreachable.
    pub async fn check_rate_store(&self) -> Result<(), String> {
        let result = match timeout(self.store_timeout, self.store.ping()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(format!("Rate store check failed: {e}")),
            Err(_) => Err("Rate store check timed out".to_string()),
        };
        self.record("rate_store", result.is_ok());
        result
    }

    /// Checks that the delivery channel has credentials.
    ///
    /// # Errors
    /// Returns a string if the channel is not configured.
    pub fn check_delivery(&self) -> Result<(), String> {
        let configured = self.channel.is_configured();
        self.record("delivery", configured);
        if configured { Ok(()) } else { Err("Delivery channel is not configured".to_string()) }
    }

    fn record(&self, component: &'static str, ok: bool) {
        self.metrics.status.record(i64::from(ok), &[KeyValue::new("component", component)]);
    }
}
