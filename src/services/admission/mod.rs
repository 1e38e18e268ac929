use opentelemetry::{KeyValue, global, metrics::Counter};
use std::sync::Arc;
use std::time::Instant;

pub mod store;

pub use store::{Admission, RatePolicy, RateRecord, RateStore, StoreError};

#[derive(Clone, Debug)]
struct Metrics {
    decisions_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("contact-relay");
        Self {
            decisions_total: meter
                .u64_counter("rate_limit_decisions_total")
                .with_description("Rate limit decisions (allowed/throttled)")
                .build(),
        }
    }
}

/// Fixed-window admission control keyed by client identifier.
///
/// A client can get up to twice the capacity through across a window boundary; the limiter
/// resets at window edges instead of sliding.
#[derive(Clone, Debug)]
pub struct AdmissionController {
    store: Arc<dyn RateStore>,
    policy: RatePolicy,
    metrics: Metrics,
}

impl AdmissionController {
    #[must_use]
    pub fn new(store: Arc<dyn RateStore>, policy: RatePolicy) -> Self {
        Self { store, policy, metrics: Metrics::new() }
    }

    #[must_use]
    pub const fn policy(&self) -> RatePolicy {
        self.policy
    }

    /// Decides whether a request from `identifier` may proceed.
    ///
    /// # Errors
    /// Returns `StoreError` if the backing store fails; callers treat this as a rejection.
    pub async fn admit(&self, identifier: &str, now: Instant) -> Result<Admission, StoreError> {
        let admission = self.store.hit(identifier, now, self.policy).await?;

        let label = if admission.is_admitted() {
            "allowed"
        } else {
            tracing::warn!(client_id = %identifier, "Rate limit exceeded");
            "throttled"
        };
        self.metrics.decisions_total.add(1, &[KeyValue::new("status", label)]);

        Ok(admission)
    }
}
