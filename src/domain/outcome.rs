use crate::domain::submission::Violations;
use crate::services::admission::StoreError;
use crate::services::delivery::DeliveryError;
use std::time::Duration;

/// Result of running one submission through the pipeline.
#[derive(Debug)]
pub enum DispatchOutcome {
    Sent,
    Rejected(Rejection),
    Failed(Failure),
}

impl DispatchOutcome {
    /// Short label used for metrics and logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Rejected(Rejection::Spam) => "spam",
            Self::Rejected(Rejection::RateLimited { .. }) => "rate_limited",
            Self::Rejected(Rejection::Malformed) => "malformed",
            Self::Rejected(Rejection::Validation(_)) => "invalid",
            Self::Failed(Failure::Unconfigured) => "unconfigured",
            Self::Failed(Failure::Delivery(_)) => "delivery_error",
            Self::Failed(Failure::Timeout) => "timeout",
            Self::Failed(Failure::Store(_)) => "store_error",
        }
    }
}

/// Caller-side reasons a submission did not proceed.
#[derive(Debug)]
pub enum Rejection {
    Spam,
    RateLimited { retry_after: Option<Duration> },
    Malformed,
    Validation(Violations),
}

/// Server-side reasons a submission could not be delivered.
#[derive(Debug)]
pub enum Failure {
    Unconfigured,
    Delivery(DeliveryError),
    Timeout,
    Store(StoreError),
}

impl From<Rejection> for DispatchOutcome {
    fn from(rejection: Rejection) -> Self {
        Self::Rejected(rejection)
    }
}

impl From<Failure> for DispatchOutcome {
    fn from(failure: Failure) -> Self {
        Self::Failed(failure)
    }
}
