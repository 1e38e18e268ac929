use crate::domain::outcome::{DispatchOutcome, Failure, Rejection};
use crate::domain::spam::is_spam;
use crate::domain::submission::{NormalizedSubmission, SubmissionInput};
use crate::domain::validation::validate;
use crate::services::admission::{Admission, AdmissionController};
use crate::services::delivery::{DeliveryChannel, OutboundEmail};
use opentelemetry::{KeyValue, global, metrics::Counter};
use std::sync::Arc;
use std::time::{Duration, Instant};

type Stage<T> = std::result::Result<T, DispatchOutcome>;

#[derive(Clone, Debug)]
struct Metrics {
    submissions_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("contact-relay");
        Self {
            submissions_total: meter
                .u64_counter("contact_submissions_total")
                .with_description("Contact submissions by final outcome")
                .build(),
        }
    }
}

/// Runs a submission through spam check, admission, parsing, validation and delivery.
///
/// Stages run in a fixed order and each one either hands its result to the next or ends the
/// pipeline with an outcome. An admission slot consumed by a request stays consumed whatever
/// happens afterwards.
#[derive(Clone, Debug)]
pub struct SubmissionService {
    admission: AdmissionController,
    channel: Arc<dyn DeliveryChannel>,
    delivery_timeout: Duration,
    metrics: Metrics,
}

impl SubmissionService {
    #[must_use]
    pub fn new(admission: AdmissionController, channel: Arc<dyn DeliveryChannel>, delivery_timeout: Duration) -> Self {
        Self { admission, channel, delivery_timeout, metrics: Metrics::new() }
    }

    #[tracing::instrument(skip(self, payload), fields(outcome = tracing::field::Empty))]
    pub async fn handle(&self, payload: &[u8], client_id: &str) -> DispatchOutcome {
        let outcome = match self.run(payload, client_id).await {
            Ok(()) => DispatchOutcome::Sent,
            Err(outcome) => outcome,
        };

        tracing::Span::current().record("outcome", outcome.label());
        self.metrics.submissions_total.add(1, &[KeyValue::new("outcome", outcome.label())]);
        outcome
    }

    async fn run(&self, payload: &[u8], client_id: &str) -> Stage<()> {
        let parsed = SubmissionInput::from_json(payload);
        Self::reject_spam(parsed.as_ref().ok())?;
        self.admit(client_id).await?;
        let input = parsed.map_err(|_| Rejection::Malformed)?;
        let submission = validate(&input).map_err(Rejection::Validation)?;
        self.ensure_configured()?;
        self.deliver(&submission).await
    }

    fn reject_spam(input: Option<&SubmissionInput>) -> Stage<()> {
        if input.is_some_and(is_spam) {
            tracing::info!("Decoy field filled, rejecting submission");
            return Err(Rejection::Spam.into());
        }
        Ok(())
    }

    async fn admit(&self, client_id: &str) -> Stage<()> {
        match self.admission.admit(client_id, Instant::now()).await {
            Ok(Admission::Admitted) => Ok(()),
            Ok(Admission::Throttled { retry_after }) => Err(Rejection::RateLimited { retry_after }.into()),
            Err(e) => Err(Failure::Store(e).into()),
        }
    }

    fn ensure_configured(&self) -> Stage<()> {
        if self.channel.is_configured() {
            Ok(())
        } else {
            Err(Failure::Unconfigured.into())
        }
    }

    async fn deliver(&self, submission: &NormalizedSubmission) -> Stage<()> {
        let email = OutboundEmail::compose(submission);

        match tokio::time::timeout(self.delivery_timeout, self.channel.deliver(&email)).await {
            Ok(Ok(())) => {
                tracing::info!("Submission delivered");
                Ok(())
            }
            Ok(Err(e)) => Err(Failure::Delivery(e).into()),
            Err(_) => Err(Failure::Timeout.into()),
        }
    }
}
