//! Headless form controller for callers of the submission endpoint.
//!
//! Validation here only gives immediate feedback. The server re-validates everything and its
//! verdict wins.

use crate::api::schemas::contact::MessageResponse;
use crate::domain::spam::is_spam;
use crate::domain::submission::{Field, SubmissionInput};
use crate::domain::validation::validate;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::BTreeMap;

pub const SUCCESS_NOTICE: &str = "Message sent successfully!";
pub const SPAM_NOTICE: &str = "Spam detected.";
pub const FIX_ERRORS_NOTICE: &str = "Please fix the errors in the form.";
pub const GENERIC_NOTICE: &str = "Something went wrong. Please try again later.";

/// What the server said about one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientResponse {
    Sent,
    Invalid { message: String, errors: BTreeMap<Field, String> },
    Rejected(String),
}

/// Carries one submission to the server.
#[async_trait]
pub trait SubmitTransport: Send + Sync {
    /// # Errors
    /// Returns `reqwest::Error` if the request could not be completed.
    async fn submit(&self, input: &SubmissionInput) -> Result<ClientResponse, reqwest::Error>;
}

/// `reqwest` transport for the JSON wire contract.
#[derive(Debug, Clone)]
pub struct ContactClient {
    http: reqwest::Client,
    endpoint: String,
}

impl ContactClient {
    #[must_use]
    pub fn new(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self { http, endpoint: endpoint.into() }
    }
}

#[async_trait]
impl SubmitTransport for ContactClient {
    async fn submit(&self, input: &SubmissionInput) -> Result<ClientResponse, reqwest::Error> {
        let response = self.http.post(&self.endpoint).json(input).send().await?;
        let status = response.status();
        let body: MessageResponse = response.json().await.unwrap_or_default();

        if status.is_success() {
            return Ok(ClientResponse::Sent);
        }

        Ok(match body.errors {
            Some(errors) if status == StatusCode::BAD_REQUEST => ClientResponse::Invalid { message: body.message, errors },
            _ if body.message.is_empty() => ClientResponse::Rejected(GENERIC_NOTICE.to_string()),
            _ => ClientResponse::Rejected(body.message),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormStatus {
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

#[derive(Debug)]
pub struct FormController<T> {
    transport: T,
    values: SubmissionInput,
    errors: BTreeMap<Field, String>,
    status: FormStatus,
    notice: Option<String>,
}

impl<T: SubmitTransport> FormController<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            values: SubmissionInput::default(),
            errors: BTreeMap::new(),
            status: FormStatus::Idle,
            notice: None,
        }
    }

    pub const fn status(&self) -> FormStatus {
        self.status
    }

    pub const fn values(&self) -> &SubmissionInput {
        &self.values
    }

    pub fn error(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub const fn errors(&self) -> &BTreeMap<Field, String> {
        &self.errors
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Updates a field. Editing clears that field's error and leaves any finished state.
    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        self.values.set(field, value);
        self.errors.remove(&field);
        self.settle();
    }

    pub fn set_decoy(&mut self, value: impl Into<String>) {
        self.values.honeypot = Some(value.into());
        self.settle();
    }

    /// Validates locally and, when clean, sends the form once.
    pub async fn submit(&mut self) -> FormStatus {
        let Some(payload) = self.begin_submit() else {
            return self.status;
        };
        let result = self.transport.submit(&payload).await;
        self.complete(result)
    }

    /// Runs the local checks and moves to `Submitting`.
    ///
    /// Returns the payload to send, or `None` when nothing should go out: a submission is
    /// already in flight, the decoy is filled, or local validation failed. Callers that drive
    /// the request themselves hand its result to [`Self::complete`].
    pub fn begin_submit(&mut self) -> Option<SubmissionInput> {
        if self.status == FormStatus::Submitting {
            return None;
        }
        self.notice = None;

        if is_spam(&self.values) {
            self.fail(SPAM_NOTICE);
            return None;
        }

        if let Err(violations) = validate(&self.values) {
            self.errors = violations.iter().map(|(field, message)| (field, message.to_string())).collect();
            self.status = FormStatus::Idle;
            self.notice = Some(FIX_ERRORS_NOTICE.to_string());
            return None;
        }

        self.status = FormStatus::Submitting;
        self.errors.clear();
        Some(SubmissionInput { honeypot: None, ..self.values.clone() })
    }

    /// Applies the server's answer to an in-flight submission.
    pub fn complete(&mut self, result: Result<ClientResponse, reqwest::Error>) -> FormStatus {
        if self.status != FormStatus::Submitting {
            return self.status;
        }

        match result {
            Ok(ClientResponse::Sent) => {
                self.values = SubmissionInput::default();
                self.status = FormStatus::Succeeded;
                self.notice = Some(SUCCESS_NOTICE.to_string());
            }
            Ok(ClientResponse::Invalid { message, errors }) => {
                // Server verdict wins over anything computed locally.
                self.errors.extend(errors);
                self.fail(&message);
            }
            Ok(ClientResponse::Rejected(message)) => self.fail(&message),
            Err(e) => {
                tracing::warn!(error = %e, "Submission request failed");
                self.fail(GENERIC_NOTICE);
            }
        }

        self.status
    }

    fn fail(&mut self, notice: &str) {
        self.status = FormStatus::Failed;
        self.notice = Some(notice.to_string());
    }

    fn settle(&mut self) {
        if matches!(self.status, FormStatus::Succeeded | FormStatus::Failed) {
            self.status = FormStatus::Idle;
        }
    }
}
