use crate::api::schemas::contact::MessageResponse;
use crate::domain::outcome::{Failure, Rejection};
use crate::domain::submission::Violations;
use crate::services::admission::StoreError;
use crate::services::delivery::DeliveryError;
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use std::time::Duration;
use thiserror::Error;

pub const SPAM_MESSAGE: &str = "Unable to process submission.";
pub const RATE_LIMITED_MESSAGE: &str = "Too many requests. Please try again later.";
pub const MALFORMED_MESSAGE: &str = "Invalid JSON in request body";
pub const UNCONFIGURED_MESSAGE: &str = "Email service not configured";
pub const DELIVERY_FAILED_MESSAGE: &str = "Error sending email. Please try again later.";
pub const PAYLOAD_TOO_LARGE_MESSAGE: &str = "Request body too large";
pub const REQUEST_TIMEOUT_MESSAGE: &str = "Request timed out. Please try again later.";
pub const INTERNAL_MESSAGE: &str = "An unexpected error occurred. Please try again later.";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Submission flagged as spam")]
    Spam,
    #[error("Rate limit exceeded")]
    RateLimited { retry_after: Option<Duration> },
    #[error("Malformed request body")]
    Malformed,
    #[error("Validation failed: {0}")]
    Validation(Violations),
    #[error("Delivery channel not configured")]
    Unconfigured,
    #[error("Delivery failed: {0}")]
    Delivery(#[from] DeliveryError),
    #[error("Delivery timed out")]
    Timeout,
    #[error("Rate store error: {0}")]
    Store(#[from] StoreError),
    #[error("Request body too large")]
    PayloadTooLarge,
    #[error("Request timed out")]
    RequestTimeout,
    #[error("Internal server error")]
    Internal,
}

pub type Result<T> = std::result::Result<T, AppError>;

impl From<Rejection> for AppError {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::Spam => Self::Spam,
            Rejection::RateLimited { retry_after } => Self::RateLimited { retry_after },
            Rejection::Malformed => Self::Malformed,
            Rejection::Validation(violations) => Self::Validation(violations),
        }
    }
}

impl From<Failure> for AppError {
    fn from(failure: Failure) -> Self {
        match failure {
            Failure::Unconfigured => Self::Unconfigured,
            Failure::Delivery(e) => Self::Delivery(e),
            Failure::Timeout => Self::Timeout,
            Failure::Store(e) => Self::Store(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Spam => {
                tracing::debug!("Spam rejected");
                (StatusCode::BAD_REQUEST, MessageResponse::new(SPAM_MESSAGE))
            }
            Self::RateLimited { retry_after } => {
                tracing::debug!("Rate limited");
                let mut response =
                    (StatusCode::TOO_MANY_REQUESTS, Json(MessageResponse::new(RATE_LIMITED_MESSAGE))).into_response();
                if let Some(retry_after) = retry_after {
                    // Round up so clients never retry inside the window.
                    let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
                    response.headers_mut().insert(header::RETRY_AFTER, HeaderValue::from(secs.max(1)));
                }
                return response;
            }
            Self::Malformed => {
                tracing::debug!("Malformed request body");
                (StatusCode::BAD_REQUEST, MessageResponse::new(MALFORMED_MESSAGE))
            }
            Self::Validation(violations) => {
                tracing::debug!(violations = %violations, "Validation failed");
                (StatusCode::BAD_REQUEST, MessageResponse::validation(&violations))
            }
            Self::Unconfigured => {
                tracing::error!("Delivery channel not configured");
                (StatusCode::SERVICE_UNAVAILABLE, MessageResponse::new(UNCONFIGURED_MESSAGE))
            }
            Self::Delivery(e) => {
                tracing::error!(error = %e, "Delivery error");
                (StatusCode::INTERNAL_SERVER_ERROR, MessageResponse::new(DELIVERY_FAILED_MESSAGE))
            }
            Self::Timeout => {
                tracing::error!("Delivery timed out");
                (StatusCode::INTERNAL_SERVER_ERROR, MessageResponse::new(DELIVERY_FAILED_MESSAGE))
            }
            Self::Store(e) => {
                tracing::error!(error = %e, "Rate store error");
                (StatusCode::INTERNAL_SERVER_ERROR, MessageResponse::new(INTERNAL_MESSAGE))
            }
            Self::PayloadTooLarge => {
                tracing::debug!("Request body too large");
                (StatusCode::PAYLOAD_TOO_LARGE, MessageResponse::new(PAYLOAD_TOO_LARGE_MESSAGE))
            }
            Self::RequestTimeout => {
                tracing::warn!("Request timed out");
                (StatusCode::REQUEST_TIMEOUT, MessageResponse::new(REQUEST_TIMEOUT_MESSAGE))
            }
            Self::Internal => {
                tracing::error!("Internal server error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, MessageResponse::new(INTERNAL_MESSAGE))
            }
        };

        (status, Json(body)).into_response()
    }
}
