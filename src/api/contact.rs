use crate::api::AppState;
use crate::api::client_ip::ClientId;
use crate::api::schemas::contact::MessageResponse;
use crate::domain::outcome::DispatchOutcome;
use crate::error::{AppError, Result};
use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use tracing::Instrument;

pub const SENT_MESSAGE: &str = "Email sent successfully";

/// Accepts a contact submission and relays it to the delivery channel.
///
/// The pipeline runs on its own task, so a client that disconnects or a request timeout does
/// not cancel a submission halfway through delivery.
///
/// # Errors
/// Returns an `AppError` describing why the submission was rejected or could not be delivered.
pub async fn send(
    State(state): State<AppState>,
    ClientId(client_id): ClientId,
    body: Bytes,
) -> Result<Json<MessageResponse>> {
    let service = state.submission_service;
    let outcome = tokio::spawn(async move { service.handle(&body, &client_id).await }.in_current_span())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Submission task failed");
            AppError::Internal
        })?;

    match outcome {
        DispatchOutcome::Sent => Ok(Json(MessageResponse::new(SENT_MESSAGE))),
        DispatchOutcome::Rejected(rejection) => Err(rejection.into()),
        DispatchOutcome::Failed(failure) => Err(failure.into()),
    }
}

/// Answers cross-origin pre-flight requests that reach the route without CORS request headers.
pub async fn preflight() -> impl IntoResponse {
    (
        StatusCode::OK,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
        ],
    )
}
