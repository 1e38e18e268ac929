use crate::api::MgmtState;
use crate::api::schemas::health::HealthResponse;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

/// Liveness probe: returns 200 OK as long as the server is running.
pub async fn livez() -> impl IntoResponse {
    StatusCode::OK
}

/// Readiness probe: checks the rate store and the delivery channel configuration.
pub async fn readyz(State(state): State<MgmtState>) -> impl IntoResponse {
    let store_res = state.health_service.check_rate_store().await;
    let delivery_res = state.health_service.check_delivery();

    let mut status_code = StatusCode::OK;
    let store_status = if let Err(e) = store_res {
        tracing::warn!(error = %e, component = "rate_store", "Readiness probe failed");
        status_code = StatusCode::SERVICE_UNAVAILABLE;
        "error"
    } else {
        "ok"
    };

    let delivery_status = if let Err(e) = delivery_res {
        tracing::warn!(error = %e, component = "delivery", "Readiness probe failed");
        status_code = StatusCode::SERVICE_UNAVAILABLE;
        "error"
    } else {
        "ok"
    };

    let response = HealthResponse {
        status: if status_code == StatusCode::OK { "ok" } else { "error" }.to_string(),
        rate_store: store_status.to_string(),
        delivery: delivery_status.to_string(),
    };

    (status_code, Json(response))
}
