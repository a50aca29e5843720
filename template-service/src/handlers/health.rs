use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use service_core::error::AppError;

use crate::services::metrics::get_metrics;
use crate::AppState;

pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "template-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// Ready once the static front end is in place.
pub async fn readiness_check(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let static_dir = &state.config.assets.static_dir;
    if !static_dir.is_dir() {
        tracing::warn!(path = %static_dir.display(), "Static directory missing");
        return Err(AppError::ServiceUnavailable(format!(
            "static directory not found: {}",
            static_dir.display()
        )));
    }

    Ok((StatusCode::OK, Json(json!({ "status": "ready" }))))
}

pub async fn metrics_endpoint() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        get_metrics(),
    )
}
