//! HTTP handler for the liveness check.

use axum::Json;
use chrono::Utc;

use crate::api::models::health::HealthResponse;

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "system",
    summary = "Health check",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse),
    )
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}
