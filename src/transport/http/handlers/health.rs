use crate::transport::http::types::HealthResponse;
use axum::Json;
use tracing::debug;

/// Liveness only; the database is deliberately not consulted.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Process is up", body = HealthResponse)
    )
)]
pub async fn healthcheck_handler() -> Json<HealthResponse> {
    debug!(event = "health_check", path = "/health", "health check");
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
