use axum::response::Json;
use tracing::debug;

use crate::models::HealthResponse;

/// Liveness check; reports ok without checking any dependency.
pub async fn health_handler() -> Json<HealthResponse> {
    debug!("Health check requested");
    Json(HealthResponse::ok())
}
