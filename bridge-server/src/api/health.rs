//! Health Check API Handler
//!
//! Simple health check endpoint for monitoring.

use axum::Json;
use bridge_core::dto::health::HealthStatus;

/// GET /api/v1/health
/// Health check endpoint
pub async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy".to_string(),
        service: "bridge-server".to_string(),
        time: chrono::Utc::now(),
    })
}
