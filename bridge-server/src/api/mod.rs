//! API Module
//!
//! HTTP API layer for the server.
//! Each submodule handles endpoints for a specific domain.

pub mod callback;
pub mod deployment;
pub mod error;
pub mod health;

use std::sync::Arc;

use axum::{
    Router,
    http::{Method, header},
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::service::DeploymentService;

/// Create the main API router with all endpoints
pub fn create_router(service: Arc<DeploymentService>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        // Health check
        .route("/api/v1/health", get(health::health_check))
        // Deployment endpoints
        .route(
            "/api/v1/deployments",
            post(deployment::create_deployment).get(deployment::list_deployments),
        )
        .route("/api/v1/deployments/{id}", get(deployment::get_deployment))
        .route(
            "/api/v1/deployments/{id}/steps",
            get(deployment::get_deployment_steps),
        )
        // Provisioner callbacks
        .route("/api/v1/infra/callback", post(callback::infra_callback))
        // Add state and middleware
        .with_state(service)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
