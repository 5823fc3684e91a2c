//! Infrastructure Callback Handler
//!
//! Endpoint the provisioning tool calls as each step progresses.

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use bridge_core::dto::callback::{CallbackRequest, CallbackResponse};

use crate::api::error::ApiResult;
use crate::service::DeploymentService;

/// POST /api/v1/infra/callback
/// Record a step status report
pub async fn infra_callback(
    State(service): State<Arc<DeploymentService>>,
    payload: Result<Json<CallbackRequest>, JsonRejection>,
) -> ApiResult<Json<CallbackResponse>> {
    let Json(req) = payload?;
    tracing::info!(
        "Callback for deployment {}: {} -> {}",
        req.deployment_id,
        req.step_name,
        req.status
    );

    let step = service.process_callback(req).await?;

    Ok(Json(CallbackResponse {
        message: "Callback processed".to_string(),
        step,
    }))
}
