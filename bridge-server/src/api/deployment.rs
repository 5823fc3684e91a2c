//! Deployment API Handlers
//!
//! HTTP endpoints for creating and inspecting deployments.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use bridge_core::dto::deployment::{
    CreateDeployment, CreateDeploymentResponse, DeploymentList, DeploymentResponse, StepList,
};

use crate::api::error::{ApiResult, parse_id};
use crate::service::DeploymentService;

/// POST /api/v1/deployments
/// Create a deployment and start provisioning
pub async fn create_deployment(
    State(service): State<Arc<DeploymentService>>,
    payload: Result<Json<CreateDeployment>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CreateDeploymentResponse>)> {
    let Json(req) = payload?;
    tracing::info!("Creating deployment: {}", req.name);

    let deployment = service.create_deployment(req).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateDeploymentResponse {
            message: "Deployment started".to_string(),
            deployment,
        }),
    ))
}

/// GET /api/v1/deployments
/// List all deployments with their steps
pub async fn list_deployments(
    State(service): State<Arc<DeploymentService>>,
) -> ApiResult<Json<DeploymentList>> {
    tracing::debug!("Listing all deployments");

    let deployments = service.list_deployments().await?;

    Ok(Json(DeploymentList { deployments }))
}

/// GET /api/v1/deployments/{id}
/// Get a deployment with its steps
pub async fn get_deployment(
    State(service): State<Arc<DeploymentService>>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeploymentResponse>> {
    let id = parse_id(&id)?;
    tracing::debug!("Getting deployment: {}", id);

    let deployment = service.get_deployment(id).await?;

    Ok(Json(DeploymentResponse { deployment }))
}

/// GET /api/v1/deployments/{id}/steps
/// List the steps of a deployment
pub async fn get_deployment_steps(
    State(service): State<Arc<DeploymentService>>,
    Path(id): Path<String>,
) -> ApiResult<Json<StepList>> {
    let id = parse_id(&id)?;
    tracing::debug!("Getting steps for deployment: {}", id);

    let steps = service.get_steps(id).await?;

    Ok(Json(StepList { steps }))
}
