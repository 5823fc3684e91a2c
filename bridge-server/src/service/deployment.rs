//! Deployment Service
//!
//! Business logic for deployment creation and provisioner callbacks.

use std::sync::{Arc, Mutex, PoisonError};

use bridge_core::domain::{Deployment, DeploymentStatus, DeploymentStep, StepName, aggregate};
use bridge_core::dto::callback::CallbackRequest;
use bridge_core::dto::deployment::CreateDeployment;
use tracing::{debug, info, warn};

use crate::provisioner::trigger::{self, ProvisionHandle};
use crate::provisioner::Provisioner;
use crate::service::locks::DeploymentLocks;
use crate::store::{DeploymentStore, NewDeployment, StoreError, StoreResult};

/// Service error type
#[derive(Debug, thiserror::Error)]
pub enum DeploymentError {
    #[error("{0}")]
    ValidationError(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    StoreError(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, DeploymentError>;

/// Deployment service
pub struct DeploymentService {
    store: Arc<dyn DeploymentStore>,
    provisioner: Arc<dyn Provisioner>,
    locks: DeploymentLocks,
    /// Provisioning runs that may still be in flight
    runs: Mutex<Vec<ProvisionHandle>>,
}

impl DeploymentService {
    pub fn new(store: Arc<dyn DeploymentStore>, provisioner: Arc<dyn Provisioner>) -> Self {
        Self {
            store,
            provisioner,
            locks: DeploymentLocks::new(),
            runs: Mutex::new(Vec::new()),
        }
    }

    /// Create a deployment with its pending steps and start provisioning
    ///
    /// Provisioning runs detached; the returned deployment carries no steps.
    pub async fn create_deployment(&self, req: CreateDeployment) -> Result<Deployment> {
        validate_create_request(&req)?;

        let new = NewDeployment {
            name: req.name,
            docker_image: req.docker_image,
            env_config: req.env_config.unwrap_or_default(),
            domain: req.domain,
        };

        let deployment = self.store.create_deployment(new, &StepName::ALL).await?;

        info!(
            deployment_id = deployment.id,
            "Deployment created: {} ({})", deployment.name, deployment.domain
        );

        // The outcome is only logged; the handle is kept for shutdown
        let handle = trigger::spawn(Arc::clone(&self.provisioner), deployment.clone());
        self.track_run(handle);

        Ok(deployment)
    }

    /// Aborts provisioning runs that are still in flight
    pub async fn shutdown(&self) {
        let runs = {
            let mut runs = self.runs.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *runs)
        };

        for run in runs.into_iter().filter(|run| !run.is_finished()) {
            info!(
                deployment_id = run.deployment_id(),
                "Aborting provisioning run on shutdown"
            );
            run.abort().await;
        }
    }

    fn track_run(&self, handle: ProvisionHandle) {
        let mut runs = self.runs.lock().unwrap_or_else(PoisonError::into_inner);
        runs.retain(|run| !run.is_finished());
        runs.push(handle);
    }

    #[cfg(test)]
    fn tracked_runs(&self) -> usize {
        self.runs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// List all deployments with their steps
    pub async fn list_deployments(&self) -> Result<Vec<Deployment>> {
        let deployments = self.store.list_deployments().await?;
        Ok(deployments)
    }

    /// Get a deployment with its steps
    pub async fn get_deployment(&self, id: i64) -> Result<Deployment> {
        let deployment = self
            .store
            .get_deployment(id)
            .await?
            .ok_or_else(|| DeploymentError::NotFound(format!("Deployment {} not found", id)))?;

        Ok(deployment)
    }

    /// Get the steps of a deployment (empty for unknown ids)
    pub async fn get_steps(&self, deployment_id: i64) -> Result<Vec<DeploymentStep>> {
        let steps = self.store.list_steps(deployment_id).await?;
        Ok(steps)
    }

    /// Apply a step status report and recompute the deployment status
    ///
    /// Once the step is stored the callback succeeds, even if the deployment
    /// status cannot be refreshed afterwards.
    pub async fn process_callback(&self, req: CallbackRequest) -> Result<DeploymentStep> {
        validate_callback_request(&req)?;

        let _guard = self.locks.lock(req.deployment_id).await;

        let mut step = self
            .store
            .find_step(req.deployment_id, &req.step_name)
            .await?
            .ok_or_else(|| {
                DeploymentError::NotFound(format!(
                    "Step {} of deployment {} not found",
                    req.step_name, req.deployment_id
                ))
            })?;

        step.apply_status(
            req.status,
            req.message.unwrap_or_default(),
            chrono::Utc::now(),
        );
        self.store.update_step(&step).await?;

        info!(
            deployment_id = req.deployment_id,
            step = %step.step_name,
            status = %step.status,
            "Step updated"
        );

        if let Err(e) = self.refresh_deployment_status(req.deployment_id).await {
            warn!(
                deployment_id = req.deployment_id,
                error = %e,
                "Failed to refresh deployment status after step update"
            );
        }

        Ok(step)
    }

    /// Recompute a deployment's status from a fresh read of its steps
    async fn refresh_deployment_status(
        &self,
        deployment_id: i64,
    ) -> StoreResult<Option<DeploymentStatus>> {
        let Some(deployment) = self.store.get_deployment(deployment_id).await? else {
            warn!(deployment_id, "Deployment vanished while processing callback");
            return Ok(None);
        };

        let Some(status) = aggregate(&deployment.steps) else {
            debug!(
                deployment_id,
                "No aggregation rule applies, keeping status {}", deployment.status
            );
            return Ok(None);
        };

        self.store
            .update_deployment_status(deployment_id, status)
            .await?;

        if status != deployment.status {
            info!(
                deployment_id,
                "Deployment status changed: {} -> {}", deployment.status, status
            );
        }

        Ok(Some(status))
    }
}

// =============================================================================
// Validation
// =============================================================================

fn validate_create_request(req: &CreateDeployment) -> Result<()> {
    let required = [
        ("name", &req.name),
        ("docker_image", &req.docker_image),
        ("domain", &req.domain),
    ];

    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(DeploymentError::ValidationError(format!(
                "{} is required",
                field
            )));
        }
    }

    Ok(())
}

fn validate_callback_request(req: &CallbackRequest) -> Result<()> {
    if req.deployment_id <= 0 {
        return Err(DeploymentError::ValidationError(
            "deployment_id is required".to_string(),
        ));
    }

    if req.step_name.trim().is_empty() {
        return Err(DeploymentError::ValidationError(
            "step_name is required".to_string(),
        ));
    }

    if req.status.as_str().trim().is_empty() {
        return Err(DeploymentError::ValidationError(
            "status is required".to_string(),
        ));
    }

    Ok(())
}
