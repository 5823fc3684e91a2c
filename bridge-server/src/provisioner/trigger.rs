//! Detached provisioning task
//!
//! The request path spawns provisioning and returns immediately. The handle
//! is the completion signal and the way to cancel a run.

use std::sync::Arc;

use bridge_core::domain::Deployment;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::{ProvisionError, ProvisionOutcome, Provisioner};

/// Handle to a running provisioning task
///
/// Dropping the handle detaches the task; it keeps running.
pub struct ProvisionHandle {
    deployment: Deployment,
    provisioner: Arc<dyn Provisioner>,
    task: JoinHandle<Result<ProvisionOutcome, ProvisionError>>,
}

impl ProvisionHandle {
    pub fn deployment_id(&self) -> i64 {
        self.deployment.id
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the run to finish
    #[cfg(test)]
    pub async fn wait(self) -> Result<ProvisionOutcome, ProvisionError> {
        self.task.await.expect("provisioning task panicked")
    }

    /// Cancels the run and lets the provisioner clean up after it
    ///
    /// The local child process is killed when the task is dropped; anything
    /// it started outside this process is left to [`Provisioner::cleanup`].
    pub async fn abort(self) {
        let deployment_id = self.deployment.id;
        self.task.abort();

        match self.task.await {
            Ok(_) => debug!(deployment_id, "Provisioner finished before abort"),
            Err(e) if e.is_cancelled() => {
                info!(deployment_id, "Provisioner aborted");
                self.provisioner.cleanup(&self.deployment).await;
            }
            Err(e) => error!(deployment_id, error = %e, "Provisioner task panicked"),
        }
    }
}

/// Starts provisioning for a deployment on a background task
pub fn spawn(provisioner: Arc<dyn Provisioner>, deployment: Deployment) -> ProvisionHandle {
    let deployment_id = deployment.id;
    let run_provisioner = Arc::clone(&provisioner);
    let run_deployment = deployment.clone();

    let task = tokio::spawn(async move {
        info!(deployment_id, "Starting provisioner");

        let result = run_provisioner.provision(&run_deployment).await;

        match &result {
            Ok(outcome) => {
                info!(
                    deployment_id,
                    elapsed = ?outcome.elapsed,
                    "Provisioner finished"
                );
                debug!(deployment_id, "Provisioner output:\n{}", outcome.output);
            }
            Err(ProvisionError::Failed { code, output }) => error!(
                deployment_id,
                code = ?code,
                "Provisioner failed\noutput: {}",
                output
            ),
            Err(e) => error!(deployment_id, error = %e, "Provisioner failed"),
        }

        result
    });

    ProvisionHandle {
        deployment,
        provisioner,
        task,
    }
}
