//! Provisioner Module
//!
//! Launches the external provisioning run for a deployment. The run reports
//! progress back through the callback endpoint; its own result is only
//! logged and never written to the store.

mod docker;
pub mod trigger;

pub use docker::DockerProvisioner;

use std::time::Duration;

use async_trait::async_trait;
use bridge_core::domain::Deployment;

/// Result of a finished provisioning run
#[derive(Debug, Clone)]
pub struct ProvisionOutcome {
    /// Combined stdout and stderr of the run
    pub output: String,
    pub elapsed: Duration,
}

/// Provisioning failure. Logged only.
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("provisioner is not configured: {0} is not set")]
    NotConfigured(&'static str),

    #[error("failed to launch provisioner: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("provisioner exited with code {code:?}")]
    Failed { code: Option<i32>, output: String },

    #[error("provisioner timed out after {0:?}")]
    Timeout(Duration),
}

/// Launches provisioning for a deployment
#[async_trait]
pub trait Provisioner: Send + Sync {
    /// Runs provisioning to completion (or failure)
    async fn provision(&self, deployment: &Deployment) -> Result<ProvisionOutcome, ProvisionError>;

    /// Releases whatever a cancelled run left behind
    async fn cleanup(&self, _deployment: &Deployment) {}
}
