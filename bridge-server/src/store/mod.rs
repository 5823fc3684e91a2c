//! Store Module
//!
//! Persistence for deployments and their steps. PostgreSQL is the
//! production backend; the in-memory store backs tests and local runs.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use bridge_core::domain::{Deployment, DeploymentStatus, DeploymentStep, StepName};

/// Store error type
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store error: {0}")]
    Internal(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Caller-supplied fields of a new deployment
#[derive(Debug, Clone)]
pub struct NewDeployment {
    pub name: String,
    pub docker_image: String,
    pub env_config: String,
    pub domain: String,
}

/// Backend for deployment and step records
#[async_trait]
pub trait DeploymentStore: Send + Sync {
    /// Inserts a pending deployment and one pending step per name, atomically.
    ///
    /// The returned deployment has no steps attached.
    async fn create_deployment(
        &self,
        deployment: NewDeployment,
        steps: &[StepName],
    ) -> StoreResult<Deployment>;

    /// All deployments, newest first, with steps attached
    async fn list_deployments(&self) -> StoreResult<Vec<Deployment>>;

    /// A deployment with its steps, or `None`
    async fn get_deployment(&self, id: i64) -> StoreResult<Option<Deployment>>;

    /// Steps of a deployment in seeding order
    async fn list_steps(&self, deployment_id: i64) -> StoreResult<Vec<DeploymentStep>>;

    /// First step matching the deployment and name, in store order
    async fn find_step(
        &self,
        deployment_id: i64,
        step_name: &str,
    ) -> StoreResult<Option<DeploymentStep>>;

    /// Persists status, message and timestamps of an existing step
    async fn update_step(&self, step: &DeploymentStep) -> StoreResult<()>;

    /// Persists a deployment's derived status
    async fn update_deployment_status(&self, id: i64, status: DeploymentStatus)
    -> StoreResult<()>;
}
