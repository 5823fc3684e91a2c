//! In-memory store
//!
//! Data is lost when the process exits. Used by tests and by
//! `BRIDGE_STORE=memory` for local runs without PostgreSQL.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use bridge_core::domain::{Deployment, DeploymentStatus, DeploymentStep, StepName, StepStatus};

use super::{DeploymentStore, NewDeployment, StoreError, StoreResult};

#[derive(Debug, Default)]
struct Tables {
    next_deployment_id: i64,
    next_step_id: i64,
    /// Deployments without their steps
    deployments: BTreeMap<i64, Deployment>,
    steps: BTreeMap<i64, DeploymentStep>,
}

impl Tables {
    fn steps_of(&self, deployment_id: i64) -> Vec<DeploymentStep> {
        self.steps
            .values()
            .filter(|s| s.deployment_id == deployment_id)
            .cloned()
            .collect()
    }

    fn with_steps(&self, deployment: &Deployment) -> Deployment {
        let mut deployment = deployment.clone();
        deployment.steps = self.steps_of(deployment.id);
        deployment
    }
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StoreError::Internal("lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<std::sync::RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StoreError::Internal("lock poisoned".to_string()))
    }
}

#[async_trait]
impl DeploymentStore for MemoryStore {
    async fn create_deployment(
        &self,
        new: NewDeployment,
        steps: &[StepName],
    ) -> StoreResult<Deployment> {
        let now = chrono::Utc::now();
        let mut tables = self.write()?;

        tables.next_deployment_id += 1;
        let id = tables.next_deployment_id;

        let deployment = Deployment {
            id,
            name: new.name,
            status: DeploymentStatus::Pending,
            docker_image: new.docker_image,
            env_config: new.env_config,
            domain: new.domain,
            created_at: now,
            updated_at: now,
            steps: Vec::new(),
        };

        for name in steps {
            tables.next_step_id += 1;
            let step_id = tables.next_step_id;
            tables.steps.insert(
                step_id,
                DeploymentStep {
                    id: step_id,
                    deployment_id: id,
                    step_name: name.to_string(),
                    status: StepStatus::Pending,
                    message: String::new(),
                    started_at: None,
                    completed_at: None,
                    created_at: now,
                    updated_at: now,
                },
            );
        }

        tables.deployments.insert(id, deployment.clone());

        Ok(deployment)
    }

    async fn list_deployments(&self) -> StoreResult<Vec<Deployment>> {
        let tables = self.read()?;

        // Ids are assigned in creation order, so reverse id order is newest first
        Ok(tables
            .deployments
            .values()
            .rev()
            .map(|d| tables.with_steps(d))
            .collect())
    }

    async fn get_deployment(&self, id: i64) -> StoreResult<Option<Deployment>> {
        let tables = self.read()?;
        Ok(tables.deployments.get(&id).map(|d| tables.with_steps(d)))
    }

    async fn list_steps(&self, deployment_id: i64) -> StoreResult<Vec<DeploymentStep>> {
        Ok(self.read()?.steps_of(deployment_id))
    }

    async fn find_step(
        &self,
        deployment_id: i64,
        step_name: &str,
    ) -> StoreResult<Option<DeploymentStep>> {
        let tables = self.read()?;
        Ok(tables
            .steps
            .values()
            .find(|s| s.deployment_id == deployment_id && s.step_name == step_name)
            .cloned())
    }

    async fn update_step(&self, step: &DeploymentStep) -> StoreResult<()> {
        let mut tables = self.write()?;

        // Matches UPDATE semantics: a missing row is not an error
        if let Some(stored) = tables.steps.get_mut(&step.id) {
            stored.status = step.status.clone();
            stored.message = step.message.clone();
            stored.started_at = step.started_at;
            stored.completed_at = step.completed_at;
            stored.updated_at = step.updated_at;
        }

        Ok(())
    }

    async fn update_deployment_status(
        &self,
        id: i64,
        status: DeploymentStatus,
    ) -> StoreResult<()> {
        let mut tables = self.write()?;

        if let Some(deployment) = tables.deployments.get_mut(&id) {
            deployment.status = status;
            deployment.updated_at = chrono::Utc::now();
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_deployment(name: &str) -> NewDeployment {
        NewDeployment {
            name: name.to_string(),
            docker_image: "img:1".to_string(),
            env_config: String::new(),
            domain: format!("{}.example.com", name),
        }
    }

    #[tokio::test]
    async fn test_create_seeds_steps_in_order() {
        let store = MemoryStore::new();
        let created = store
            .create_deployment(new_deployment("api"), &StepName::ALL)
            .await
            .unwrap();

        assert!(created.steps.is_empty());

        let steps = store.list_steps(created.id).await.unwrap();
        let names: Vec<&str> = steps.iter().map(|s| s.step_name.as_str()).collect();
        assert_eq!(
            names,
            vec!["route53", "load_balancer", "k8s_service", "ingress", "domain_mapping"]
        );
        assert!(steps.iter().all(|s| s.status == StepStatus::Pending));
    }

    #[tokio::test]
    async fn test_list_newest_first_with_steps() {
        let store = MemoryStore::new();
        let first = store
            .create_deployment(new_deployment("first"), &StepName::ALL)
            .await
            .unwrap();
        let second = store
            .create_deployment(new_deployment("second"), &StepName::ALL)
            .await
            .unwrap();

        let all = store.list_deployments().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second.id);
        assert_eq!(all[1].id, first.id);
        assert!(all.iter().all(|d| d.steps.len() == 5));
    }

    #[tokio::test]
    async fn test_find_and_update_step() {
        let store = MemoryStore::new();
        let deployment = store
            .create_deployment(new_deployment("api"), &StepName::ALL)
            .await
            .unwrap();

        let mut step = store
            .find_step(deployment.id, "ingress")
            .await
            .unwrap()
            .unwrap();
        step.status = StepStatus::Running;
        step.message = "applying".to_string();
        store.update_step(&step).await.unwrap();

        let reloaded = store
            .find_step(deployment.id, "ingress")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.status, StepStatus::Running);
        assert_eq!(reloaded.message, "applying");

        assert!(store.find_step(deployment.id, "dns").await.unwrap().is_none());
        assert!(store.find_step(deployment.id + 1, "ingress").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_deployment_status() {
        let store = MemoryStore::new();
        let deployment = store
            .create_deployment(new_deployment("api"), &StepName::ALL)
            .await
            .unwrap();

        store
            .update_deployment_status(deployment.id, DeploymentStatus::Running)
            .await
            .unwrap();

        let reloaded = store.get_deployment(deployment.id).await.unwrap().unwrap();
        assert_eq!(reloaded.status, DeploymentStatus::Running);
        assert!(store.get_deployment(999).await.unwrap().is_none());
    }
}
