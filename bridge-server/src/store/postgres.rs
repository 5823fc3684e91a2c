//! PostgreSQL Store
//!
//! Handles all database operations for deployments and their steps.

use std::collections::HashMap;

use async_trait::async_trait;
use bridge_core::domain::{Deployment, DeploymentStatus, DeploymentStep, StepName, StepStatus};
use sqlx::PgPool;

use super::{DeploymentStore, NewDeployment, StoreResult};

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wraps a pool whose schema has already been migrated
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn attach_steps(&self, deployments: &mut [Deployment]) -> StoreResult<()> {
        if deployments.is_empty() {
            return Ok(());
        }

        let ids: Vec<i64> = deployments.iter().map(|d| d.id).collect();

        let rows = sqlx::query_as::<_, StepRow>(
            r#"
            SELECT id, deployment_id, step_name, status, message,
                   started_at, completed_at, created_at, updated_at
            FROM deployment_steps
            WHERE deployment_id = ANY($1)
            ORDER BY id ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_deployment: HashMap<i64, Vec<DeploymentStep>> = HashMap::new();
        for row in rows {
            by_deployment
                .entry(row.deployment_id)
                .or_default()
                .push(row.into());
        }

        for deployment in deployments.iter_mut() {
            deployment.steps = by_deployment.remove(&deployment.id).unwrap_or_default();
        }

        Ok(())
    }
}

#[async_trait]
impl DeploymentStore for PgStore {
    async fn create_deployment(
        &self,
        new: NewDeployment,
        steps: &[StepName],
    ) -> StoreResult<Deployment> {
        let now = chrono::Utc::now();
        let status = DeploymentStatus::Pending;

        // Rolled back on drop unless committed
        let mut tx = self.pool.begin().await?;

        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO deployments (name, status, docker_image, env_config, domain, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING id
            "#,
        )
        .bind(&new.name)
        .bind(status.as_str())
        .bind(&new.docker_image)
        .bind(&new.env_config)
        .bind(&new.domain)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        for step in steps {
            sqlx::query(
                r#"
                INSERT INTO deployment_steps (deployment_id, step_name, status, message, created_at, updated_at)
                VALUES ($1, $2, $3, '', $4, $4)
                "#,
            )
            .bind(id)
            .bind(step.as_str())
            .bind(StepStatus::Pending.as_str())
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(Deployment {
            id,
            name: new.name,
            status,
            docker_image: new.docker_image,
            env_config: new.env_config,
            domain: new.domain,
            created_at: now,
            updated_at: now,
            steps: Vec::new(),
        })
    }

    async fn list_deployments(&self) -> StoreResult<Vec<Deployment>> {
        let rows = sqlx::query_as::<_, DeploymentRow>(
            r#"
            SELECT id, name, status, docker_image, env_config, domain, created_at, updated_at
            FROM deployments
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut deployments: Vec<Deployment> = rows.into_iter().map(|r| r.into()).collect();
        self.attach_steps(&mut deployments).await?;

        Ok(deployments)
    }

    async fn get_deployment(&self, id: i64) -> StoreResult<Option<Deployment>> {
        let row = sqlx::query_as::<_, DeploymentRow>(
            r#"
            SELECT id, name, status, docker_image, env_config, domain, created_at, updated_at
            FROM deployments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut deployment: Deployment = row.into();
        deployment.steps = self.list_steps(id).await?;

        Ok(Some(deployment))
    }

    async fn list_steps(&self, deployment_id: i64) -> StoreResult<Vec<DeploymentStep>> {
        let rows = sqlx::query_as::<_, StepRow>(
            r#"
            SELECT id, deployment_id, step_name, status, message,
                   started_at, completed_at, created_at, updated_at
            FROM deployment_steps
            WHERE deployment_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(deployment_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn find_step(
        &self,
        deployment_id: i64,
        step_name: &str,
    ) -> StoreResult<Option<DeploymentStep>> {
        let row = sqlx::query_as::<_, StepRow>(
            r#"
            SELECT id, deployment_id, step_name, status, message,
                   started_at, completed_at, created_at, updated_at
            FROM deployment_steps
            WHERE deployment_id = $1 AND step_name = $2
            ORDER BY id ASC
            LIMIT 1
            "#,
        )
        .bind(deployment_id)
        .bind(step_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into()))
    }

    async fn update_step(&self, step: &DeploymentStep) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE deployment_steps
            SET status = $1, message = $2, started_at = $3, completed_at = $4, updated_at = $5
            WHERE id = $6
            "#,
        )
        .bind(step.status.as_str())
        .bind(&step.message)
        .bind(step.started_at)
        .bind(step.completed_at)
        .bind(step.updated_at)
        .bind(step.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_deployment_status(
        &self,
        id: i64,
        status: DeploymentStatus,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE deployments
            SET status = $1, updated_at = $2
            WHERE id = $3
            "#,
        )
        .bind(status.as_str())
        .bind(chrono::Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct DeploymentRow {
    id: i64,
    name: String,
    status: String,
    docker_image: String,
    env_config: String,
    domain: String,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<DeploymentRow> for Deployment {
    fn from(row: DeploymentRow) -> Self {
        Deployment {
            id: row.id,
            name: row.name,
            status: DeploymentStatus::parse(&row.status).unwrap_or_default(),
            docker_image: row.docker_image,
            env_config: row.env_config,
            domain: row.domain,
            created_at: row.created_at,
            updated_at: row.updated_at,
            steps: Vec::new(),
        }
    }
}

#[derive(sqlx::FromRow)]
struct StepRow {
    id: i64,
    deployment_id: i64,
    step_name: String,
    status: String,
    message: String,
    started_at: Option<chrono::DateTime<chrono::Utc>>,
    completed_at: Option<chrono::DateTime<chrono::Utc>>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<StepRow> for DeploymentStep {
    fn from(row: StepRow) -> Self {
        DeploymentStep {
            id: row.id,
            deployment_id: row.deployment_id,
            step_name: row.step_name,
            status: StepStatus::from(row.status),
            message: row.message,
            started_at: row.started_at,
            completed_at: row.completed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
