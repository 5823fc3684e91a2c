use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    // Create deployments table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS deployments (
            id BIGSERIAL PRIMARY KEY,
            name TEXT NOT NULL,
            status VARCHAR(50) NOT NULL DEFAULT 'pending',
            docker_image TEXT NOT NULL,
            env_config TEXT NOT NULL DEFAULT '',
            domain TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create deployment steps table; status is free text since callbacks
    // may report values outside the known set
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS deployment_steps (
            id BIGSERIAL PRIMARY KEY,
            deployment_id BIGINT NOT NULL REFERENCES deployments(id) ON DELETE CASCADE,
            step_name VARCHAR(64) NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            message TEXT NOT NULL DEFAULT '',
            started_at TIMESTAMPTZ,
            completed_at TIMESTAMPTZ,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_deployments_created_at ON deployments(created_at DESC)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_deployment_steps_lookup ON deployment_steps(deployment_id, step_name)",
    )
    .execute(pool)
    .await?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}
