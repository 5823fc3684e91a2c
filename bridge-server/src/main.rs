use std::sync::Arc;

use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod api;
pub mod config;
pub mod db;
pub mod provisioner;
pub mod service;
pub mod store;

use config::{Config, StoreKind};
use provisioner::DockerProvisioner;
use service::DeploymentService;
use store::{DeploymentStore, MemoryStore, PgStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bridge_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Bridge Server...");

    let config = Config::from_env()?;
    config.validate()?;

    let store: Arc<dyn DeploymentStore> = match config.store {
        StoreKind::Postgres => {
            tracing::info!("Connecting to database...");

            let pool = db::create_pool(&config.database_url).await?;

            tracing::info!("Database connection pool created");

            db::run_migrations(&pool).await?;

            Arc::new(PgStore::new(pool))
        }
        StoreKind::Memory => {
            tracing::warn!("Using in-memory store; deployments are lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    if config.provisioner.workspace_dir.is_none() {
        tracing::warn!("PROVISIONER_WORKSPACE_DIR is not set; provisioning runs will be refused");
    }

    let provisioner = Arc::new(DockerProvisioner::new(config.provisioner.clone()));
    let service = Arc::new(DeploymentService::new(store, provisioner));

    // Build router with all API endpoints
    let app = api::create_router(Arc::clone(&service));

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    service.shutdown().await;
    tracing::info!("Bridge Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
