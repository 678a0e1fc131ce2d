//! Accounts API Server
//!
//! REST API server for login and user account management.

use std::sync::Arc;

use accounts_api::{create_router, state::AppState};
use accounts_core::{AppConfig, LoggingConfig, MemoryUserStore, PgUserStore, StoreBackend, UserStore};
use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Configuration is read once; a missing secret aborts startup
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.logging);
    config.validate().context("Invalid configuration")?;

    let store = connect_store(&config).await?;
    let addr = config.bind_address();
    let bootstrap_admin = config.auth.bootstrap_admin.clone();

    let state = Arc::new(AppState::new(config, store).context("Failed to initialize auth")?);

    if let Some(admin) = bootstrap_admin {
        match state.auth.ensure_bootstrap_admin(&admin).await {
            Ok(Some(id)) => tracing::info!(user_id = %id, username = %admin.username, "Bootstrap admin created"),
            Ok(None) => {}
            Err(e) => anyhow::bail!("Failed to create bootstrap admin: {e}"),
        }
    }

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Accounts API Server starting on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);
    tracing::info!("OpenAPI document at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let registry = tracing_subscriber::registry().with(filter);

    if logging.json_format {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn connect_store(config: &AppConfig) -> anyhow::Result<Arc<dyn UserStore>> {
    match config.database.backend {
        StoreBackend::Postgres => {
            let store = PgUserStore::connect(
                &config.database.postgres_url,
                config.database.pool_size,
            )
            .await
            .context("Credential store unreachable")?;
            store.migrate().await.context("Failed to prepare users table")?;
            tracing::info!("Connected to PostgreSQL credential store");
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory credential store; accounts are lost on restart");
            Ok(Arc::new(MemoryUserStore::new()))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
