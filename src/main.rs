use std::sync::Arc;

use anyhow::Context;
use rand::{rngs::StdRng, SeedableRng};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cinerank::{
    config::{Config, StorageBackend},
    db::{create_pool, InMemoryStore, PgStore},
    routes::{create_router, AppState},
    seed::{seed_catalog, SeedPlan},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cinerank=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let state = match config.storage_backend {
        StorageBackend::Postgres => {
            if config.seed_demo_data {
                tracing::warn!("SEED_DEMO_DATA only applies to the memory backend, use the seed binary");
            }
            let pool = create_pool(&config.database_url, config.max_connections)
                .await
                .context("Failed to connect to database")?;
            let store = PgStore::new(pool);
            store.migrate().await.context("Failed to run migrations")?;
            tracing::info!("Database migrations applied");
            AppState::from_store(store, config.catalog_scan_limit)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, data is lost on shutdown");
            let state = AppState::from_store(InMemoryStore::new(), config.catalog_scan_limit);
            if config.seed_demo_data {
                seed_catalog(&state.catalog, SeedPlan::default(), &mut StdRng::from_entropy())
                    .await
                    .context("Failed to seed demo data")?;
            }
            state
        }
    };

    let app = create_router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!("Server running on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
