use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use rand::{rngs::StdRng, SeedableRng};

use cinerank::{
    config::{Config, StorageBackend},
    db::{create_pool, InMemoryStore, PgStore},
    seed::{seed_catalog, SeedPlan},
    services::Catalog,
};

/// Fill a cinerank database with demo movies, users and reviews
#[derive(Parser)]
#[command(name = "cinerank-seed")]
#[command(about = "Seeds the configured store with demo data", long_about = None)]
struct Cli {
    /// Number of movies to create
    #[arg(long, default_value = "40")]
    movies: usize,

    /// Number of users to create
    #[arg(long, default_value = "12")]
    users: usize,

    /// Number of reviews to create, at most one per user and movie
    #[arg(long, default_value = "150")]
    reviews: usize,

    /// Fixed RNG seed for a reproducible data set
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("cinerank=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let catalog = match config.storage_backend {
        StorageBackend::Postgres => {
            let pool = create_pool(&config.database_url, config.max_connections)
                .await
                .context("Failed to connect to database")?;
            let store = Arc::new(PgStore::new(pool));
            store.migrate().await.context("Failed to run migrations")?;
            Catalog::new(store.clone(), store.clone(), store)
        }
        StorageBackend::Memory => {
            tracing::warn!("Seeding in-memory storage, the data is discarded on exit");
            let store = Arc::new(InMemoryStore::new());
            Catalog::new(store.clone(), store.clone(), store)
        }
    };

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let plan = SeedPlan {
        movies: cli.movies,
        users: cli.users,
        reviews: cli.reviews,
    };

    let summary = seed_catalog(&catalog, plan, &mut rng)
        .await
        .context("Failed to seed catalog")?;
    println!(
        "Created {} movies, {} users and {} reviews",
        summary.movies, summary.users, summary.reviews
    );

    Ok(())
}
