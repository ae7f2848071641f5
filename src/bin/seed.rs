// src/bin/seed.rs
use anyhow::Context;
use dotenvy::dotenv;
use envconfig::Envconfig;
use tracing::info;

use threads_server::config::{Config, StorageBackend};
use threads_server::store::PgStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "threads_server=info,seed=info".into()),
        )
        .init();

    let config = Config::init_from_env().context("Failed to read configuration")?;
    if config.storage_backend != StorageBackend::Postgres {
        anyhow::bail!("Seeding needs STORAGE_BACKEND=postgres; the memory store does not outlive this process");
    }

    info!("Starting database seeding...");
    let store = PgStore::connect(&config.database_url, 1)
        .await
        .context("Failed to connect to database")?;
    store.migrate().await.context("Failed to run migrations")?;

    // Run the shared seeder logic
    threads_server::seeder::seed_database(&store).await?;
    Ok(())
}
