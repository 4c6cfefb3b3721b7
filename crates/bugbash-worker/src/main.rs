use std::sync::Arc;

use anyhow::{Context, Result};
use bugbash_storage::Database;
use bugbash_worker::{PollScheduler, PollerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bugbash_worker=debug,bugbash_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("bugbash-worker starting...");

    let config = PollerConfig::from_env()?;
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let db = Database::from_url(&database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    if std::env::var("RUN_MIGRATIONS").map_or(true, |v| v != "false") {
        db.migrate().await.context("Failed to run migrations")?;
        tracing::info!("Migrations applied");
    }

    let db = Arc::new(db);
    let scheduler = PollScheduler::new(config, db.clone(), db.clone(), db);
    let mut supervision = scheduler.start().await?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
                break;
            }
            failure = supervision.errors.recv() => match failure {
                Some(failure) => tracing::warn!(
                    record_id = ?failure.record_id,
                    error = %failure.error,
                    "Fix event not scored"
                ),
                None => {
                    tracing::error!("Poller exited unexpectedly");
                    break;
                }
            },
        }
    }

    scheduler.stop().await;
    tracing::info!("Worker shutdown complete");
    Ok(())
}
