//! services/quiz_service/src/bin/quiz_scheduler.rs
//!
//! Keeps quiz statuses in step with their open/close window until interrupted.

use quiz_core::{register_quiz_game, SystemClock};
use quiz_service::{
    adapters::db::DbAdapter, config::Config, error::ServiceError, scheduler::sync_statuses, QuizService,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ServiceError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting quiz scheduler...");

    register_quiz_game()?;

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Build the Service ---
    let service = QuizService::new(
        db_adapter.clone(),
        db_adapter.clone(),
        db_adapter.clone(),
        db_adapter,
        Arc::new(SystemClock),
    );

    // --- 4. Reconcile Until Shutdown ---
    let mut ticker = tokio::time::interval(Duration::from_secs(config.scheduler_interval_secs));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // A panicking pass is reported and the next tick tries again.
                let pass = service.clone();
                let outcome = tokio::spawn(async move { sync_statuses(&pass).await }).await;
                match outcome.map_err(ServiceError::from) {
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) => error!("Status synchronization failed: {}", e),
                    Err(e) => error!("Status synchronization aborted: {}", e),
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal?;
                info!("Shutdown signal received. Stopping quiz scheduler.");
                break;
            }
        }
    }

    Ok(())
}
