//! Gymwatch collector binary.
//!
//! Performs exactly one collection run and exits. Scheduling (cron, a
//! systemd timer, a Kubernetes `CronJob`) is external; a failed run exits
//! non-zero and the next scheduled invocation is the retry.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `gymwatch.yaml` (or `GYMWATCH_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Validate the region polygon
//! 4. Connect to `PostgreSQL` and run migrations
//! 5. Run one collection
//! 6. Close the pool

mod error;

use std::process::ExitCode;

use gymwatch_core::logging::init_tracing;
use gymwatch_core::{CollectionReport, Collector, CollectorSettings, GymwatchConfig};
use gymwatch_db::PostgresPool;
use tracing::{error, info};

use crate::error::CollectorAppError;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(report) => {
            info!(
                total = report.sample.total,
                changes = report.changes_recorded,
                "gymwatch-collector finished"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "gymwatch-collector failed");
            eprintln!("gymwatch-collector: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<CollectionReport, CollectorAppError> {
    // 1. Load configuration.
    let config = GymwatchConfig::load()?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging).map_err(|e| CollectorAppError::Logging {
        message: e.to_string(),
    })?;
    info!("gymwatch-collector starting");

    // 3. Validate the region before touching the database.
    let fence = config.region.geofence()?;
    info!(
        region = fence.name(),
        retention_days = config.collector.retention_days,
        "Configuration loaded"
    );

    // 4. Connect and migrate.
    let pool = PostgresPool::connect(&config.database.postgres()?).await?;
    pool.run_migrations().await?;

    // 5. Collect.
    let settings = CollectorSettings::from(&config.collector);
    let result = Collector::new(&pool, &fence, settings)
        .collect_snapshot()
        .await;

    // 6. Close the pool whatever the outcome.
    pool.close().await;
    Ok(result?)
}
