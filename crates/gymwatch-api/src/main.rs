//! Gymwatch API server binary.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `gymwatch.yaml` (or `GYMWATCH_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Build a lazily connecting pool, so the server comes up (and serves
//!    empty results) while the database is unreachable
//! 4. Serve until `Ctrl-C`

use std::sync::Arc;
use std::time::Duration;

use gymwatch_api::{start_server, AppState, ServerConfig};
use gymwatch_core::logging::init_tracing;
use gymwatch_core::{GymwatchConfig, QueryService};
use gymwatch_db::PostgresPool;
use tracing::info;

/// Any startup or serve failure. `Send + Sync` so the boxed logging init
/// error converts with `?`.
type MainError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), MainError> {
    // 1. Load configuration.
    let config = GymwatchConfig::load()?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging)?;
    info!(region = config.region.name, "gymwatch-api starting");

    if let Err(e) = config.region.geofence() {
        tracing::warn!(error = %e, "Region is unusable; gym and defender endpoints will be empty");
    }

    // 3. Database pool.
    let pool = PostgresPool::connect_lazy(&config.database.postgres()?)?;
    let query = QueryService::new(
        pool.clone(),
        config.region.clone(),
        Duration::from_millis(config.query.timeout_ms),
    );

    // 4. Serve.
    let state = Arc::new(AppState::new(query));
    start_server(&ServerConfig::from(&config.api), state).await?;

    pool.close().await;
    Ok(())
}
