//! The snapshot collector.
//!
//! One call to [`Collector::collect_snapshot`] is one collection run:
//!
//! ```text
//! BEGIN
//!   pg_try_advisory_xact_lock(lock_key)     -- or fail with Busy
//!   read enabled gyms, keep in-region ones
//!   INSERT gym_history                      -- always, even for zero gyms
//!   read last known owners, diff
//!   INSERT gym_team_change                  -- first sightings + flips
//!   DELETE expired gym_history / gym_team_change
//! COMMIT
//! ```
//!
//! Any failure drops the transaction, which rolls every write back. There is
//! no retry here: the external scheduler's next invocation is the retry.
//!
//! Runs are at-least-once and not idempotent: two runs in quick succession
//! write two history rows. Only one run may be in flight per database. The
//! advisory lock turns an overlapping run into a fast [`CollectorError::Busy`]
//! instead of a racy diff, but the scheduler is still expected to run a
//! single instance.

use std::time::Duration;

use gymwatch_db::{ChangeStore, DbError, GymStore, HistoryStore, PostgresPool};
use gymwatch_types::{GymId, HistorySample, Team};

use crate::config::CollectorConfig;
use crate::ownership::{diff_ownership, tally};
use crate::region::{retain_in_region, RegionOracle};

/// Errors that fail a collection run. Nothing is committed when one occurs.
#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    /// A store operation failed.
    #[error("store error: {0}")]
    Db(#[from] DbError),

    /// Another run holds the collector lock.
    #[error("another collection run holds lock {lock_key}")]
    Busy {
        /// The contended advisory lock key.
        lock_key: i64,
    },

    /// The run exceeded its time budget.
    #[error("collection run exceeded {0:?}")]
    Timeout(Duration),
}

/// Outcome of a committed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionReport {
    /// The sample that was appended.
    pub sample: HistorySample,
    /// Change rows appended, first observations included.
    pub changes_recorded: usize,
    /// How many of those were first observations.
    pub first_observations: usize,
    /// Expired history rows removed.
    pub history_swept: u64,
    /// Expired change rows removed.
    pub changes_swept: u64,
}

/// Runtime settings of the collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectorSettings {
    /// Rows older than this many seconds are swept.
    pub retention_secs: i64,
    /// Advisory lock key.
    pub lock_key: i64,
    /// Upper bound for a whole run.
    pub run_timeout: Duration,
}

impl From<&CollectorConfig> for CollectorSettings {
    fn from(config: &CollectorConfig) -> Self {
        Self {
            retention_secs: config.retention_secs(),
            lock_key: config.lock_key,
            run_timeout: Duration::from_secs(config.run_timeout_secs),
        }
    }
}

/// Snapshot collector bound to a pool and a region.
pub struct Collector<'a, R: ?Sized> {
    pool: &'a PostgresPool,
    region: &'a R,
    settings: CollectorSettings,
}

impl<'a, R: RegionOracle + ?Sized> Collector<'a, R> {
    /// Create a collector.
    pub const fn new(pool: &'a PostgresPool, region: &'a R, settings: CollectorSettings) -> Self {
        Self {
            pool,
            region,
            settings,
        }
    }

    /// Run one collection at the current wall-clock second.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError`] if any step fails; nothing is committed.
    pub async fn collect_snapshot(&self) -> Result<CollectionReport, CollectorError> {
        self.collect_snapshot_at(chrono::Utc::now().timestamp()).await
    }

    /// Run one collection stamped with `now` (Unix seconds).
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError`] if any step fails; nothing is committed.
    pub async fn collect_snapshot_at(&self, now: i64) -> Result<CollectionReport, CollectorError> {
        let budget = self.settings.run_timeout;
        match tokio::time::timeout(budget, self.run(now)).await {
            Ok(result) => result,
            Err(_) => Err(CollectorError::Timeout(budget)),
        }
    }

    async fn run(&self, now: i64) -> Result<CollectionReport, CollectorError> {
        let mut tx = self.pool.begin().await?;

        let lock_key = self.settings.lock_key;
        if !ChangeStore::try_advisory_lock(&mut tx, lock_key).await? {
            return Err(CollectorError::Busy { lock_key });
        }

        // 1. Current state of in-region gyms.
        let rows = GymStore::fetch_enabled(&mut *tx).await?;
        let current: Vec<(GymId, Team)> = retain_in_region(rows, self.region)
            .iter()
            .map(|row| (row.gym_id(), row.team()))
            .collect();

        // 2. Aggregate sample, written even when no gyms were found.
        let sample = tally(current.iter().map(|(_, team)| team), now);
        HistoryStore::insert_sample(&mut tx, &sample).await?;

        // 3. Ownership diff against the change log.
        let last_known = ChangeStore::last_known_owners(&mut tx).await?;
        let changes = diff_ownership(&current, &last_known, now);
        ChangeStore::insert_events(&mut tx, &changes).await?;

        // 4. Retention.
        let cutoff = now.saturating_sub(self.settings.retention_secs);
        let history_swept = HistoryStore::delete_older_than(&mut tx, cutoff).await?;
        let changes_swept = ChangeStore::delete_older_than(&mut tx, cutoff).await?;

        tx.commit().await.map_err(DbError::from)?;

        let report = CollectionReport {
            sample,
            changes_recorded: changes.len(),
            first_observations: changes.iter().filter(|c| c.is_first_observation()).count(),
            history_swept,
            changes_swept,
        };

        tracing::info!(
            timestamp = now,
            mystic = sample.mystic,
            valor = sample.valor,
            instinct = sample.instinct,
            total = sample.total,
            changes = report.changes_recorded,
            first_observations = report.first_observations,
            history_swept,
            changes_swept,
            "Collection committed"
        );

        Ok(report)
    }
}
