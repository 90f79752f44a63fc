//! The read-side query layer.
//!
//! [`QueryService`] backs the three read operations. None of them ever
//! returns an error to its caller: configuration problems, store failures
//! and timeouts are logged and the operation's empty shape is served
//! instead, because consumers render these payloads directly.
//!
//! Nothing is cached; every call recomputes from the store.

use std::future::Future;
use std::time::Duration;

use gymwatch_db::{ChangeStore, DbError, GymRow, GymStore, HistoryStore, PostgresPool};
use gymwatch_types::{
    CurrentCounts, DefenderComposition, GymSnapshotEntry, GymsSnapshot, HistoryResponse, Period,
    Team,
};

use crate::buckets::bucket_samples;
use crate::config::{ConfigError, RegionConfig};
use crate::contested::{
    assemble, rank_contested, recent_transitions, ChangeTally, CONTESTED_LIMIT,
    RECENT_CHANGES_LIMIT,
};
use crate::defenders::{compose, parse_defenders};
use crate::region::retain_in_region;

/// Errors absorbed by the query layer.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// A store operation failed.
    #[error("store error: {0}")]
    Db(#[from] DbError),

    /// The configured region is unusable.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The operation exceeded its time budget.
    #[error("query exceeded {0:?}")]
    Timeout(Duration),
}

/// Read operations over the shared store.
#[derive(Clone)]
pub struct QueryService {
    pool: PostgresPool,
    region: RegionConfig,
    timeout: Duration,
}

impl QueryService {
    /// Create a query service.
    pub const fn new(pool: PostgresPool, region: RegionConfig, timeout: Duration) -> Self {
        Self {
            pool,
            region,
            timeout,
        }
    }

    // =========================================================================
    // Public operations (never fail)
    // =========================================================================

    /// History chart, contested gyms and current counts for a period key.
    ///
    /// Unknown keys are served as `24h`.
    pub async fn get_history(&self, period_key: &str) -> HistoryResponse {
        let period = Period::parse(period_key);
        let now = chrono::Utc::now().timestamp();
        self.absorb("history", self.try_history(period, now))
            .await
            .unwrap_or_else(|| HistoryResponse::empty(period))
    }

    /// Enabled in-region gyms grouped by owning faction.
    pub async fn get_gyms_snapshot(&self) -> GymsSnapshot {
        self.absorb("gyms_snapshot", self.try_gyms_snapshot())
            .await
            .unwrap_or_default()
    }

    /// Per-faction defender statistics.
    pub async fn get_defender_composition(&self) -> DefenderComposition {
        let now = chrono::Utc::now().timestamp();
        self.absorb("defender_composition", self.try_defender_composition(now))
            .await
            .unwrap_or_default()
    }

    async fn absorb<T, F>(&self, operation: &'static str, fut: F) -> Option<T>
    where
        F: Future<Output = Result<T, QueryError>>,
    {
        let result = match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(QueryError::Timeout(self.timeout)),
        };

        match result {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!(operation, error = %e, "Query failed, serving empty result");
                None
            }
        }
    }

    // =========================================================================
    // Fallible implementations
    // =========================================================================

    /// Build the history response as of `now` (Unix seconds).
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Config`] for an unusable region and
    /// [`QueryError::Db`] if any read fails.
    pub async fn try_history(&self, period: Period, now: i64) -> Result<HistoryResponse, QueryError> {
        self.region.geofence()?;

        let pool = self.pool.pool();
        let since = now.saturating_sub(period.duration_secs());

        let history = HistoryStore::new(pool);
        let samples = history.samples_since(since).await?;
        let chart_data = bucket_samples(&samples, period.bucket_secs());

        // Latest sample overall, regardless of the requested period.
        let latest = history.latest_sample().await?;
        let (current_counts, last_updated) = latest.as_ref().map_or(
            (CurrentCounts::default(), chrono::DateTime::<chrono::Utc>::UNIX_EPOCH),
            |sample| {
                let at = chrono::DateTime::from_timestamp(sample.timestamp, 0)
                    .unwrap_or(chrono::DateTime::<chrono::Utc>::UNIX_EPOCH);
                (CurrentCounts::from(sample), at)
            },
        );

        let changes = ChangeStore::new(pool);
        let tallies = changes
            .tallies_since(since)
            .await?
            .into_iter()
            .map(|row| ChangeTally {
                team: Team::from_db(row.team_id),
                change_count: u32::try_from(row.change_count).unwrap_or(u32::MAX),
                last_changed: row.last_changed,
                name: row.name,
                gym_id: row.gym_id.into(),
            })
            .collect();
        let ranked = rank_contested(tallies, CONTESTED_LIMIT);

        let ranked_ids: Vec<_> = ranked.iter().map(|t| t.gym_id.clone()).collect();
        let events = changes
            .events_for_gyms(&ranked_ids, RECENT_CHANGES_LIMIT)
            .await?;
        let contested_gyms = assemble(ranked, recent_transitions(&events, RECENT_CHANGES_LIMIT));

        tracing::debug!(
            period = %period,
            points = chart_data.len(),
            contested = contested_gyms.len(),
            "Built history response"
        );

        Ok(HistoryResponse {
            period,
            chart_data,
            contested_gyms,
            current_counts,
            last_updated,
        })
    }

    /// Build the gyms snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Config`] for an unusable region and
    /// [`QueryError::Db`] if the read fails.
    pub async fn try_gyms_snapshot(&self) -> Result<GymsSnapshot, QueryError> {
        let gyms = self.gyms_in_region().await?;

        let mut snapshot = GymsSnapshot::default();
        for row in gyms {
            let team = row.team();
            let list = match team {
                Team::Mystic => &mut snapshot.by_faction.mystic,
                Team::Valor => &mut snapshot.by_faction.valor,
                Team::Instinct => &mut snapshot.by_faction.instinct,
                Team::Neutral => continue,
            };
            list.push(snapshot_entry(row, team));
        }

        snapshot.counts.mystic = list_len(&snapshot.by_faction.mystic);
        snapshot.counts.valor = list_len(&snapshot.by_faction.valor);
        snapshot.counts.instinct = list_len(&snapshot.by_faction.instinct);
        Ok(snapshot)
    }

    /// Build the defender composition, stamped with `now` (Unix seconds).
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Config`] for an unusable region and
    /// [`QueryError::Db`] if the read fails.
    pub async fn try_defender_composition(
        &self,
        now: i64,
    ) -> Result<DefenderComposition, QueryError> {
        let gyms = self.gyms_in_region().await?;

        let parsed = gyms.iter().filter_map(|row| {
            let team = row.team();
            if !team.is_faction() {
                return None;
            }
            parse_defenders(&row.gym_id(), row.defenders.as_deref()).map(|d| (team, d))
        });

        Ok(compose(parsed, now))
    }

    async fn gyms_in_region(&self) -> Result<Vec<GymRow>, QueryError> {
        let fence = self.region.geofence()?;
        let rows = GymStore::fetch_enabled(self.pool.pool()).await?;
        Ok(retain_in_region(rows, &fence))
    }
}

fn snapshot_entry(row: GymRow, team: Team) -> GymSnapshotEntry {
    let id = row.gym_id();
    let defenders = parse_defenders(&id, row.defenders.as_deref()).unwrap_or_default();
    let available_slots = row.available_slots();
    GymSnapshotEntry {
        id,
        name: row.name,
        url: row.url,
        lat: row.lat,
        lon: row.lon,
        team,
        available_slots,
        updated: row.updated,
        defenders,
    }
}

fn list_len(list: &[GymSnapshotEntry]) -> u32 {
    u32::try_from(list.len()).unwrap_or(u32::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn unreachable_service(region: RegionConfig) -> QueryService {
        let config = gymwatch_db::PostgresConfig::new("postgresql://u:p@127.0.0.1:1/gymwatch")
            .with_acquire_timeout(Duration::from_millis(200));
        let pool = PostgresPool::connect_lazy(&config).unwrap();
        QueryService::new(pool, region, Duration::from_secs(5))
    }

    fn square_region() -> RegionConfig {
        RegionConfig {
            name: String::from("square"),
            polygon: vec![[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0]],
        }
    }

    #[tokio::test]
    async fn history_store_failure_yields_empty_shape() {
        let service = unreachable_service(square_region());
        let response = service.get_history("48h").await;
        assert_eq!(response, HistoryResponse::empty(Period::TwoDays));
    }

    #[tokio::test]
    async fn unknown_period_is_served_as_day() {
        let service = unreachable_service(square_region());
        let response = service.get_history("fortnight").await;
        assert_eq!(response.period, Period::Day);
    }

    #[tokio::test]
    async fn missing_region_yields_empty_snapshot() {
        let service = unreachable_service(RegionConfig::default());
        assert!(matches!(
            service.try_gyms_snapshot().await,
            Err(QueryError::Config(_))
        ));
        assert_eq!(service.get_gyms_snapshot().await, GymsSnapshot::default());
        assert_eq!(
            service.get_history("6h").await,
            HistoryResponse::empty(Period::SixHours)
        );
    }

    #[tokio::test]
    async fn store_failure_yields_empty_composition() {
        let service = unreachable_service(square_region());
        assert_eq!(
            service.get_defender_composition().await,
            DefenderComposition::default()
        );
    }

    #[test]
    fn snapshot_entry_tolerates_bad_payload() {
        let row = GymRow {
            id: String::from("g"),
            name: Some(String::from("Fountain")),
            url: None,
            lat: 0.5,
            lon: 0.5,
            team_id: Some(2),
            available_slots: Some(3),
            updated: Some(10),
            defenders: Some(String::from("not json")),
        };
        let entry = snapshot_entry(row, Team::Valor);
        assert!(entry.defenders.is_empty());
        assert_eq!(entry.available_slots, Some(3));
        assert_eq!(entry.name.as_deref(), Some("Fountain"));
    }
}
