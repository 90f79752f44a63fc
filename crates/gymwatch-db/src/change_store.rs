//! Persistence for the `gym_team_change` table.
//!
//! Each row is one observed ownership transition, or the first observation
//! of a gym (`old_team IS NULL`). The collector derives every gym's last
//! known owner from this table on each run; there is no separate
//! current-owner table, so the table must stay complete for the diff to be
//! correct.

use std::collections::BTreeMap;

use gymwatch_types::{ChangeEvent, GymId, Team};
use sqlx::{PgConnection, PgPool};

use crate::error::DbError;

/// Operations on the `gym_team_change` table.
pub struct ChangeStore<'a> {
    pool: &'a PgPool,
}

impl<'a> ChangeStore<'a> {
    /// Create a new change store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Collector (transaction-scoped)
    // =========================================================================

    /// Try to take the collector's transaction-scoped advisory lock.
    ///
    /// Returns `false` when another transaction already holds `key`. The lock
    /// is released automatically when the transaction ends.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn try_advisory_lock(conn: &mut PgConnection, key: i64) -> Result<bool, DbError> {
        let acquired = sqlx::query_scalar::<_, bool>("SELECT pg_try_advisory_xact_lock($1)")
            .bind(key)
            .fetch_one(conn)
            .await?;
        Ok(acquired)
    }

    /// Last known owner of every gym that has at least one change row.
    ///
    /// The owner is the `new_team` of the gym's newest row; ties on
    /// `changed_at` are broken by insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn last_known_owners(
        conn: &mut PgConnection,
    ) -> Result<BTreeMap<GymId, Team>, DbError> {
        let rows = sqlx::query_as::<_, (String, Option<i16>)>(
            r"SELECT DISTINCT ON (gym_id) gym_id, new_team
              FROM gym_team_change
              ORDER BY gym_id, changed_at DESC, id DESC",
        )
        .fetch_all(conn)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(gym_id, new_team)| (GymId::from(gym_id), Team::from_db(new_team)))
            .collect())
    }

    /// Append change events in one statement.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the insert fails.
    pub async fn insert_events(
        conn: &mut PgConnection,
        events: &[ChangeEvent],
    ) -> Result<(), DbError> {
        if events.is_empty() {
            return Ok(());
        }

        let len = events.len();
        let mut gym_ids = Vec::with_capacity(len);
        let mut old_teams: Vec<Option<i16>> = Vec::with_capacity(len);
        let mut new_teams: Vec<Option<i16>> = Vec::with_capacity(len);
        let mut changed_ats = Vec::with_capacity(len);

        for event in events {
            gym_ids.push(event.gym_id.as_str());
            old_teams.push(event.old_team.map(Team::id));
            new_teams.push(Some(event.new_team.id()));
            changed_ats.push(event.changed_at);
        }

        sqlx::query(
            r"INSERT INTO gym_team_change (gym_id, old_team, new_team, changed_at)
              SELECT * FROM UNNEST($1::TEXT[], $2::SMALLINT[], $3::SMALLINT[], $4::BIGINT[])",
        )
        .bind(&gym_ids)
        .bind(&old_teams)
        .bind(&new_teams)
        .bind(&changed_ats)
        .execute(conn)
        .await?;

        tracing::debug!(count = len, "Inserted team changes (batch UNNEST)");
        Ok(())
    }

    /// Delete change rows strictly older than `cutoff` (Unix seconds).
    ///
    /// Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the delete fails.
    pub async fn delete_older_than(conn: &mut PgConnection, cutoff: i64) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM gym_team_change WHERE changed_at < $1")
            .bind(cutoff)
            .execute(conn)
            .await?;
        Ok(result.rows_affected())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Per-gym change counts for rows with `changed_at >= since`, joined with
    /// the gym's current name and team.
    ///
    /// Every row counts, first observations included. Ordering and the
    /// top-N cut are left to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn tallies_since(&self, since: i64) -> Result<Vec<ChangeTallyRow>, DbError> {
        let rows = sqlx::query_as::<_, ChangeTallyRow>(
            r"SELECT c.gym_id, g.name, g.team_id,
                     COUNT(*) AS change_count,
                     MAX(c.changed_at) AS last_changed
              FROM gym_team_change c
              LEFT JOIN gym g ON g.id = c.gym_id
              WHERE c.changed_at >= $1
              GROUP BY c.gym_id, g.name, g.team_id",
        )
        .bind(since)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// The newest `per_gym` transitions of each given gym, newest first
    /// within each gym.
    ///
    /// Rows whose old and new owner match once a `NULL` old owner is read as
    /// neutral are skipped, so a gym first seen neutral has no transitions.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn events_for_gyms(
        &self,
        gym_ids: &[GymId],
        per_gym: usize,
    ) -> Result<Vec<ChangeEvent>, DbError> {
        if gym_ids.is_empty() || per_gym == 0 {
            return Ok(Vec::new());
        }

        let ids: Vec<&str> = gym_ids.iter().map(GymId::as_str).collect();
        let per_gym = i64::try_from(per_gym).unwrap_or(i64::MAX);
        let rows = sqlx::query_as::<_, ChangeRow>(
            r"SELECT id, gym_id, old_team, new_team, changed_at
              FROM (
                  SELECT id, gym_id, old_team, new_team, changed_at,
                         ROW_NUMBER() OVER (
                             PARTITION BY gym_id ORDER BY changed_at DESC, id DESC
                         ) AS rn
                  FROM gym_team_change
                  WHERE gym_id = ANY($1)
                    AND COALESCE(old_team, 0) <> COALESCE(new_team, 0)
              ) ranked
              WHERE rn <= $2
              ORDER BY gym_id, changed_at DESC, id DESC",
        )
        .bind(&ids)
        .bind(per_gym)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.iter().map(ChangeRow::to_event).collect())
    }

    /// Number of stored change rows.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn count(&self) -> Result<i64, DbError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM gym_team_change")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}

/// A row from the `gym_team_change` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChangeRow {
    /// Auto-incremented row ID.
    pub id: i64,
    /// The gym.
    pub gym_id: String,
    /// Previous team id; `NULL` for a first observation.
    pub old_team: Option<i16>,
    /// New team id.
    pub new_team: Option<i16>,
    /// Unix seconds.
    pub changed_at: i64,
}

impl ChangeRow {
    /// Convert to the domain record.
    ///
    /// A non-`NULL` `old_team` always stays `Some`, even for an unknown id,
    /// so first observations remain distinguishable.
    pub fn to_event(&self) -> ChangeEvent {
        ChangeEvent {
            gym_id: GymId::new(self.gym_id.as_str()),
            old_team: self.old_team.map(|id| Team::from_db(Some(id))),
            new_team: Team::from_db(self.new_team),
            changed_at: self.changed_at,
        }
    }
}

/// Aggregated change count for one gym within a window.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChangeTallyRow {
    /// The gym.
    pub gym_id: String,
    /// Current display name (`NULL` if the gym row is gone).
    pub name: Option<String>,
    /// Current team id.
    pub team_id: Option<i16>,
    /// Change rows within the window.
    pub change_count: i64,
    /// Newest `changed_at` within the window.
    pub last_changed: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_old_team_stays_first_observation() {
        let row = ChangeRow {
            id: 1,
            gym_id: String::from("g"),
            old_team: None,
            new_team: Some(0),
            changed_at: 10,
        };
        let event = row.to_event();
        assert!(event.is_first_observation());
        assert_eq!(event.new_team, Team::Neutral);
    }

    #[test]
    fn stored_flip_decodes() {
        let row = ChangeRow {
            id: 2,
            gym_id: String::from("g"),
            old_team: Some(1),
            new_team: Some(2),
            changed_at: 20,
        };
        let event = row.to_event();
        assert_eq!(event.old_team, Some(Team::Mystic));
        assert_eq!(event.new_team, Team::Valor);
    }
}
