//! Persistence for the `gym_history` table.
//!
//! One row is appended per collector run. Rows are never updated; they are
//! only removed by the retention sweep.

use gymwatch_types::HistorySample;
use sqlx::{PgConnection, PgPool};

use crate::error::DbError;

/// Operations on the `gym_history` table.
pub struct HistoryStore<'a> {
    pool: &'a PgPool,
}

impl<'a> HistoryStore<'a> {
    /// Create a new history store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Collector writes (transaction-scoped)
    // =========================================================================

    /// Append one sample.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the insert fails.
    pub async fn insert_sample(
        conn: &mut PgConnection,
        sample: &HistorySample,
    ) -> Result<(), DbError> {
        sqlx::query(
            r"INSERT INTO gym_history (timestamp, mystic, valor, instinct, total)
              VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(sample.timestamp)
        .bind(count_to_db(sample.mystic))
        .bind(count_to_db(sample.valor))
        .bind(count_to_db(sample.instinct))
        .bind(count_to_db(sample.total))
        .execute(conn)
        .await?;

        tracing::debug!(
            timestamp = sample.timestamp,
            total = sample.total,
            "Inserted history sample"
        );
        Ok(())
    }

    /// Delete samples strictly older than `cutoff` (Unix seconds).
    ///
    /// Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the delete fails.
    pub async fn delete_older_than(conn: &mut PgConnection, cutoff: i64) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM gym_history WHERE timestamp < $1")
            .bind(cutoff)
            .execute(conn)
            .await?;
        Ok(result.rows_affected())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// All samples with `timestamp >= since`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn samples_since(&self, since: i64) -> Result<Vec<HistorySample>, DbError> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            r"SELECT id, timestamp, mystic, valor, instinct, total
              FROM gym_history
              WHERE timestamp >= $1
              ORDER BY timestamp, id",
        )
        .bind(since)
        .fetch_all(self.pool)
        .await?;

        rows.iter().map(HistoryRow::to_sample).collect()
    }

    /// The newest sample overall, if any.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn latest_sample(&self) -> Result<Option<HistorySample>, DbError> {
        let row = sqlx::query_as::<_, HistoryRow>(
            r"SELECT id, timestamp, mystic, valor, instinct, total
              FROM gym_history
              ORDER BY timestamp DESC, id DESC
              LIMIT 1",
        )
        .fetch_optional(self.pool)
        .await?;

        row.as_ref().map(HistoryRow::to_sample).transpose()
    }

    /// Number of stored samples.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn count(&self) -> Result<i64, DbError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM gym_history")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}

/// A row from the `gym_history` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct HistoryRow {
    /// Auto-incremented row ID.
    pub id: i64,
    /// Unix seconds.
    pub timestamp: i64,
    /// Mystic count.
    pub mystic: i32,
    /// Valor count.
    pub valor: i32,
    /// Instinct count.
    pub instinct: i32,
    /// Recorded total.
    pub total: i32,
}

impl HistoryRow {
    /// Convert to the domain record.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::OutOfRange`] if a count is negative.
    pub fn to_sample(&self) -> Result<HistorySample, DbError> {
        Ok(HistorySample {
            timestamp: self.timestamp,
            mystic: count_from_db("mystic", self.mystic)?,
            valor: count_from_db("valor", self.valor)?,
            instinct: count_from_db("instinct", self.instinct)?,
            total: count_from_db("total", self.total)?,
        })
    }
}

fn count_to_db(count: u32) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}

fn count_from_db(column: &'static str, value: i32) -> Result<u32, DbError> {
    u32::try_from(value).ok().ok_or(DbError::OutOfRange {
        column,
        value: i64::from(value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_converts_to_sample() {
        let row = HistoryRow {
            id: 1,
            timestamp: 1_700_000_000,
            mystic: 3,
            valor: 4,
            instinct: 5,
            total: 14,
        };
        let sample = row.to_sample().ok();
        assert_eq!(sample.map(|s| s.effective_total()), Some(14));
    }

    #[test]
    fn negative_count_is_rejected() {
        let row = HistoryRow {
            id: 1,
            timestamp: 0,
            mystic: -1,
            valor: 0,
            instinct: 0,
            total: 0,
        };
        assert!(matches!(
            row.to_sample(),
            Err(DbError::OutOfRange { column: "mystic", .. })
        ));
    }

    #[test]
    fn oversized_count_saturates() {
        assert_eq!(count_to_db(u32::MAX), i32::MAX);
    }
}
