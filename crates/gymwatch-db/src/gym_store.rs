//! Reads of the scanner's `gym` table.
//!
//! The table is owned by the upstream scanner. Gymwatch only ever selects
//! enabled rows from it; region containment is decided by the caller.

use gymwatch_types::{GymId, Team};
use sqlx::PgExecutor;

use crate::error::DbError;

/// Operations on the `gym` table.
pub struct GymStore;

impl GymStore {
    /// Fetch every enabled gym.
    ///
    /// Accepts any executor so the collector can read inside its
    /// transaction and the query layer can read straight from the pool.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn fetch_enabled<'e, E>(executor: E) -> Result<Vec<GymRow>, DbError>
    where
        E: PgExecutor<'e>,
    {
        let rows = sqlx::query_as::<_, GymRow>(
            r"SELECT id, name, url, lat, lon, team_id, available_slots, updated, defenders
              FROM gym
              WHERE enabled
              ORDER BY id",
        )
        .fetch_all(executor)
        .await?;

        tracing::debug!(count = rows.len(), "Fetched enabled gyms");
        Ok(rows)
    }
}

/// A row from the `gym` table.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct GymRow {
    /// Scanner-issued gym id.
    pub id: String,
    /// Display name.
    pub name: Option<String>,
    /// Image URL.
    pub url: Option<String>,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
    /// Owning team id; `NULL` or `0` for neutral.
    pub team_id: Option<i16>,
    /// Open defender slots.
    pub available_slots: Option<i16>,
    /// Last scanner update, Unix seconds.
    pub updated: Option<i64>,
    /// JSON-encoded defender list, as written by the scanner.
    pub defenders: Option<String>,
}

impl GymRow {
    /// The gym's identifier.
    pub fn gym_id(&self) -> GymId {
        GymId::new(self.id.as_str())
    }

    /// The current owner, with `NULL` and unknown ids read as neutral.
    pub fn team(&self) -> Team {
        Team::from_db(self.team_id)
    }

    /// Open slots, with negative values dropped.
    pub fn available_slots(&self) -> Option<u32> {
        self.available_slots.and_then(|s| u32::try_from(s).ok())
    }
}
