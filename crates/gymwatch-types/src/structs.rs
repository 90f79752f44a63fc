//! Stored records, gym payloads and query response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{Period, Team};
use crate::ids::GymId;

// ---------------------------------------------------------------------------
// Stored records
// ---------------------------------------------------------------------------

/// One aggregated snapshot of faction counts, written once per collector run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistorySample {
    /// Unix time of the collection, in seconds.
    pub timestamp: i64,
    /// Gyms held by Mystic.
    pub mystic: u32,
    /// Gyms held by Valor.
    pub valor: u32,
    /// Gyms held by Instinct.
    pub instinct: u32,
    /// All in-region gyms, including neutral ones, as recorded.
    pub total: u32,
}

impl HistorySample {
    /// Sum of the three faction counts.
    pub const fn faction_sum(&self) -> u32 {
        self.mystic
            .saturating_add(self.valor)
            .saturating_add(self.instinct)
    }

    /// Total as it should be read.
    ///
    /// Older rows were written before `total >= mystic + valor + instinct`
    /// held, so the total is always re-derived as the larger of the two.
    pub const fn effective_total(&self) -> u32 {
        let sum = self.faction_sum();
        if self.total > sum { self.total } else { sum }
    }
}

/// A recorded ownership transition for one gym.
///
/// `old_team == None` marks the first observation of the gym rather than an
/// actual flip. Both kinds live in the same table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// The gym whose owner changed.
    pub gym_id: GymId,
    /// Previous owner, or `None` when no prior state was known.
    pub old_team: Option<Team>,
    /// Owner observed at `changed_at`.
    pub new_team: Team,
    /// Unix time of the collection that observed the change, in seconds.
    pub changed_at: i64,
}

impl ChangeEvent {
    /// Whether this row records the first sighting of the gym.
    pub const fn is_first_observation(&self) -> bool {
        self.old_team.is_none()
    }

    /// Whether old and new owner differ once a missing old owner is read as
    /// [`Team::Neutral`].
    pub fn is_transition(&self) -> bool {
        self.old_team.unwrap_or_default() != self.new_team
    }
}

// ---------------------------------------------------------------------------
// Gym payloads
// ---------------------------------------------------------------------------

/// One defending unit from a gym's `defenders` payload.
///
/// The scanner writes the payload as a JSON array; unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Defender {
    /// Species id.
    pub pokemon_id: u32,
    /// Form id (`0` when the species has no forms).
    #[serde(default)]
    pub form: u32,
    /// Costume / event variant id.
    #[serde(default)]
    pub costume: u32,
    /// Gender id.
    #[serde(default)]
    pub gender: Option<u8>,
    /// Whether the unit is shiny.
    #[serde(default)]
    pub shiny: Option<bool>,
    /// Current combat power.
    #[serde(default)]
    pub cp_now: Option<u32>,
    /// Combat power when the unit was deployed.
    #[serde(default)]
    pub cp_when_deployed: Option<u32>,
    /// Deployment time in Unix milliseconds.
    #[serde(default)]
    pub deployed_ms: Option<i64>,
}

impl Defender {
    /// Power used for aggregation: current CP, else deployment CP, else zero.
    pub fn power(&self) -> u32 {
        self.cp_now.or(self.cp_when_deployed).unwrap_or(0)
    }
}

/// A gym as listed in the live snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct GymSnapshotEntry {
    /// Gym identifier.
    pub id: GymId,
    /// Display name, when the scanner has one.
    pub name: Option<String>,
    /// Image URL, when the scanner has one.
    pub url: Option<String>,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
    /// Current owner.
    pub team: Team,
    /// Open defender slots.
    pub available_slots: Option<u32>,
    /// Last scanner update, Unix seconds.
    pub updated: Option<i64>,
    /// Parsed defenders; empty when the payload was missing or malformed.
    pub defenders: Vec<Defender>,
}

/// Gyms grouped by owning faction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GymsByFaction {
    /// Gyms held by Mystic.
    pub mystic: Vec<GymSnapshotEntry>,
    /// Gyms held by Valor.
    pub valor: Vec<GymSnapshotEntry>,
    /// Gyms held by Instinct.
    pub instinct: Vec<GymSnapshotEntry>,
}

/// Per-faction gym counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TeamCounts {
    /// Gyms held by Mystic.
    pub mystic: u32,
    /// Gyms held by Valor.
    pub valor: u32,
    /// Gyms held by Instinct.
    pub instinct: u32,
}

/// Response of the live gyms snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct GymsSnapshot {
    /// Gyms grouped by faction. Neutral gyms are not listed.
    pub by_faction: GymsByFaction,
    /// Number of gyms in each faction list.
    pub counts: TeamCounts,
}

// ---------------------------------------------------------------------------
// History response
// ---------------------------------------------------------------------------

/// One averaged bucket of the history chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ChartPoint {
    /// Bucket start in Unix milliseconds.
    pub time: i64,
    /// Average Mystic count, rounded.
    pub mystic: u32,
    /// Average Valor count, rounded.
    pub valor: u32,
    /// Average Instinct count, rounded.
    pub instinct: u32,
    /// Average total, rounded.
    pub total: u32,
}

/// Counts from the newest history sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CurrentCounts {
    /// Gyms held by Mystic.
    pub mystic: u32,
    /// Gyms held by Valor.
    pub valor: u32,
    /// Gyms held by Instinct.
    pub instinct: u32,
    /// All in-region gyms.
    pub total: u32,
}

impl From<&HistorySample> for CurrentCounts {
    fn from(sample: &HistorySample) -> Self {
        Self {
            mystic: sample.mystic,
            valor: sample.valor,
            instinct: sample.instinct,
            total: sample.effective_total(),
        }
    }
}

/// A change shown in a contested gym's recent history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct RecentChange {
    /// Previous owner; `None` for a first observation.
    pub old_team: Option<Team>,
    /// New owner.
    pub new_team: Team,
    /// Unix seconds.
    pub changed_at: i64,
}

impl From<&ChangeEvent> for RecentChange {
    fn from(event: &ChangeEvent) -> Self {
        Self {
            old_team: event.old_team,
            new_team: event.new_team,
            changed_at: event.changed_at,
        }
    }
}

/// A gym ranked by how often it changed hands within the window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct ContestedGym {
    /// Gym identifier.
    pub id: GymId,
    /// Display name, when the scanner has one.
    pub name: Option<String>,
    /// Current owner.
    pub team: Team,
    /// Change events recorded within the window.
    pub change_count: u32,
    /// Newest change within the window, Unix seconds.
    pub last_changed: i64,
    /// Up to five newest real transitions, newest first.
    pub recent_changes: Vec<RecentChange>,
}

/// Response of the history query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct HistoryResponse {
    /// The period actually served (after normalization).
    pub period: Period,
    /// Sparse, ascending series of bucket averages.
    pub chart_data: Vec<ChartPoint>,
    /// Most contested gyms within the period.
    pub contested_gyms: Vec<ContestedGym>,
    /// Counts from the newest sample, independent of the period.
    pub current_counts: CurrentCounts,
    /// Time of the newest sample; the epoch when none exists.
    #[ts(type = "string")]
    pub last_updated: DateTime<Utc>,
}

impl HistoryResponse {
    /// The shape served when nothing could be read.
    pub const fn empty(period: Period) -> Self {
        Self {
            period,
            chart_data: Vec::new(),
            contested_gyms: Vec::new(),
            current_counts: CurrentCounts {
                mystic: 0,
                valor: 0,
                instinct: 0,
                total: 0,
            },
            last_updated: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

// ---------------------------------------------------------------------------
// Defender composition response
// ---------------------------------------------------------------------------

/// How often one defender key appears for a faction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct DefenderUsage {
    /// Species id.
    pub pokemon_id: u32,
    /// Form id.
    pub form: u32,
    /// Costume / variant id.
    pub costume: u32,
    /// Number of deployed units with this key.
    pub count: u32,
    /// Rounded mean power of those units.
    pub average_power: u32,
}

/// Defender statistics for one faction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct TeamStat {
    /// The faction.
    pub team: Team,
    /// Distinct species deployed.
    pub unique_species: u32,
    /// Units deployed.
    pub total_units: u32,
    /// Sum of unit power.
    pub total_power: u64,
    /// Rounded mean unit power (`0` with no units).
    pub average_power: u32,
    /// Ten most frequent defender keys.
    pub top_defenders: Vec<DefenderUsage>,
}

/// Totals across all factions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct OverallStats {
    /// Units deployed across all factions.
    pub total_units: u32,
    /// Unix seconds when the composition was computed.
    pub timestamp: i64,
}

/// Response of the defender composition query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DefenderComposition {
    /// One entry per faction, in team id order.
    pub teams: Vec<TeamStat>,
    /// Totals across factions.
    pub overall: OverallStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(mystic: u32, valor: u32, instinct: u32, total: u32) -> HistorySample {
        HistorySample {
            timestamp: 0,
            mystic,
            valor,
            instinct,
            total,
        }
    }

    #[test]
    fn effective_total_prefers_larger_value() {
        assert_eq!(sample(1, 2, 3, 10).effective_total(), 10);
        // Rows from before the invariant was enforced.
        assert_eq!(sample(4, 5, 6, 3).effective_total(), 15);
    }

    #[test]
    fn first_observation_of_neutral_gym_is_not_a_transition() {
        let event = ChangeEvent {
            gym_id: GymId::from("g"),
            old_team: None,
            new_team: Team::Neutral,
            changed_at: 100,
        };
        assert!(event.is_first_observation());
        assert!(!event.is_transition());
    }

    #[test]
    fn first_observation_of_owned_gym_is_a_transition() {
        let event = ChangeEvent {
            gym_id: GymId::from("g"),
            old_team: None,
            new_team: Team::Valor,
            changed_at: 100,
        };
        assert!(event.is_transition());
    }

    #[test]
    fn defender_payload_tolerates_missing_fields() {
        let raw = r#"[{"pokemon_id": 242, "cp_when_deployed": 3012, "extra": true}]"#;
        let parsed: Result<Vec<Defender>, _> = serde_json::from_str(raw);
        assert!(parsed.is_ok());
        let defenders = parsed.unwrap_or_default();
        assert_eq!(defenders.len(), 1);
        assert_eq!(defenders.first().map(Defender::power), Some(3012));
        assert_eq!(defenders.first().map(|d| d.form), Some(0));
    }

    #[test]
    fn empty_history_response_uses_epoch() {
        let empty = HistoryResponse::empty(Period::Week);
        assert_eq!(empty.last_updated.timestamp(), 0);
        assert!(empty.chart_data.is_empty());
        assert_eq!(empty.current_counts, CurrentCounts::default());

        let json = serde_json::to_value(&empty).unwrap_or_default();
        assert_eq!(json["period"], "7d");
        assert!(json.get("chartData").is_some());
        assert!(json.get("contestedGyms").is_some());
        assert!(json.get("lastUpdated").is_some());
    }
}
