//! Shared type definitions for Gymwatch.
//!
//! This crate is the single source of truth for the records the collector
//! writes and the payloads the query layer returns. Response types flow
//! downstream to `TypeScript` via `ts-rs` for the dashboard.
//!
//! # Modules
//!
//! - [`ids`] -- The [`GymId`] newtype
//! - [`enums`] -- [`Team`] and the chart [`Period`]
//! - [`structs`] -- Stored records, gym payloads and query responses

pub mod enums;
pub mod ids;
pub mod structs;

pub use enums::{Period, Team};
pub use ids::GymId;
pub use structs::{
    ChangeEvent, ChartPoint, ContestedGym, CurrentCounts, Defender, DefenderComposition,
    DefenderUsage, GymSnapshotEntry, GymsByFaction, GymsSnapshot, HistoryResponse,
    HistorySample, OverallStats, RecentChange, TeamCounts, TeamStat,
};

#[cfg(test)]
mod tests {
    //! Binding generation for the dashboard.

    #[test]
    fn export_bindings() {
        use ts_rs::TS;

        let _ = crate::enums::Team::export_all();
        let _ = crate::enums::Period::export_all();
        let _ = crate::structs::HistoryResponse::export_all();
        let _ = crate::structs::GymsSnapshot::export_all();
        let _ = crate::structs::DefenderComposition::export_all();
    }
}
