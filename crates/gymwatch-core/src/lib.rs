//! Snapshot collector and query layer for Gymwatch.
//!
//! The collector periodically records how many gyms each faction holds and
//! which gyms changed hands; the query layer turns that log into chart
//! series, contested-gym rankings and defender statistics.
//!
//! # Modules
//!
//! - [`config`] -- YAML configuration with environment overrides
//! - [`region`] -- Region membership ([`RegionOracle`], [`Geofence`])
//! - [`ownership`] -- Faction tallies and the ownership diff
//! - [`collector`] -- One transactional collection run
//! - [`buckets`] -- Time-bucket averaging of history samples
//! - [`contested`] -- Contested-gym ranking
//! - [`defenders`] -- Defender payload parsing and composition
//! - [`query`] -- [`QueryService`], the never-failing read operations
//! - [`logging`] -- Tracing subscriber setup

pub mod buckets;
pub mod collector;
pub mod config;
pub mod contested;
pub mod defenders;
pub mod logging;
pub mod ownership;
pub mod query;
pub mod region;

pub use collector::{CollectionReport, Collector, CollectorError, CollectorSettings};
pub use config::{ConfigError, GymwatchConfig};
pub use query::{QueryError, QueryService};
pub use region::{Geofence, RegionOracle};
