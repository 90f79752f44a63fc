//! `PostgreSQL` data layer for Gymwatch.
//!
//! The collector writes through this crate inside a single transaction; the
//! query layer reads through it with plain pool connections. Neither side
//! keeps any state of its own, so everything here is a thin, typed wrapper
//! over parameterized SQL.
//!
//! # Tables
//!
//! ```text
//! gym              (owned by the scanner, read-only here)
//! gym_history      one row per collector run
//! gym_team_change  one row per observed ownership transition
//! ```
//!
//! # Modules
//!
//! - [`postgres`] -- Connection pool, timeouts and migrations
//! - [`gym_store`] -- Reads of the scanner's `gym` table
//! - [`history_store`] -- `gym_history` appends, reads and retention
//! - [`change_store`] -- `gym_team_change` appends, reads, retention and
//!   the collector's advisory lock
//! - [`error`] -- Shared error types

pub mod change_store;
pub mod error;
pub mod gym_store;
pub mod history_store;
pub mod postgres;

pub use change_store::{ChangeRow, ChangeStore, ChangeTallyRow};
pub use error::DbError;
pub use gym_store::{GymRow, GymStore};
pub use history_store::{HistoryRow, HistoryStore};
pub use postgres::{PostgresConfig, PostgresPool};
