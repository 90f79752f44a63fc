//! HTTP API for Gymwatch.
//!
//! A thin Axum layer over [`gymwatch_core::QueryService`]. Every data
//! endpoint answers `200 OK`: the query layer already turns store failures
//! and timeouts into empty payloads, so the handlers only translate request
//! parameters and serialize.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/history?period=` | Chart series, contested gyms, current counts |
//! | `GET` | `/api/gyms` | In-region gyms grouped by faction |
//! | `GET` | `/api/defenders` | Per-faction defender statistics |
//! | `GET` | `/health` | Liveness probe |

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;

pub use router::build_router;
pub use server::{start_server, ServerConfig, ServerError};
pub use state::AppState;
