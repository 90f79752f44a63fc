//! Endpoint handlers.
//!
//! Handlers delegate straight to the query layer and never fail.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::Uri;
use axum::Json;
use gymwatch_types::{DefenderComposition, GymsSnapshot, HistoryResponse};

use crate::error::ApiError;
use crate::state::AppState;

/// Query parameters for `GET /api/history`.
#[derive(Debug, Default, serde::Deserialize)]
pub struct HistoryQuery {
    /// Period key (`6h`, `12h`, `24h`, `48h`, `7d`). Missing or unknown
    /// keys are served as `24h`.
    pub period: Option<String>,
}

/// `GET /api/history`
pub async fn history(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HistoryQuery>,
) -> Json<HistoryResponse> {
    let key = params.period.as_deref().unwrap_or_default();
    Json(state.query.get_history(key).await)
}

/// `GET /api/gyms`
pub async fn gyms(State(state): State<Arc<AppState>>) -> Json<GymsSnapshot> {
    Json(state.query.get_gyms_snapshot().await)
}

/// `GET /api/defenders`
pub async fn defenders(State(state): State<Arc<AppState>>) -> Json<DefenderComposition> {
    Json(state.query.get_defender_composition().await)
}

/// `GET /health`
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Fallback for unmatched routes.
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(uri.path().to_owned())
}
