//! Snapshot endpoint

use axum::extract::State;
use tracing::debug;

use crate::api::middleware::RequireAdmin;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::usage::Snapshot;

/// GET /api/snapshot
///
/// Builds a fresh snapshot on every call.
pub async fn get_snapshot(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<Snapshot>, ApiError> {
    debug!("Building snapshot on request");

    let snapshot = state.snapshot_service.build_snapshot().await?;

    Ok(Json(snapshot))
}
