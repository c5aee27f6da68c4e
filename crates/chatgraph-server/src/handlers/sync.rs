//! Bulk reconciliation endpoints.

use axum::extract::State;
use axum::Json;

use chatgraph_core::remote::GraphDump;

use crate::error::ApiError;
use crate::schema::{LoadResponse, SyncResponse, TeamSyncRequest};
use crate::state::AppState;

/// Reconciles the remote graph against a full team snapshot, submitting
/// whatever signals the diff produces.
///
/// `POST /team/sync`
pub async fn team_sync(
    State(state): State<AppState>,
    Json(request): Json<TeamSyncRequest>,
) -> Result<Json<SyncResponse>, ApiError> {
    let mut connector = state.connector.lock().await;
    let submitted = connector.synchronize_team_data(&request.users, &request.channels)?;
    Ok(Json(SyncResponse { submitted }))
}

/// Replaces storage and the identifier cache with the contents of a remote
/// graph dump.
///
/// `POST /graph/load`
pub async fn load_graph(
    State(state): State<AppState>,
    Json(dump): Json<GraphDump>,
) -> Result<Json<LoadResponse>, ApiError> {
    let mut connector = state.connector.lock().await;
    let summary = connector.load_initial_data(&dump)?;
    Ok(Json(LoadResponse {
        users: summary.users,
        channels: summary.channels,
        memberships: summary.memberships,
    }))
}
