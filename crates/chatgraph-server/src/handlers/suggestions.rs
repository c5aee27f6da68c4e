//! The channel suggestion query.

use axum::extract::{Path, State};
use axum::Json;

use chatgraph_core::id::UserId;

use crate::error::ApiError;
use crate::schema::SuggestionsResponse;
use crate::state::AppState;

/// Channels the remote graph suggests for a user.
///
/// `GET /users/{user_id}/suggestions`
pub async fn channel_suggestions(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<SuggestionsResponse>, ApiError> {
    let connector = state.connector.lock().await;
    let channels = connector
        .channel_suggestions_for(&UserId(user_id))
        .await?;
    Ok(Json(SuggestionsResponse { channels }))
}
