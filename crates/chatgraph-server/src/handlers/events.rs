//! The platform event webhook.

use axum::extract::State;
use axum::Json;

use chatgraph_core::team::{MembershipEvent, MessageEvent};

use crate::error::ApiError;
use crate::schema::{AcceptedResponse, TeamEvent};
use crate::state::AppState;

/// Dispatches one platform event to the matching connector handler.
///
/// `POST /events`
pub async fn handle_event(
    State(state): State<AppState>,
    Json(event): Json<TeamEvent>,
) -> Result<Json<AcceptedResponse>, ApiError> {
    let mut connector = state.connector.lock().await;
    match event {
        TeamEvent::MemberJoinedChannel { user, channel } => {
            connector.on_user_joined_channel(&MembershipEvent { user, channel })?;
        }
        TeamEvent::MemberLeftChannel { user, channel } => {
            connector.on_user_left_channel(&MembershipEvent { user, channel })?;
        }
        TeamEvent::ChannelCreated { channel } => {
            connector.on_channel_created(&channel)?;
        }
        TeamEvent::Message {
            user,
            channel,
            ts,
            text,
        } => {
            connector.on_message_received(&MessageEvent {
                user,
                channel,
                ts,
                text,
            })?;
        }
    }
    Ok(Json(AcceptedResponse { accepted: true }))
}
