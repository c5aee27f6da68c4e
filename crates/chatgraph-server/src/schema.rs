//! Request and response types for the HTTP API.

use serde::{Deserialize, Serialize};

use chatgraph_core::id::{ChannelId, UserId};
use chatgraph_core::team::{TeamChannel, TeamUser};

use crate::scheduler::JobRecord;

/// Platform event envelope, tagged the way the chat platform tags its
/// webhook callbacks.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TeamEvent {
    MemberJoinedChannel {
        user: UserId,
        channel: ChannelId,
    },
    MemberLeftChannel {
        user: UserId,
        channel: ChannelId,
    },
    ChannelCreated {
        channel: TeamChannel,
    },
    Message {
        user: UserId,
        channel: ChannelId,
        ts: String,
        text: String,
    },
}

/// Body of `POST /team/sync`: the full team snapshot to reconcile against.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeamSyncRequest {
    #[serde(default)]
    pub users: Vec<TeamUser>,
    #[serde(default)]
    pub channels: Vec<TeamChannel>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AcceptedResponse {
    pub accepted: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncResponse {
    /// Signals submitted to the scheduler by this pass.
    pub submitted: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadResponse {
    pub users: usize,
    pub channels: usize,
    pub memberships: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuggestionsResponse {
    pub channels: Vec<ChannelId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobsResponse {
    pub jobs: Vec<JobRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
