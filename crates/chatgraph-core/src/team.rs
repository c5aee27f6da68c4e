//! Team state and events as observed from the chat platform.
//!
//! These are lenient inbound DTOs: optional or absent fields default rather
//! than fail, since platform payloads vary by event type and API version.

use serde::{Deserialize, Serialize};

use crate::id::{ChannelId, UserId};

/// A user as reported by the platform's team listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamUser {
    pub id: UserId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<UserProfile>,
}

impl TeamUser {
    /// The profile image to attach to the user's graph node, if any.
    pub fn image(&self) -> Option<&str> {
        self.profile
            .as_ref()
            .and_then(|p| p.image_192.as_deref())
    }
}

/// The subset of the platform profile this connector consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_192: Option<String>,
}

/// A channel as reported by the platform's channel listing, including the
/// member list when the connector's own account is a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamChannel {
    pub id: ChannelId,
    pub name: String,
    #[serde(default)]
    pub is_member: bool,
    #[serde(default)]
    pub members: Vec<UserId>,
}

/// A user joining or leaving a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipEvent {
    pub user: UserId,
    pub channel: ChannelId,
}

/// A message posted to a channel. `ts` is the platform's message timestamp
/// string, which together with the author forms the message's synthetic
/// graph identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEvent {
    pub user: UserId,
    pub channel: ChannelId,
    pub ts: String,
    pub text: String,
}
