//! Records owned by the storage collaborator.
//!
//! A record's `gc_id` is the remote graph identifier assigned after a
//! `node_create` confirmation comes back; `None` means the entity has not
//! been synced yet. The user's channel set is insertion-ordered
//! ([`IndexSet`]) and mutated only by the membership event handlers and
//! reconciliation.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::id::{ChannelId, RemoteId, UserId};

/// A chat workspace user as persisted in storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gc_id: Option<RemoteId>,
    #[serde(default)]
    pub channels: IndexSet<ChannelId>,
}

impl UserRecord {
    /// A fresh, not-yet-synced user with no channel memberships.
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        UserRecord {
            id,
            name: name.into(),
            gc_id: None,
            channels: IndexSet::new(),
        }
    }
}

/// A chat workspace channel as persisted in storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub id: ChannelId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gc_id: Option<RemoteId>,
}

impl ChannelRecord {
    /// A fresh, not-yet-synced channel.
    pub fn new(id: ChannelId, name: impl Into<String>) -> Self {
        ChannelRecord {
            id,
            name: name.into(),
            gc_id: None,
        }
    }
}
