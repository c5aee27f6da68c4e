//! The mutation signal vocabulary sent to the remote graph service, and the
//! confirmation vocabulary received back once a signal has executed.
//!
//! Signals are internally tagged on an `action` field to match the remote
//! wire protocol. Outbound signals carry no local identifiers except inside
//! `properties`; they describe the mutation either by remote id (`id`,
//! `from`, `to`) or by human-readable node descriptors (`name` + type) when
//! the remote id does not exist yet. Signals are immutable after
//! construction.
//!
//! Confirmations are the same shapes coming back with remote-assigned ids.
//! Parsing is deliberately tolerant: an unrecognized action, node type, or
//! relation fails the per-signal parse and the signal is ignored, while
//! recognized variants are matched exhaustively downstream.

use serde::{Deserialize, Serialize};

use crate::id::{ChannelId, RemoteId, UserId};

/// The closed node vocabulary of the remote graph.
///
/// `Other` only appears on the inbound side: confirmations naming a node
/// type this connector does not manage parse into it and are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    User,
    Channel,
    Message,
    #[serde(other)]
    Other,
}

/// The closed edge vocabulary of the remote graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relation {
    #[serde(rename = "MEMBER_OF")]
    MemberOf,
    #[serde(rename = "MENTIONS")]
    Mentions,
}

impl Relation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::MemberOf => "MEMBER_OF",
            Relation::Mentions => "MENTIONS",
        }
    }
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The closed property bag attached to graph nodes. These are the only
/// properties through which local identifiers travel to the remote graph
/// and back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<ChannelId>,
}

impl NodeProperties {
    pub fn user(id: UserId) -> Self {
        NodeProperties {
            user_id: Some(id),
            channel_id: None,
        }
    }

    pub fn channel(id: ChannelId) -> Self {
        NodeProperties {
            user_id: None,
            channel_id: Some(id),
        }
    }
}

/// The previous property state carried by a `node_update` signal so the
/// remote side can audit what the update replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrevProperties {
    pub properties: NodeProperties,
}

/// A single desired mutation against the remote graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Signal {
    NodeCreate {
        #[serde(rename = "type")]
        node_type: NodeType,
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        image: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        properties: NodeProperties,
    },
    NodeUpdate {
        id: RemoteId,
        properties: NodeProperties,
        prev: PrevProperties,
    },
    EdgeCreate {
        name: Relation,
        from_type: NodeType,
        from_name: String,
        to_type: NodeType,
        to_name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        properties: Option<serde_json::Value>,
    },
    EdgeDelete {
        name: Relation,
        id: RemoteId,
        from: RemoteId,
        to: RemoteId,
    },
}

/// A signal as reported back by the remote graph service after execution,
/// now carrying the remote-assigned identifier(s).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Confirmation {
    NodeCreate {
        id: RemoteId,
        #[serde(rename = "type")]
        node_type: NodeType,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        properties: NodeProperties,
    },
    NodeUpdate {
        id: RemoteId,
        #[serde(default)]
        properties: NodeProperties,
    },
    EdgeCreate {
        id: RemoteId,
        name: Relation,
        from: RemoteId,
        to: RemoteId,
    },
    EdgeDelete {
        id: RemoteId,
        name: Relation,
        from: RemoteId,
        to: RemoteId,
    },
}

impl Confirmation {
    /// Parses one raw confirmation payload entry. Returns `None` for any
    /// shape this connector does not recognize.
    pub fn parse(value: &serde_json::Value) -> Option<Confirmation> {
        serde_json::from_value(value.clone()).ok()
    }
}
