//! Identifier newtypes for the two independent id spaces.
//!
//! The chat platform and the remote graph service assign identifiers
//! independently of each other. Distinct newtype wrappers keep the spaces
//! from mixing: a `UserId` (platform-assigned) cannot be passed where a
//! `RemoteId` (graph-assigned) is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Platform-assigned user identifier (e.g. `"U1"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

/// Platform-assigned channel identifier (e.g. `"C1"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub String);

/// Identifier assigned by the remote graph service to a node or edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ChannelId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl RemoteId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Display implementations -- just print the inner value.

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        UserId(s.to_string())
    }
}

impl From<&str> for ChannelId {
    fn from(s: &str) -> Self {
        ChannelId(s.to_string())
    }
}

impl From<&str> for RemoteId {
    fn from(s: &str) -> Self {
        RemoteId(s.to_string())
    }
}

/// Composite key identifying one edge instance between two remote nodes,
/// rendered as `"<remoteFrom>-<remoteTo>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeKey(String);

impl EdgeKey {
    pub fn new(from: &RemoteId, to: &RemoteId) -> Self {
        EdgeKey(format!("{}-{}", from.0, to.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
