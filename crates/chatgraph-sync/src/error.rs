//! Error types for the synchronization engine.

use chatgraph_core::id::UserId;
use chatgraph_storage::StorageError;
use thiserror::Error;

/// Errors produced by connector operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The storage collaborator failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// An HTTP request to the remote graph service failed in transit.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote graph service answered with a non-success status.
    #[error("graph api error ({status}): {body}")]
    Api { status: u16, body: String },

    /// A payload could not be serialized or deserialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An operation referenced a user that storage has never seen.
    #[error("unknown user: {0}")]
    UnknownUser(UserId),
}
