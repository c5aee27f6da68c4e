//! Storage error types for chatgraph-storage.

use thiserror::Error;

/// Errors produced by storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// JSON serialization or deserialization of a stored column failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An underlying SQLite operation failed.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Applying schema migrations failed.
    #[error("migration error: {0}")]
    Migration(String),

    /// The shared SQLite connection lock was poisoned by a panicking writer.
    #[error("connection lock poisoned")]
    ConnectionPoisoned,
}
