//! The [`TeamStore`] trait defining the storage contract for team records.
//!
//! All backends (InMemoryStore, SqliteStore) implement this trait with
//! identical semantics, ensuring they are fully swappable without changing
//! connector logic.
//!
//! The trait is synchronous: under the single coordinating lock per
//! workspace, no storage call ever blocks the async runtime on anything
//! slower than a local SQLite write. Missing records are `Ok(None)` rather
//! than errors -- absence is a normal branch in every reconciliation and
//! event flow.

use chatgraph_core::id::{ChannelId, UserId};
use chatgraph_core::record::{ChannelRecord, UserRecord};

use crate::error::StorageError;

/// The storage contract for users and channels.
pub trait TeamStore: Send + Sync {
    /// Retrieves a user by local id.
    fn user(&self, id: &UserId) -> Result<Option<UserRecord>, StorageError>;

    /// Inserts or overwrites a user record.
    fn put_user(&mut self, record: &UserRecord) -> Result<(), StorageError>;

    /// Retrieves a channel by local id.
    fn channel(&self, id: &ChannelId) -> Result<Option<ChannelRecord>, StorageError>;

    /// Inserts or overwrites a channel record.
    fn put_channel(&mut self, record: &ChannelRecord) -> Result<(), StorageError>;

    /// Finds every channel record with the given name, ordered by local id.
    ///
    /// Channel names are not unique across time: the platform may reuse a
    /// deleted channel's name under a fresh local id. This lookup backs the
    /// remote-id reuse check on channel creation.
    fn find_channels_by_name(&self, name: &str) -> Result<Vec<ChannelRecord>, StorageError>;

    /// Lists all user records, ordered by local id.
    fn users(&self) -> Result<Vec<UserRecord>, StorageError>;

    /// Lists all channel records, ordered by local id.
    fn channels(&self) -> Result<Vec<ChannelRecord>, StorageError>;
}
