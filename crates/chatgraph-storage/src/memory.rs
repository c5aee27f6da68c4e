//! In-memory implementation of [`TeamStore`].
//!
//! [`InMemoryStore`] is a first-class backend for tests, ephemeral
//! deployments, and anywhere persistence isn't needed. It stores records in
//! HashMaps with identical semantics to the SQLite backend.

use std::collections::HashMap;

use chatgraph_core::id::{ChannelId, UserId};
use chatgraph_core::record::{ChannelRecord, UserRecord};

use crate::error::StorageError;
use crate::traits::TeamStore;

/// In-memory implementation of [`TeamStore`].
#[derive(Debug, Default)]
pub struct InMemoryStore {
    users: HashMap<UserId, UserRecord>,
    channels: HashMap<ChannelId, ChannelRecord>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        InMemoryStore::default()
    }

    /// Creates a store pre-populated with the given records.
    pub fn seeded(
        users: impl IntoIterator<Item = UserRecord>,
        channels: impl IntoIterator<Item = ChannelRecord>,
    ) -> Self {
        InMemoryStore {
            users: users.into_iter().map(|u| (u.id.clone(), u)).collect(),
            channels: channels.into_iter().map(|c| (c.id.clone(), c)).collect(),
        }
    }
}

impl TeamStore for InMemoryStore {
    fn user(&self, id: &UserId) -> Result<Option<UserRecord>, StorageError> {
        Ok(self.users.get(id).cloned())
    }

    fn put_user(&mut self, record: &UserRecord) -> Result<(), StorageError> {
        self.users.insert(record.id.clone(), record.clone());
        Ok(())
    }

    fn channel(&self, id: &ChannelId) -> Result<Option<ChannelRecord>, StorageError> {
        Ok(self.channels.get(id).cloned())
    }

    fn put_channel(&mut self, record: &ChannelRecord) -> Result<(), StorageError> {
        self.channels.insert(record.id.clone(), record.clone());
        Ok(())
    }

    fn find_channels_by_name(&self, name: &str) -> Result<Vec<ChannelRecord>, StorageError> {
        let mut matches: Vec<ChannelRecord> = self
            .channels
            .values()
            .filter(|c| c.name == name)
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        Ok(matches)
    }

    fn users(&self) -> Result<Vec<UserRecord>, StorageError> {
        let mut all: Vec<UserRecord> = self.users.values().cloned().collect();
        all.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        Ok(all)
    }

    fn channels(&self) -> Result<Vec<ChannelRecord>, StorageError> {
        let mut all: Vec<ChannelRecord> = self.channels.values().cloned().collect();
        all.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        Ok(all)
    }
}
