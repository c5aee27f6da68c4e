//! The bidirectional identifier cache.
//!
//! Maps between the two id spaces: remote graph ids on one side, platform
//! local ids on the other, per entity kind, plus a relation-keyed map of
//! edge ids under their `"<remoteFrom>-<remoteTo>"` composite keys.
//!
//! Invariants held throughout the process lifetime:
//! - for every stored record with a `gc_id`, the cache resolves that remote
//!   id back to the record's local id, and the two never disagree;
//! - an edge key is present under a relation if and only if that
//!   relationship is believed to exist in the remote graph.
//!
//! All operations are synchronous, in-memory and infallible. Recording a
//! mapping that already exists overwrites it (last writer wins -- used when
//! the remote id of a deleted channel is reassigned to a namesake), and any
//! stale inverse entry is erased so the two directions stay consistent.

use std::collections::HashMap;

use chatgraph_core::id::{ChannelId, EdgeKey, RemoteId, UserId};
use chatgraph_core::signal::Relation;
use chatgraph_storage::{StorageError, TeamStore};

/// Process-local bidirectional mapping between remote and local identifiers.
#[derive(Debug, Clone, Default)]
pub struct IdentifierCache {
    users_by_remote: HashMap<RemoteId, UserId>,
    users_by_local: HashMap<UserId, RemoteId>,
    channels_by_remote: HashMap<RemoteId, ChannelId>,
    channels_by_local: HashMap<ChannelId, RemoteId>,
    edges: HashMap<Relation, HashMap<EdgeKey, RemoteId>>,
}

impl IdentifierCache {
    pub fn new() -> Self {
        IdentifierCache::default()
    }

    /// Rebuilds the node mappings from the `gc_id` fields persisted in
    /// storage. Edge ids are not recoverable from storage; they come back
    /// with the next initial bulk load.
    pub fn rebuild(store: &dyn TeamStore) -> Result<Self, StorageError> {
        let mut cache = IdentifierCache::new();
        for user in store.users()? {
            if let Some(gc_id) = user.gc_id {
                cache.record_user(gc_id, user.id);
            }
        }
        for channel in store.channels()? {
            if let Some(gc_id) = channel.gc_id {
                cache.record_channel(gc_id, channel.id);
            }
        }
        Ok(cache)
    }

    pub fn local_user_id(&self, remote: &RemoteId) -> Option<&UserId> {
        self.users_by_remote.get(remote)
    }

    pub fn local_channel_id(&self, remote: &RemoteId) -> Option<&ChannelId> {
        self.channels_by_remote.get(remote)
    }

    pub fn remote_user_id(&self, local: &UserId) -> Option<&RemoteId> {
        self.users_by_local.get(local)
    }

    pub fn remote_channel_id(&self, local: &ChannelId) -> Option<&RemoteId> {
        self.channels_by_local.get(local)
    }

    /// The remote edge id for one relationship instance, if the edge is
    /// believed to exist in the remote graph.
    pub fn edge_id(&self, relation: Relation, from: &RemoteId, to: &RemoteId) -> Option<&RemoteId> {
        self.edges
            .get(&relation)
            .and_then(|m| m.get(&EdgeKey::new(from, to)))
    }

    pub fn record_user(&mut self, remote: RemoteId, local: UserId) {
        if let Some(stale_local) = self.users_by_remote.insert(remote.clone(), local.clone()) {
            if stale_local != local {
                self.users_by_local.remove(&stale_local);
            }
        }
        if let Some(stale_remote) = self.users_by_local.insert(local, remote.clone()) {
            if stale_remote != remote {
                self.users_by_remote.remove(&stale_remote);
            }
        }
    }

    pub fn record_channel(&mut self, remote: RemoteId, local: ChannelId) {
        if let Some(stale_local) = self.channels_by_remote.insert(remote.clone(), local.clone()) {
            if stale_local != local {
                self.channels_by_local.remove(&stale_local);
            }
        }
        if let Some(stale_remote) = self.channels_by_local.insert(local, remote.clone()) {
            if stale_remote != remote {
                self.channels_by_remote.remove(&stale_remote);
            }
        }
    }

    pub fn record_edge(&mut self, relation: Relation, from: RemoteId, to: RemoteId, id: RemoteId) {
        self.edges
            .entry(relation)
            .or_default()
            .insert(EdgeKey::new(&from, &to), id);
    }

    pub fn remove_edge(&mut self, relation: Relation, from: &RemoteId, to: &RemoteId) {
        if let Some(map) = self.edges.get_mut(&relation) {
            map.remove(&EdgeKey::new(from, to));
        }
    }

    /// Number of cached edge ids for a relation (diagnostic).
    pub fn edge_count(&self, relation: Relation) -> usize {
        self.edges.get(&relation).map_or(0, HashMap::len)
    }
}
