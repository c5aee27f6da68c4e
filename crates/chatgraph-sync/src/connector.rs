//! The connector coordinating reconciliation between a chat workspace and
//! its remote graph.
//!
//! [`GraphConnector`] owns the storage backend and the identifier cache and
//! is the single writer for both; run it behind one coordinating lock per
//! workspace so handlers execute to completion without interleaving.
//! Mutations never touch the remote graph directly -- they become
//! [`Signal`]s submitted to the job queue collaborator, whose completion
//! payloads flow back through `on_job_done` (see `confirm.rs`).

use indexmap::{IndexMap, IndexSet};
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, info, warn};

use chatgraph_core::id::{ChannelId, RemoteId, UserId};
use chatgraph_core::record::{ChannelRecord, UserRecord};
use chatgraph_core::remote::{GraphDump, RemoteGraph};
use chatgraph_core::signal::{NodeProperties, NodeType, Relation, Signal};
use chatgraph_core::team::{TeamChannel, TeamUser};
use chatgraph_storage::TeamStore;

use crate::cache::IdentifierCache;
use crate::client::GraphApi;
use crate::error::SyncError;
use crate::queue::JobQueueFactory;

/// Upper bound on the channel suggestions returned per query.
pub const MAX_CHANNEL_SUGGESTIONS: usize = 4;

/// Mention tokens embed the mentioned user's local id, e.g. `<@U2>`.
const MENTION_PATTERN: &str = r"<@([A-Za-z0-9]+)>";

/// Collaborators and initial state for a [`GraphConnector`].
pub struct ConnectorOptions {
    pub storage: Box<dyn TeamStore>,
    /// Identifier cache to start from. `None` rebuilds the node mappings
    /// from the `gc_id` fields already persisted in storage.
    pub cache: Option<IdentifierCache>,
    /// The remote graph this workspace synchronizes into.
    pub graph_id: String,
    pub queues: Arc<dyn JobQueueFactory>,
    pub api: Arc<dyn GraphApi>,
}

/// Counts reported by an initial bulk load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    pub users: usize,
    pub channels: usize,
    pub memberships: usize,
}

/// The reconciliation engine for one workspace.
pub struct GraphConnector {
    pub(crate) storage: Box<dyn TeamStore>,
    pub(crate) cache: IdentifierCache,
    pub(crate) graph_id: String,
    pub(crate) queues: Arc<dyn JobQueueFactory>,
    pub(crate) api: Arc<dyn GraphApi>,
    pub(crate) mention_re: Regex,
}

impl GraphConnector {
    pub fn new(options: ConnectorOptions) -> Result<Self, SyncError> {
        let cache = match options.cache {
            Some(cache) => cache,
            None => IdentifierCache::rebuild(options.storage.as_ref())?,
        };
        Ok(GraphConnector {
            storage: options.storage,
            cache,
            graph_id: options.graph_id,
            queues: options.queues,
            api: options.api,
            mention_re: Regex::new(MENTION_PATTERN).expect("mention pattern is valid"),
        })
    }

    pub fn cache(&self) -> &IdentifierCache {
        &self.cache
    }

    pub fn storage(&self) -> &dyn TeamStore {
        self.storage.as_ref()
    }

    pub fn graph_id(&self) -> &str {
        &self.graph_id
    }

    pub(crate) fn submit(&self, signals: Vec<Signal>) {
        self.queues.queue().add_job(signals);
    }

    /// Computes the signals that bring the remote graph in line with the
    /// given team snapshot, persisting newly seen users and member
    /// channels along the way.
    ///
    /// Running this twice over the same snapshot produces signals the
    /// first time and none the second (the membership phase reads the
    /// identifier cache, which only changes when confirmations arrive, so
    /// "second time" means after the first pass's signals confirmed).
    ///
    /// Membership edges are only diffed for user/channel pairs where both
    /// endpoints have a resolved remote id. A pair with an unsynced
    /// endpoint emits nothing now and is picked up by a later pass once
    /// the node confirmation has arrived.
    pub fn build_team_sync_signals(
        &mut self,
        users: &[TeamUser],
        channels: &[TeamChannel],
    ) -> Result<Vec<Signal>, SyncError> {
        let mut signals = Vec::new();

        for user in users {
            if self.storage.user(&user.id)?.is_some() {
                continue;
            }
            self.storage
                .put_user(&UserRecord::new(user.id.clone(), user.name.clone()))?;
            signals.push(Signal::NodeCreate {
                node_type: NodeType::User,
                name: user.name.clone(),
                image: user.image().map(str::to_string),
                description: None,
                properties: NodeProperties::user(user.id.clone()),
            });
        }

        let member_channels: Vec<&TeamChannel> =
            channels.iter().filter(|c| c.is_member).collect();

        for channel in &member_channels {
            if self.storage.channel(&channel.id)?.is_some() {
                continue;
            }
            self.storage
                .put_channel(&ChannelRecord::new(channel.id.clone(), channel.name.clone()))?;
            signals.push(Signal::NodeCreate {
                node_type: NodeType::Channel,
                name: channel.name.clone(),
                image: None,
                description: None,
                properties: NodeProperties::channel(channel.id.clone()),
            });
        }

        for channel in &member_channels {
            let channel_remote = self.storage.channel(&channel.id)?.and_then(|c| c.gc_id);
            for user in users {
                let Some(mut stored) = self.storage.user(&user.id)? else {
                    continue;
                };
                let desired = channel.members.contains(&user.id);

                // Keep the stored membership set aligned with the platform
                // snapshot regardless of edge eligibility.
                let changed = if desired {
                    stored.channels.insert(channel.id.clone())
                } else {
                    stored.channels.shift_remove(&channel.id)
                };
                if changed {
                    self.storage.put_user(&stored)?;
                }

                let (Some(user_remote), Some(channel_remote)) =
                    (stored.gc_id.as_ref(), channel_remote.as_ref())
                else {
                    continue;
                };
                let existing = self
                    .cache
                    .edge_id(Relation::MemberOf, user_remote, channel_remote)
                    .cloned();
                match (desired, existing) {
                    (true, None) => signals.push(Signal::EdgeCreate {
                        name: Relation::MemberOf,
                        from_type: NodeType::User,
                        from_name: stored.name.clone(),
                        to_type: NodeType::Channel,
                        to_name: channel.name.clone(),
                        properties: Some(serde_json::json!({})),
                    }),
                    (false, Some(edge_id)) => signals.push(Signal::EdgeDelete {
                        name: Relation::MemberOf,
                        id: edge_id,
                        from: user_remote.clone(),
                        to: channel_remote.clone(),
                    }),
                    _ => {}
                }
            }
        }

        debug!(count = signals.len(), "team sync diff computed");
        Ok(signals)
    }

    /// Runs the diff and submits the resulting signals as one batch job.
    /// Returns the number of signals submitted.
    pub fn synchronize_team_data(
        &mut self,
        users: &[TeamUser],
        channels: &[TeamChannel],
    ) -> Result<usize, SyncError> {
        let signals = self.build_team_sync_signals(users, channels)?;
        let count = signals.len();
        if count > 0 {
            self.submit(signals);
        }
        info!(signals = count, "team synchronization submitted");
        Ok(count)
    }

    /// Populates storage and the identifier cache from scratch out of a
    /// full remote graph dump: the inverse of the diff direction.
    ///
    /// User and channel local ids come from the nodes' `user_id` /
    /// `channel_id` properties; membership lists follow the dump's
    /// MEMBER_OF edges in order. Message nodes and foreign relations are
    /// ignored. The previous cache contents are replaced entirely.
    pub fn load_initial_data(&mut self, dump: &GraphDump) -> Result<LoadSummary, SyncError> {
        let remote = RemoteGraph::from_dump(dump);
        let mut cache = IdentifierCache::new();
        let mut users: IndexMap<RemoteId, UserRecord> = IndexMap::new();
        let mut channels: IndexMap<RemoteId, ChannelRecord> = IndexMap::new();

        for node in remote.nodes() {
            match node.node_type {
                NodeType::User => {
                    let Some(local) = node.properties.user_id.clone() else {
                        warn!(remote_id = %node.id, "user node without user_id property; skipping");
                        continue;
                    };
                    cache.record_user(node.id.clone(), local.clone());
                    users.insert(
                        node.id.clone(),
                        UserRecord {
                            id: local,
                            name: node.name.clone(),
                            gc_id: Some(node.id.clone()),
                            channels: IndexSet::new(),
                        },
                    );
                }
                NodeType::Channel => {
                    let Some(local) = node.properties.channel_id.clone() else {
                        warn!(remote_id = %node.id, "channel node without channel_id property; skipping");
                        continue;
                    };
                    cache.record_channel(node.id.clone(), local.clone());
                    channels.insert(
                        node.id.clone(),
                        ChannelRecord {
                            id: local,
                            name: node.name.clone(),
                            gc_id: Some(node.id.clone()),
                        },
                    );
                }
                NodeType::Message | NodeType::Other => {}
            }
        }

        let mut memberships = 0usize;
        for edge in remote.member_of_edges() {
            let Some(channel) = channels.get(&edge.to) else {
                continue;
            };
            let channel_id = channel.id.clone();
            let Some(user) = users.get_mut(&edge.from) else {
                continue;
            };
            user.channels.insert(channel_id);
            cache.record_edge(
                Relation::MemberOf,
                edge.from.clone(),
                edge.to.clone(),
                edge.id.clone(),
            );
            memberships += 1;
        }

        for record in users.values() {
            self.storage.put_user(record)?;
        }
        for record in channels.values() {
            self.storage.put_channel(record)?;
        }

        let summary = LoadSummary {
            users: users.len(),
            channels: channels.len(),
            memberships,
        };
        self.cache = cache;
        info!(
            users = summary.users,
            channels = summary.channels,
            memberships = summary.memberships,
            "initial graph data loaded"
        );
        Ok(summary)
    }

    /// Fetches the remote graph dump and loads it.
    pub async fn bootstrap_from_remote(&mut self) -> Result<LoadSummary, SyncError> {
        let dump = self.api.fetch_graph(&self.graph_id).await?;
        self.load_initial_data(&dump)
    }

    /// Channels the remote graph suggests for a user, collaborative-filtered
    /// through MEMBER_OF, capped to [`MAX_CHANNEL_SUGGESTIONS`].
    ///
    /// Read-only: neither storage nor the cache is touched. A user storage
    /// has never seen is an error; a known user without a graph node yet
    /// yields an empty list without a network call.
    pub async fn channel_suggestions_for(
        &self,
        user: &UserId,
    ) -> Result<Vec<ChannelId>, SyncError> {
        let Some(record) = self.storage.user(user)? else {
            return Err(SyncError::UnknownUser(user.clone()));
        };
        let Some(remote) = record.gc_id else {
            debug!(user = %user, "user has no graph node yet; no suggestions");
            return Ok(Vec::new());
        };

        let response = self
            .api
            .collab_filter(&self.graph_id, &remote, Relation::MemberOf)
            .await?;
        Ok(response
            .suggestions
            .into_iter()
            .filter_map(|s| s.node.properties.channel_id)
            .take(MAX_CHANNEL_SUGGESTIONS)
            .collect())
    }
}
