//! Event handlers: incremental reactions to single platform events.
//!
//! Each handler updates storage, consults the identifier cache, and submits
//! signals immediately. Handlers degrade rather than fail: an event naming
//! an entity storage has never seen, or one whose remote ids are not
//! resolved yet, updates what it can, logs, and skips the signal. The next
//! full reconciliation pass emits whatever was skipped.

use tracing::warn;

use chatgraph_core::id::UserId;
use chatgraph_core::record::ChannelRecord;
use chatgraph_core::signal::{NodeProperties, NodeType, PrevProperties, Relation, Signal};
use chatgraph_core::team::{MembershipEvent, MessageEvent, TeamChannel};
use indexmap::IndexMap;

use crate::connector::GraphConnector;
use crate::error::SyncError;

impl GraphConnector {
    /// A user joined a channel: append to the stored membership set
    /// (idempotent) and submit a names-based MEMBER_OF `edge_create`.
    pub fn on_user_joined_channel(&mut self, event: &MembershipEvent) -> Result<(), SyncError> {
        let Some(mut user) = self.storage.user(&event.user)? else {
            warn!(user = %event.user, "join event for unknown user; ignoring");
            return Ok(());
        };
        let Some(channel) = self.storage.channel(&event.channel)? else {
            warn!(channel = %event.channel, "join event for unknown channel; ignoring");
            return Ok(());
        };

        if user.channels.insert(event.channel.clone()) {
            self.storage.put_user(&user)?;
        }

        self.submit(vec![Signal::EdgeCreate {
            name: Relation::MemberOf,
            from_type: NodeType::User,
            from_name: user.name.clone(),
            to_type: NodeType::Channel,
            to_name: channel.name,
            properties: None,
        }]);
        Ok(())
    }

    /// A user left a channel: remove from the stored membership set and
    /// submit an `edge_delete` for the cached edge id. The cached id stays
    /// in place until the remote confirms the deletion.
    pub fn on_user_left_channel(&mut self, event: &MembershipEvent) -> Result<(), SyncError> {
        let Some(mut user) = self.storage.user(&event.user)? else {
            warn!(user = %event.user, "leave event for unknown user; ignoring");
            return Ok(());
        };
        let Some(channel) = self.storage.channel(&event.channel)? else {
            warn!(channel = %event.channel, "leave event for unknown channel; ignoring");
            return Ok(());
        };

        if user.channels.shift_remove(&event.channel) {
            self.storage.put_user(&user)?;
        }

        let (Some(user_remote), Some(channel_remote)) = (user.gc_id.as_ref(), channel.gc_id.as_ref())
        else {
            warn!(user = %event.user, channel = %event.channel, "leave event before both nodes synced; skipping edge_delete");
            return Ok(());
        };
        let Some(edge_id) = self
            .cache
            .edge_id(Relation::MemberOf, user_remote, channel_remote)
            .cloned()
        else {
            warn!(user = %event.user, channel = %event.channel, "no cached membership edge; skipping edge_delete");
            return Ok(());
        };

        self.submit(vec![Signal::EdgeDelete {
            name: Relation::MemberOf,
            id: edge_id,
            from: user_remote.clone(),
            to: channel_remote.clone(),
        }]);
        Ok(())
    }

    /// A channel was created. If a stored channel already carries this name
    /// with a synced graph node, the platform is reusing a deleted
    /// channel's name: adopt that node via `node_update` instead of
    /// creating a duplicate, and rewire the cache's reverse mapping to the
    /// new local id.
    pub fn on_channel_created(&mut self, channel: &TeamChannel) -> Result<(), SyncError> {
        let reuse = self
            .storage
            .find_channels_by_name(&channel.name)?
            .into_iter()
            .filter(|c| c.id != channel.id)
            .find_map(|c| c.gc_id.map(|gc| (c.id, gc)));

        match reuse {
            None => {
                self.storage.put_channel(&ChannelRecord::new(
                    channel.id.clone(),
                    channel.name.clone(),
                ))?;
                self.submit(vec![Signal::NodeCreate {
                    node_type: NodeType::Channel,
                    name: channel.name.clone(),
                    image: None,
                    description: None,
                    properties: NodeProperties::channel(channel.id.clone()),
                }]);
            }
            Some((old_local, remote)) => {
                self.storage.put_channel(&ChannelRecord {
                    id: channel.id.clone(),
                    name: channel.name.clone(),
                    gc_id: Some(remote.clone()),
                })?;
                self.cache.record_channel(remote.clone(), channel.id.clone());
                self.submit(vec![Signal::NodeUpdate {
                    id: remote,
                    properties: NodeProperties::channel(channel.id.clone()),
                    prev: PrevProperties {
                        properties: NodeProperties::channel(old_local),
                    },
                }]);
            }
        }
        Ok(())
    }

    /// A message was posted: rewrite mention tokens to readable names,
    /// build the message's node signal plus one MENTIONS edge per distinct
    /// mentioned user, and submit everything as a single batch job.
    pub fn on_message_received(&mut self, message: &MessageEvent) -> Result<(), SyncError> {
        let author = self
            .storage
            .user(&message.user)?
            .map(|u| u.name)
            .unwrap_or_else(|| message.user.as_str().to_string());
        let identity = format!("{} - {}", author, message.ts);

        let (description, mentioned) = self.rewrite_mentions(&message.text);

        let mut signals = Vec::with_capacity(1 + mentioned.len());
        signals.push(Signal::NodeCreate {
            node_type: NodeType::Message,
            name: identity.clone(),
            image: None,
            description: Some(description),
            properties: NodeProperties::default(),
        });
        for name in mentioned.values() {
            signals.push(Signal::EdgeCreate {
                name: Relation::Mentions,
                from_type: NodeType::Message,
                from_name: identity.clone(),
                to_type: NodeType::User,
                to_name: name.clone(),
                properties: None,
            });
        }

        self.submit(signals);
        Ok(())
    }

    /// Replaces every `<@LOCALID>` token whose user storage knows with
    /// `@name`, leaving unknown tokens untouched. Returns the rewritten
    /// text and the distinct mentioned users in first-mention order.
    fn rewrite_mentions(&self, text: &str) -> (String, IndexMap<UserId, String>) {
        let mut mentioned: IndexMap<UserId, String> = IndexMap::new();
        let rewritten = self
            .mention_re
            .replace_all(text, |caps: &regex::Captures<'_>| {
                let id = UserId::from(&caps[1]);
                match self.storage.user(&id) {
                    Ok(Some(user)) => {
                        let replacement = format!("@{}", user.name);
                        mentioned.insert(id, user.name);
                        replacement
                    }
                    Ok(None) => caps[0].to_string(),
                    Err(err) => {
                        warn!(user = %id, error = %err, "mention lookup failed; leaving token as-is");
                        caps[0].to_string()
                    }
                }
            })
            .into_owned();
        (rewritten, mentioned)
    }
}
