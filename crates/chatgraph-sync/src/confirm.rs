//! The confirmation handler: folds remote-assigned identifiers back into
//! storage and the identifier cache once the scheduler reports a job done.
//!
//! Confirmations may arrive arbitrarily late and in arbitrary order
//! relative to other confirmations or new events. Every write here is an
//! idempotent last-writer-wins upsert, so replays and reordering are safe.

use tracing::{debug, warn};

use chatgraph_core::record::{ChannelRecord, UserRecord};
use chatgraph_core::signal::{Confirmation, NodeType, Relation};

use crate::connector::GraphConnector;
use crate::error::SyncError;
use crate::queue::JobOutcome;

impl GraphConnector {
    /// Consumes one job-completion payload. Entries the connector does not
    /// recognize are skipped; recognized shapes are matched exhaustively.
    pub fn on_job_done(&mut self, outcome: &JobOutcome) -> Result<(), SyncError> {
        for value in &outcome.graph.signals {
            let Some(confirmation) = Confirmation::parse(value) else {
                debug!("ignoring unrecognized confirmation signal");
                continue;
            };
            self.apply_confirmation(confirmation)?;
        }
        Ok(())
    }

    fn apply_confirmation(&mut self, confirmation: Confirmation) -> Result<(), SyncError> {
        match confirmation {
            Confirmation::NodeCreate {
                id,
                node_type: NodeType::User,
                name,
                properties,
            } => {
                let Some(local) = properties.user_id else {
                    warn!(remote_id = %id, "user node confirmation without user_id property");
                    return Ok(());
                };
                let mut record = self
                    .storage
                    .user(&local)?
                    .unwrap_or_else(|| UserRecord::new(local.clone(), name.unwrap_or_default()));
                record.gc_id = Some(id.clone());
                self.storage.put_user(&record)?;
                self.cache.record_user(id, local);
            }
            Confirmation::NodeCreate {
                id,
                node_type: NodeType::Channel,
                name,
                properties,
            } => {
                let Some(local) = properties.channel_id else {
                    warn!(remote_id = %id, "channel node confirmation without channel_id property");
                    return Ok(());
                };
                let mut record = self
                    .storage
                    .channel(&local)?
                    .unwrap_or_else(|| ChannelRecord::new(local.clone(), name.unwrap_or_default()));
                record.gc_id = Some(id.clone());
                self.storage.put_channel(&record)?;
                self.cache.record_channel(id, local);
            }
            // Message nodes are fire-and-forget facts; nothing maps back.
            Confirmation::NodeCreate { .. } => {}
            Confirmation::EdgeCreate {
                id,
                name: Relation::MemberOf,
                from,
                to,
            } => {
                self.cache.record_edge(Relation::MemberOf, from, to, id);
            }
            Confirmation::EdgeCreate {
                name: Relation::Mentions,
                ..
            } => {}
            Confirmation::EdgeDelete {
                name: Relation::MemberOf,
                from,
                to,
                ..
            } => {
                self.cache.remove_edge(Relation::MemberOf, &from, &to);
            }
            Confirmation::EdgeDelete {
                name: Relation::Mentions,
                ..
            } => {}
            // The cache reverse mapping was already rewired when the
            // node_update was emitted.
            Confirmation::NodeUpdate { .. } => {}
        }
        Ok(())
    }
}
