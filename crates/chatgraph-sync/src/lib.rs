//! The reconciliation engine keeping a remote knowledge graph synchronized
//! with a chat workspace.
//!
//! # Architecture
//!
//! - [`cache`]: bidirectional identifier cache between the two id spaces
//! - [`connector`]: the [`GraphConnector`] coordinator -- bulk diff, bulk
//!   load, and the suggestion query
//! - event handlers (`connector` impl): incremental join/leave/create/message
//!   reactions submitting signals immediately
//! - confirmation handler (`connector` impl): folds remote-assigned ids
//!   back into local state when the scheduler reports jobs done
//! - [`queue`]: the job queue collaborator seam
//! - [`client`]: the remote graph API client seam and its reqwest
//!   implementation

pub mod cache;
pub mod client;
mod confirm;
pub mod connector;
pub mod error;
mod events;
pub mod queue;

// Re-export key types for ergonomic use.
pub use cache::IdentifierCache;
pub use client::{CollabFilterResponse, GraphApi, HttpGraphApi, Suggestion, SuggestionNode};
pub use connector::{ConnectorOptions, GraphConnector, LoadSummary, MAX_CHANNEL_SUGGESTIONS};
pub use error::SyncError;
pub use queue::{JobOutcome, JobQueue, JobQueueFactory, OutcomeGraph};
