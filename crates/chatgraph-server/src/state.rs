//! Application state: one connector and one scheduler per workspace.
//!
//! [`AppState`] wraps the connector in `Arc<tokio::sync::Mutex<>>` for use
//! with axum handlers. The async Mutex realizes the connector's cooperative
//! single-writer model: every handler (and the scheduler's confirmation
//! delivery) acquires the lock and runs to completion, so storage and the
//! identifier cache never see interleaved mutation.

use std::sync::Arc;

use tokio::sync::Mutex;

use chatgraph_storage::{InMemoryStore, SqliteStore, TeamStore};
use chatgraph_sync::{
    ConnectorOptions, GraphApi, GraphConnector, HttpGraphApi, JobQueue,
};

use crate::error::ApiError;
use crate::scheduler::SignalScheduler;

/// Runtime configuration, read from the environment by `main`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: String,
    pub graph_id: String,
    pub api_base: String,
    pub api_token: Option<String>,
}

/// Shared application state for the HTTP server.
#[derive(Clone)]
pub struct AppState {
    /// The workspace's reconciliation engine (async Mutex -- handlers and
    /// the scheduler worker take turns without blocking the runtime).
    pub connector: Arc<Mutex<GraphConnector>>,
    /// The job scheduler executing signals against the remote graph.
    pub scheduler: Arc<SignalScheduler>,
}

impl AppState {
    /// Creates an `AppState` backed by a SQLite store and the HTTP graph
    /// API client.
    pub fn new(config: &AppConfig) -> Result<Self, ApiError> {
        let storage = SqliteStore::new(&config.db_path)?;
        let api: Arc<dyn GraphApi> = Arc::new(HttpGraphApi::new(
            config.api_base.as_str(),
            config.api_token.clone(),
        ));
        Self::with_parts(Box::new(storage), api, config.graph_id.clone())
    }

    /// Creates an `AppState` with an in-memory store and the given API
    /// implementation (for testing).
    pub fn in_memory(api: Arc<dyn GraphApi>, graph_id: &str) -> Result<Self, ApiError> {
        Self::with_parts(Box::new(InMemoryStore::new()), api, graph_id.to_string())
    }

    /// Wires connector, scheduler, and worker together. Must run inside a
    /// tokio runtime (the worker task is spawned here).
    pub fn with_parts(
        storage: Box<dyn TeamStore>,
        api: Arc<dyn GraphApi>,
        graph_id: String,
    ) -> Result<Self, ApiError> {
        let (scheduler, rx) = SignalScheduler::new();

        let queue = Arc::clone(&scheduler);
        let connector = GraphConnector::new(ConnectorOptions {
            storage,
            cache: None,
            graph_id: graph_id.clone(),
            queues: Arc::new(move || Arc::clone(&queue) as Arc<dyn JobQueue>),
            api: Arc::clone(&api),
        })?;
        let connector = Arc::new(Mutex::new(connector));

        scheduler.spawn_worker(rx, Arc::clone(&connector), api, graph_id);

        Ok(AppState {
            connector,
            scheduler,
        })
    }
}
