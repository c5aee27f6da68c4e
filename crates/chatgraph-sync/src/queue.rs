//! The job queue collaborator interface.
//!
//! Signals are not executed inline: they are handed to an external
//! scheduler as jobs and run against the remote graph API asynchronously.
//! The connector is parameterized by a [`JobQueueFactory`] rather than a
//! queue instance, so callers can route each submission (per workspace,
//! per tenant) at the moment it happens.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use chatgraph_core::signal::Signal;

/// A sink accepting signal batches for asynchronous execution.
///
/// Delivery semantics (retries, timeouts, ordering) belong to the
/// implementation; the connector only promises that submitted signals are
/// immutable.
pub trait JobQueue: Send + Sync {
    /// Submits one job. A single-signal job is a one-element batch.
    fn add_job(&self, signals: Vec<Signal>);
}

/// Yields the queue a submission should go to.
pub trait JobQueueFactory: Send + Sync {
    fn queue(&self) -> Arc<dyn JobQueue>;
}

impl<F> JobQueueFactory for F
where
    F: Fn() -> Arc<dyn JobQueue> + Send + Sync,
{
    fn queue(&self) -> Arc<dyn JobQueue> {
        (self)()
    }
}

/// The completion payload the scheduler delivers once a job has executed
/// against the remote graph: the submitted signals echoed back with
/// remote-assigned identifiers.
///
/// Entries stay raw JSON here; [`Confirmation::parse`] decides per entry
/// whether the shape is one this connector understands.
///
/// [`Confirmation::parse`]: chatgraph_core::signal::Confirmation::parse
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobOutcome {
    pub graph: OutcomeGraph,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutcomeGraph {
    #[serde(default)]
    pub signals: Vec<serde_json::Value>,
}

impl JobOutcome {
    pub fn new(signals: Vec<serde_json::Value>) -> Self {
        JobOutcome {
            graph: OutcomeGraph { signals },
        }
    }
}
