//! The tokio-based signal scheduler.
//!
//! [`SignalScheduler`] is the production [`JobQueue`]: submissions enqueue
//! onto an unbounded channel, a background worker executes each job against
//! the remote graph API, and the completion payload is delivered to the
//! connector's confirmation handler under the workspace lock. Job records
//! are kept in a concurrent map for the status endpoint.
//!
//! No retries happen here: a failed job is recorded and logged, and the
//! next full reconciliation pass re-derives whatever is still missing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::{mpsc, Mutex};
use tracing::warn;
use uuid::Uuid;

use chatgraph_core::signal::Signal;
use chatgraph_sync::{GraphApi, GraphConnector, JobQueue};

/// A job waiting for the worker.
#[derive(Debug)]
pub struct QueuedJob {
    pub id: Uuid,
    pub signals: Vec<Signal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Completed,
    Failed,
}

/// Status record for one submitted job.
#[derive(Debug, Clone, Serialize)]
pub struct JobRecord {
    pub id: Uuid,
    pub seq: u64,
    pub status: JobStatus,
    /// Number of signals in the job.
    pub signals: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Queue front-end plus job bookkeeping. The worker half is spawned
/// separately via [`SignalScheduler::spawn_worker`] once the connector
/// exists (the two reference each other only through `Arc`s).
pub struct SignalScheduler {
    tx: mpsc::UnboundedSender<QueuedJob>,
    jobs: DashMap<Uuid, JobRecord>,
    seq: AtomicU64,
}

impl SignalScheduler {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<QueuedJob>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Arc::new(SignalScheduler {
                tx,
                jobs: DashMap::new(),
                seq: AtomicU64::new(0),
            }),
            rx,
        )
    }

    /// Starts the background worker draining the queue.
    pub fn spawn_worker(
        self: &Arc<Self>,
        mut rx: mpsc::UnboundedReceiver<QueuedJob>,
        connector: Arc<Mutex<GraphConnector>>,
        api: Arc<dyn GraphApi>,
        graph_id: String,
    ) {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                match api.apply_signals(&graph_id, &job.signals).await {
                    Ok(outcome) => {
                        let folded = {
                            let mut connector = connector.lock().await;
                            connector.on_job_done(&outcome)
                        };
                        match folded {
                            Ok(()) => scheduler.mark(job.id, JobStatus::Completed, None),
                            Err(err) => {
                                warn!(job = %job.id, error = %err, "confirmation handling failed");
                                scheduler.mark(job.id, JobStatus::Failed, Some(err.to_string()));
                            }
                        }
                    }
                    Err(err) => {
                        warn!(job = %job.id, error = %err, "signal execution failed");
                        scheduler.mark(job.id, JobStatus::Failed, Some(err.to_string()));
                    }
                }
            }
        });
    }

    fn mark(&self, id: Uuid, status: JobStatus, error: Option<String>) {
        if let Some(mut record) = self.jobs.get_mut(&id) {
            record.status = status;
            record.error = error;
        }
    }

    /// All job records in submission order.
    pub fn jobs(&self) -> Vec<JobRecord> {
        let mut all: Vec<JobRecord> = self.jobs.iter().map(|r| r.value().clone()).collect();
        all.sort_by_key(|r| r.seq);
        all
    }
}

impl JobQueue for SignalScheduler {
    fn add_job(&self, signals: Vec<Signal>) {
        let id = Uuid::new_v4();
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        self.jobs.insert(
            id,
            JobRecord {
                id,
                seq,
                status: JobStatus::Queued,
                signals: signals.len(),
                error: None,
            },
        );
        if self.tx.send(QueuedJob { id, signals }).is_err() {
            warn!(job = %id, "scheduler worker is gone; job dropped");
            self.mark(id, JobStatus::Failed, Some("scheduler worker unavailable".to_string()));
        }
    }
}
