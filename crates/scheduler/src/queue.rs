//! Job queue with per-table write serialization.
//!
//! The queue and the table lock map live behind one mutex, so the readiness
//! check, removal, and lock acquisition are a single atomic step: two
//! workers can never dispatch jobs against the same table concurrently.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use serde::Deserialize;
use tokio::sync::Notify;

use lakeflow_core::error::CoreError;
use lakeflow_core::job::{JobDescriptor, WriteMode};
use lakeflow_core::types::JobId;

use crate::tracker::StatusTracker;

/// Submission input accepted by [`Scheduler::submit`].
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitJob {
    pub table: String,
    pub mode: WriteMode,
    pub source: String,
    pub partition_columns: Option<Vec<String>>,
}

struct SchedulerInner {
    /// Arrival-ordered queue of descriptors awaiting dispatch.
    queue: VecDeque<JobDescriptor>,
    /// Table lock tokens: at most one in-flight write per table name.
    locked_tables: HashMap<String, JobId>,
}

/// FIFO job queue plus the table lock map.
pub struct Scheduler {
    inner: Mutex<SchedulerInner>,
    tracker: Arc<StatusTracker>,
    /// Wakes worker tasks on enqueue and on lock release.
    ready: Notify,
}

impl Scheduler {
    pub fn new(tracker: Arc<StatusTracker>) -> Self {
        Self {
            inner: Mutex::new(SchedulerInner {
                queue: VecDeque::new(),
                locked_tables: HashMap::new(),
            }),
            tracker,
            ready: Notify::new(),
        }
    }

    pub fn tracker(&self) -> &Arc<StatusTracker> {
        &self.tracker
    }

    /// Validate and enqueue a job, returning its generated id.
    ///
    /// Never blocks: the job is queued in arrival order and picked up by a
    /// worker once its table is free. Fails with [`CoreError::Validation`]
    /// without enqueuing anything.
    pub fn submit(&self, input: SubmitJob) -> Result<JobId, CoreError> {
        let descriptor = JobDescriptor::new(
            input.table,
            input.mode,
            &input.source,
            input.partition_columns.unwrap_or_default(),
        )?;
        let job_id = descriptor.id;

        // The record must exist before the descriptor becomes claimable.
        self.tracker.insert_queued(descriptor.clone());
        {
            let mut inner = self.inner.lock().expect("scheduler lock poisoned");
            inner.queue.push_back(descriptor);
        }
        self.ready.notify_one();

        tracing::debug!(job_id = %job_id, "Job enqueued");
        Ok(job_id)
    }

    /// Non-blocking peek at the next ready job, removing nothing.
    ///
    /// A queued job is ready only if no other job holds the lock for its
    /// table.
    pub fn poll_next_ready(&self) -> Option<JobDescriptor> {
        let inner = self.inner.lock().expect("scheduler lock poisoned");
        inner
            .queue
            .iter()
            .find(|d| !inner.locked_tables.contains_key(&d.table))
            .cloned()
    }

    /// Atomically remove the next ready job, acquire its table lock, and
    /// move it to RUNNING.
    ///
    /// Scanning in arrival order keeps same-table jobs strictly FIFO: a
    /// later job for a table only becomes claimable once the earlier one has
    /// left the queue and released the lock.
    pub fn claim_next_ready(&self) -> Option<JobDescriptor> {
        let descriptor = {
            let mut inner = self.inner.lock().expect("scheduler lock poisoned");
            let pos = inner
                .queue
                .iter()
                .position(|d| !inner.locked_tables.contains_key(&d.table))?;
            let descriptor = inner.queue.remove(pos)?;
            inner
                .locked_tables
                .insert(descriptor.table.clone(), descriptor.id);
            descriptor
        };

        match self.tracker.mark_running(descriptor.id) {
            Ok(()) => Some(descriptor),
            Err(err) => {
                // Cancellation removes jobs from the queue under the same
                // mutex, so a claimed job must be QUEUED; anything else is a
                // bug worth surfacing loudly.
                tracing::error!(
                    job_id = %descriptor.id,
                    error = %err,
                    "Claimed job was not in QUEUED state; dropping claim"
                );
                self.release(&descriptor.table, descriptor.id);
                None
            }
        }
    }

    /// Release the table lock held by `job_id` and wake a worker.
    pub fn release(&self, table: &str, job_id: JobId) {
        {
            let mut inner = self.inner.lock().expect("scheduler lock poisoned");
            match inner.locked_tables.get(table) {
                Some(holder) if *holder == job_id => {
                    inner.locked_tables.remove(table);
                }
                _ => {
                    tracing::warn!(
                        job_id = %job_id,
                        table,
                        "Release for a lock this job does not hold"
                    );
                    return;
                }
            }
        }
        self.ready.notify_one();
    }

    /// Cancel a QUEUED job: removed before dispatch, no side effects.
    ///
    /// Jobs that have been dispatched run to a terminal state; cancelling
    /// them fails with [`CoreError::InvalidState`].
    pub fn cancel(&self, job_id: JobId) -> Result<(), CoreError> {
        {
            let mut inner = self.inner.lock().expect("scheduler lock poisoned");
            match inner.queue.iter().position(|d| d.id == job_id) {
                Some(pos) => {
                    inner.queue.remove(pos);
                }
                None => {
                    drop(inner);
                    // Confirm the id exists before rejecting. The tracker may
                    // briefly still say QUEUED while a claim is in flight, so
                    // the message talks about dispatch, not the status.
                    self.tracker.get_status(job_id)?;
                    return Err(CoreError::InvalidState(
                        "Job has already left the queue and can no longer be cancelled"
                            .to_string(),
                    ));
                }
            }
        }
        self.tracker.mark_cancelled(job_id)
    }

    /// Await a wakeup (enqueue or lock release).
    pub(crate) async fn notified(&self) {
        self.ready.notified().await;
    }

    /// Number of jobs awaiting dispatch.
    pub fn queued_len(&self) -> usize {
        self.inner.lock().expect("scheduler lock poisoned").queue.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
