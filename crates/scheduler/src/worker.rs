//! Worker pool: bounded concurrent job execution.
//!
//! `worker_count` tasks pull ready jobs off the scheduler, so the number of
//! simultaneously RUNNING jobs never exceeds the injected limit. Workers
//! stop claiming new jobs once shutdown is signalled, but a dispatched job
//! always runs to a terminal state.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use lakeflow_core::execute::JobExecutor;
use lakeflow_core::job::JobDescriptor;

use crate::queue::Scheduler;

/// Backstop re-poll interval in case a Notify wakeup is missed.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Handle to the spawned worker tasks.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
    cancel: CancellationToken,
}

impl WorkerPool {
    /// Spawn `worker_count` tasks pulling ready jobs off the scheduler.
    pub fn start(
        scheduler: Arc<Scheduler>,
        executor: Arc<dyn JobExecutor>,
        worker_count: usize,
        cancel: CancellationToken,
    ) -> Self {
        let handles = (0..worker_count)
            .map(|worker_id| {
                tokio::spawn(run_worker(
                    worker_id,
                    Arc::clone(&scheduler),
                    Arc::clone(&executor),
                    cancel.clone(),
                ))
            })
            .collect();
        Self { handles, cancel }
    }

    /// Signal shutdown and wait for in-flight jobs to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}

async fn run_worker(
    worker_id: usize,
    scheduler: Arc<Scheduler>,
    executor: Arc<dyn JobExecutor>,
    cancel: CancellationToken,
) {
    tracing::debug!(worker_id, "Worker started");
    let mut tick = tokio::time::interval(POLL_INTERVAL);
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        if cancel.is_cancelled() {
            break;
        }
        match scheduler.claim_next_ready() {
            Some(descriptor) => {
                run_one(worker_id, &scheduler, executor.as_ref(), descriptor).await;
            }
            None => {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    () = scheduler.notified() => {}
                    _ = tick.tick() => {}
                }
            }
        }
    }
    tracing::debug!(worker_id, "Worker stopped");
}

/// Drive one claimed job to a terminal state and release its table lock.
async fn run_one(
    worker_id: usize,
    scheduler: &Scheduler,
    executor: &dyn JobExecutor,
    descriptor: JobDescriptor,
) {
    let job_id = descriptor.id;
    tracing::info!(
        worker_id,
        job_id = %job_id,
        table = %descriptor.table,
        mode = %descriptor.mode,
        "Job dispatched"
    );

    match executor.execute(&descriptor).await {
        Ok(version) => {
            tracing::info!(worker_id, job_id = %job_id, version, "Job committed");
            if let Err(err) = scheduler.tracker().mark_committed(job_id, version) {
                tracing::error!(job_id = %job_id, error = %err, "Failed to record commit");
            }
        }
        Err(job_error) => {
            tracing::warn!(
                worker_id,
                job_id = %job_id,
                kind = ?job_error.kind,
                error = %job_error.message,
                "Job failed"
            );
            if let Err(err) = scheduler.tracker().mark_failed(job_id, job_error) {
                tracing::error!(job_id = %job_id, error = %err, "Failed to record failure");
            }
        }
    }

    scheduler.release(&descriptor.table, job_id);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
