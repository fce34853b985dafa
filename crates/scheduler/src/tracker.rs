//! Status tracker: the process-wide job registry.
//!
//! Owns every job record for the lifetime of the process. All access is
//! funneled through this synchronized interface; transitions are checked
//! against the state machine, so a terminal record can never change again.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;

use lakeflow_core::error::{CoreError, JobError};
use lakeflow_core::job::JobDescriptor;
use lakeflow_core::record::JobRecord;
use lakeflow_core::status::{self, JobStatus};
use lakeflow_core::types::{JobId, TableVersion};

#[derive(Default)]
pub struct StatusTracker {
    jobs: RwLock<HashMap<JobId, JobRecord>>,
}

impl StatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly accepted descriptor as QUEUED.
    pub(crate) fn insert_queued(&self, descriptor: JobDescriptor) {
        let mut jobs = self.jobs.write().expect("job registry lock poisoned");
        jobs.insert(descriptor.id, JobRecord::queued(descriptor));
    }

    /// Non-blocking lookup of a job's current record.
    pub fn get_status(&self, job_id: JobId) -> Result<JobRecord, CoreError> {
        let jobs = self.jobs.read().expect("job registry lock poisoned");
        jobs.get(&job_id).cloned().ok_or(CoreError::NotFound {
            entity: "Job",
            id: job_id,
        })
    }

    /// Total number of registered jobs, in any state.
    pub fn job_count(&self) -> usize {
        self.jobs.read().expect("job registry lock poisoned").len()
    }

    pub(crate) fn mark_running(&self, job_id: JobId) -> Result<(), CoreError> {
        self.transition(job_id, JobStatus::Running, |record| {
            record.started_at = Some(Utc::now());
        })
    }

    pub(crate) fn mark_committed(
        &self,
        job_id: JobId,
        version: TableVersion,
    ) -> Result<(), CoreError> {
        self.transition(job_id, JobStatus::Committed, |record| {
            record.finished_at = Some(Utc::now());
            record.result_version = Some(version);
        })
    }

    pub(crate) fn mark_failed(&self, job_id: JobId, error: JobError) -> Result<(), CoreError> {
        self.transition(job_id, JobStatus::Failed, |record| {
            record.finished_at = Some(Utc::now());
            record.error = Some(error);
        })
    }

    pub(crate) fn mark_cancelled(&self, job_id: JobId) -> Result<(), CoreError> {
        self.transition(job_id, JobStatus::Cancelled, |record| {
            record.finished_at = Some(Utc::now());
        })
    }

    /// Apply a validated transition plus its record updates atomically.
    fn transition(
        &self,
        job_id: JobId,
        to: JobStatus,
        apply: impl FnOnce(&mut JobRecord),
    ) -> Result<(), CoreError> {
        let mut jobs = self.jobs.write().expect("job registry lock poisoned");
        let record = jobs.get_mut(&job_id).ok_or(CoreError::NotFound {
            entity: "Job",
            id: job_id,
        })?;
        status::validate_transition(record.status, to)?;
        record.status = to;
        apply(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use lakeflow_core::error::JobErrorKind;
    use lakeflow_core::job::WriteMode;

    fn tracker_with_job() -> (StatusTracker, JobId) {
        let tracker = StatusTracker::new();
        let descriptor =
            JobDescriptor::new("t".to_string(), WriteMode::Append, "s", vec![]).unwrap();
        let id = descriptor.id;
        tracker.insert_queued(descriptor);
        (tracker, id)
    }

    #[test]
    fn queued_record_has_no_timestamps() {
        let (tracker, id) = tracker_with_job();
        let record = tracker.get_status(id).unwrap();
        assert_eq!(record.status, JobStatus::Queued);
        assert!(record.started_at.is_none());
        assert!(record.finished_at.is_none());
    }

    #[test]
    fn unknown_job_is_not_found() {
        let tracker = StatusTracker::new();
        let err = tracker.get_status(uuid::Uuid::now_v7()).unwrap_err();
        assert_matches!(err, CoreError::NotFound { .. });
    }

    #[test]
    fn committed_record_has_version_and_no_error() {
        let (tracker, id) = tracker_with_job();
        tracker.mark_running(id).unwrap();
        tracker.mark_committed(id, 3).unwrap();

        let record = tracker.get_status(id).unwrap();
        assert_eq!(record.status, JobStatus::Committed);
        assert_eq!(record.result_version, Some(3));
        assert!(record.error.is_none());
        assert!(record.started_at.is_some());
        assert!(record.finished_at.is_some());
    }

    #[test]
    fn failed_record_has_error_and_no_version() {
        let (tracker, id) = tracker_with_job();
        tracker.mark_running(id).unwrap();
        tracker
            .mark_failed(id, JobError::new(JobErrorKind::Execution, "boom"))
            .unwrap();

        let record = tracker.get_status(id).unwrap();
        assert_eq!(record.status, JobStatus::Failed);
        assert!(record.error.is_some());
        assert!(record.result_version.is_none());
    }

    #[test]
    fn terminal_record_cannot_transition_again() {
        let (tracker, id) = tracker_with_job();
        tracker.mark_running(id).unwrap();
        tracker.mark_committed(id, 0).unwrap();

        let err = tracker
            .mark_failed(id, JobError::new(JobErrorKind::Execution, "late"))
            .unwrap_err();
        assert_matches!(err, CoreError::InvalidState(_));

        // The record is untouched by the rejected transition.
        let record = tracker.get_status(id).unwrap();
        assert_eq!(record.status, JobStatus::Committed);
        assert!(record.error.is_none());
    }

    #[test]
    fn running_cannot_be_cancelled() {
        let (tracker, id) = tracker_with_job();
        tracker.mark_running(id).unwrap();
        let err = tracker.mark_cancelled(id).unwrap_err();
        assert_matches!(err, CoreError::InvalidState(_));
    }

    #[test]
    fn get_status_is_idempotent_for_terminal_jobs() {
        let (tracker, id) = tracker_with_job();
        tracker.mark_running(id).unwrap();
        tracker.mark_committed(id, 7).unwrap();

        let first = tracker.get_status(id).unwrap();
        let second = tracker.get_status(id).unwrap();
        assert_eq!(first.status, second.status);
        assert_eq!(first.result_version, second.result_version);
        assert_eq!(first.finished_at, second.finished_at);
    }
}
