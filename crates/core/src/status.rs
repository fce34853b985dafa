//! Job lifecycle state machine.
//!
//! `QUEUED -> RUNNING -> {COMMITTED | FAILED}`, plus `QUEUED -> CANCELLED`
//! for pre-dispatch cancellation. Terminal states have no outgoing
//! transitions: a failed job is resubmitted as a new descriptor, never
//! retried in place, so job ids stay immutable and auditable.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Lifecycle state of a job record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Committed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Terminal states never transition again.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Committed | JobStatus::Failed | JobStatus::Cancelled
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Committed => "committed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns the set of valid target states reachable from `from`.
pub fn valid_transitions(from: JobStatus) -> &'static [JobStatus] {
    match from {
        JobStatus::Queued => &[JobStatus::Running, JobStatus::Cancelled],
        JobStatus::Running => &[JobStatus::Committed, JobStatus::Failed],
        JobStatus::Committed | JobStatus::Failed | JobStatus::Cancelled => &[],
    }
}

/// Check whether a transition from `from` to `to` is valid.
pub fn can_transition(from: JobStatus, to: JobStatus) -> bool {
    valid_transitions(from).contains(&to)
}

/// Validate a state transition, returning [`CoreError::InvalidState`] for
/// invalid ones.
pub fn validate_transition(from: JobStatus, to: JobStatus) -> Result<(), CoreError> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(CoreError::InvalidState(format!(
            "Invalid transition: {from} -> {to}"
        )))
    }
}
