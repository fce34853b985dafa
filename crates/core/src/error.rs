use serde::{Deserialize, Serialize};

use crate::types::JobId;

/// Domain-level errors surfaced synchronously to callers.
///
/// Everything that can go wrong *after* a job has been dispatched is never
/// raised across the async boundary; it is recorded on the job record as a
/// [`JobError`] and observed by polling.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: JobId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error payload recorded on a FAILED job record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobError {
    pub kind: JobErrorKind,
    pub message: String,
}

impl JobError {
    pub fn new(kind: JobErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Classification of post-dispatch failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobErrorKind {
    /// Source and target schemas diverge irreconcilably.
    SchemaConflict,
    /// Compute or transactional failure.
    Execution,
    /// The configured execution deadline was exceeded.
    Timeout,
}
