use std::time::Duration;

use lakeflow_compute::error::ComputeError;
use lakeflow_core::error::{JobError, JobErrorKind};
use lakeflow_store::error::StoreError;

/// Failures of one job execution, classified for the job record.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    #[error("Schema conflict on table {table}: {detail}")]
    SchemaConflict { table: String, detail: String },

    #[error("Execution timed out after {0:?}")]
    Timeout(Duration),

    #[error("Execution failed: {0}")]
    Execution(String),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::SchemaConflict { table, detail } => {
                EngineError::SchemaConflict { table, detail }
            }
            other => EngineError::Execution(other.to_string()),
        }
    }
}

impl From<ComputeError> for EngineError {
    fn from(err: ComputeError) -> Self {
        EngineError::Execution(err.to_string())
    }
}

impl From<EngineError> for JobError {
    fn from(err: EngineError) -> Self {
        let kind = match &err {
            EngineError::SchemaConflict { .. } => JobErrorKind::SchemaConflict,
            EngineError::Timeout(_) => JobErrorKind::Timeout,
            EngineError::Execution(_) => JobErrorKind::Execution,
        };
        JobError::new(kind, err.to_string())
    }
}
