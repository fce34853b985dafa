//! Job records: the mutable lifecycle wrapper around a descriptor.

use serde::Serialize;

use crate::error::JobError;
use crate::job::JobDescriptor;
use crate::status::JobStatus;
use crate::types::{TableVersion, Timestamp};

/// Lifecycle state of one submitted job.
///
/// Owned exclusively by the status tracker; everything else holds only the
/// descriptor. A COMMITTED record carries a `result_version` and no error,
/// a FAILED record carries an error and no version.
#[derive(Debug, Clone, Serialize)]
pub struct JobRecord {
    pub descriptor: JobDescriptor,
    pub status: JobStatus,
    pub started_at: Option<Timestamp>,
    pub finished_at: Option<Timestamp>,
    pub error: Option<JobError>,
    pub result_version: Option<TableVersion>,
}

impl JobRecord {
    /// Fresh record for a just-accepted descriptor.
    pub fn queued(descriptor: JobDescriptor) -> Self {
        Self {
            descriptor,
            status: JobStatus::Queued,
            started_at: None,
            finished_at: None,
            error: None,
            result_version: None,
        }
    }
}
