//! Executor seam between the scheduler's worker pool and the execution
//! engine adapter.

use async_trait::async_trait;

use crate::error::JobError;
use crate::job::JobDescriptor;
use crate::types::TableVersion;

/// Executes one dispatched job to completion.
///
/// Implemented by the execution engine adapter; the worker pool only sees
/// this trait so scheduling can be tested with stub executors.
#[async_trait]
pub trait JobExecutor: Send + Sync + 'static {
    /// Run the job described by `descriptor`, returning the table version
    /// assigned by the store on success.
    async fn execute(&self, descriptor: &JobDescriptor) -> Result<TableVersion, JobError>;
}
