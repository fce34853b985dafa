//! Compute capability boundary.
//!
//! The engine resolves a job's source reference into records through the
//! [`Compute`] trait; the call is opaque and potentially long-running, and
//! the engine owns the execution deadline. [`local::LocalCompute`] is the
//! in-process implementation for local and dev deployments.

pub mod error;
pub mod local;

use async_trait::async_trait;

use lakeflow_core::job::SourceRef;
use lakeflow_store::model::RecordBatch;

use error::ComputeError;

/// Distributed compute capability: resolve a source reference into records.
#[async_trait]
pub trait Compute: Send + Sync + 'static {
    async fn run(&self, source: &SourceRef) -> Result<RecordBatch, ComputeError>;
}
