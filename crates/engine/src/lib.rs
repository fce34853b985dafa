//! Execution engine adapter.
//!
//! Translates a job descriptor into one logical transaction against the
//! table store: resolve the source through the compute capability, stage
//! the records, commit. Any failure after `begin_write` aborts the
//! transaction, so no partial data is ever visible; there is no
//! non-transactional fallback write path.

pub mod error;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use lakeflow_compute::Compute;
use lakeflow_core::error::JobError;
use lakeflow_core::execute::JobExecutor;
use lakeflow_core::job::{JobDescriptor, WriteMode};
use lakeflow_core::types::TableVersion;
use lakeflow_store::{TableStore, WriteOp};

use error::EngineError;

/// Execution tunables.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Hard deadline for one job (compute plus commit).
    pub execution_timeout: Duration,
    /// Upsert key column for merge-mode jobs.
    pub merge_key: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            execution_timeout: Duration::from_secs(600),
            merge_key: "id".to_string(),
        }
    }
}

/// Turns descriptors into committed table versions.
pub struct ExecutionEngine {
    store: Arc<dyn TableStore>,
    compute: Arc<dyn Compute>,
    config: EngineConfig,
}

impl ExecutionEngine {
    pub fn new(store: Arc<dyn TableStore>, compute: Arc<dyn Compute>, config: EngineConfig) -> Self {
        Self {
            store,
            compute,
            config,
        }
    }

    /// Execute one descriptor under the configured deadline.
    ///
    /// On success returns the new table version assigned by the store; this
    /// is the unit of observability for downstream readers.
    pub async fn execute(&self, descriptor: &JobDescriptor) -> Result<TableVersion, EngineError> {
        let deadline = self.config.execution_timeout;
        match tokio::time::timeout(deadline, self.execute_inner(descriptor)).await {
            Ok(result) => result,
            Err(_) => Err(EngineError::Timeout(deadline)),
        }
    }

    async fn execute_inner(&self, descriptor: &JobDescriptor) -> Result<TableVersion, EngineError> {
        let batch = self.compute.run(&descriptor.source).await?;
        tracing::debug!(
            job_id = %descriptor.id,
            table = %descriptor.table,
            rows = batch.len(),
            "Source resolved, opening write transaction"
        );

        let mut txn = self
            .store
            .begin_write(&descriptor.table, self.write_op(descriptor))
            .await?;

        if let Err(err) = txn.stage(batch) {
            txn.abort().await;
            return Err(err.into());
        }

        let version = txn.commit().await?;
        tracing::debug!(
            job_id = %descriptor.id,
            table = %descriptor.table,
            version,
            "Transaction committed"
        );
        Ok(version)
    }

    /// Translate the descriptor's write mode into the store's operation.
    fn write_op(&self, descriptor: &JobDescriptor) -> WriteOp {
        match descriptor.mode {
            WriteMode::Append => WriteOp::Append,
            WriteMode::Overwrite => WriteOp::Overwrite {
                partition_columns: descriptor.partition_columns.clone(),
            },
            WriteMode::Merge => WriteOp::Merge {
                key: self.config.merge_key.clone(),
            },
        }
    }
}

#[async_trait]
impl JobExecutor for ExecutionEngine {
    async fn execute(&self, descriptor: &JobDescriptor) -> Result<TableVersion, JobError> {
        ExecutionEngine::execute(self, descriptor)
            .await
            .map_err(JobError::from)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
