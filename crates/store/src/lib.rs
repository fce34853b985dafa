//! Table store boundary: transactional, versioned table storage.
//!
//! The rest of the system only ever talks to a [`TableStore`] through
//! [`begin_write`](TableStore::begin_write) / [`WriteTransaction::commit`] /
//! [`WriteTransaction::abort`]; there is no non-transactional write path.
//! Every successful commit produces a new immutable table version, and
//! snapshot reads always observe a fully committed version.
//!
//! [`memory::MemoryTableStore`] is the in-process implementation used by the
//! service and its tests.

pub mod error;
pub mod memory;
pub mod model;

use async_trait::async_trait;

use lakeflow_core::types::TableVersion;

use error::StoreError;
use model::{RecordBatch, Row};

/// A single transactional write operation against one table.
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Add rows; the staged schema must match the current table schema.
    Append,
    /// Replace the whole table, or only the partitions present in the staged
    /// rows when partition columns are given.
    Overwrite { partition_columns: Vec<String> },
    /// Upsert rows by the given key column.
    Merge { key: String },
}

/// Read-only view of one committed table version.
#[derive(Debug, Clone)]
pub struct TableSnapshot {
    pub table: String,
    pub version: TableVersion,
    pub rows: Vec<Row>,
}

/// A versioned, transactional dataset storage capability.
#[async_trait]
pub trait TableStore: Send + Sync + 'static {
    /// Open a write transaction against `table`.
    ///
    /// Nothing becomes visible to readers until the returned transaction
    /// commits.
    async fn begin_write(
        &self,
        table: &str,
        op: WriteOp,
    ) -> Result<Box<dyn WriteTransaction>, StoreError>;

    /// Latest committed snapshot of `table`.
    ///
    /// Fails with [`StoreError::TableNotFound`] for tables that have never
    /// been written.
    async fn snapshot(&self, table: &str) -> Result<TableSnapshot, StoreError>;
}

/// One in-flight write. Commit fully lands a new version or the attempt is
/// discarded; there is no partial visibility.
#[async_trait]
pub trait WriteTransaction: Send {
    /// Buffer rows into the transaction.
    fn stage(&mut self, batch: RecordBatch) -> Result<(), StoreError>;

    /// Atomically apply the staged rows, returning the new table version.
    async fn commit(self: Box<Self>) -> Result<TableVersion, StoreError>;

    /// Discard the transaction. Staged rows are never visible.
    async fn abort(self: Box<Self>);
}
