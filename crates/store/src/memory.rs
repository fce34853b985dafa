//! In-memory table store with per-table version history.
//!
//! Commits are applied atomically under a write lock; snapshots clone the
//! latest committed version, so readers never observe a partial write.
//! State lives for the lifetime of the process and is cleared only on
//! shutdown.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use lakeflow_core::types::TableVersion;
use serde_json::Value;

use crate::error::StoreError;
use crate::model::{RecordBatch, Row, Schema};
use crate::{TableSnapshot, TableStore, WriteOp, WriteTransaction};

/// One committed version of a table.
#[derive(Debug, Clone)]
struct CommittedVersion {
    version: TableVersion,
    rows: Vec<Row>,
}

#[derive(Debug, Default)]
struct TableState {
    versions: Vec<CommittedVersion>,
}

impl TableState {
    fn latest(&self) -> Option<&CommittedVersion> {
        self.versions.last()
    }

    fn next_version(&self) -> TableVersion {
        self.latest().map_or(0, |v| v.version + 1)
    }

    /// Schema of the latest committed version, or `None` if the table has
    /// never held a row.
    fn schema(&self) -> Option<Schema> {
        self.latest()
            .and_then(|v| v.rows.first())
            .map(Schema::of_row)
    }
}

/// Process-local [`TableStore`] implementation.
#[derive(Default)]
pub struct MemoryTableStore {
    tables: Arc<RwLock<HashMap<String, TableState>>>,
}

impl MemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tables that have received at least one commit.
    pub fn table_count(&self) -> usize {
        self.tables.read().expect("table store lock poisoned").len()
    }
}

#[async_trait]
impl TableStore for MemoryTableStore {
    async fn begin_write(
        &self,
        table: &str,
        op: WriteOp,
    ) -> Result<Box<dyn WriteTransaction>, StoreError> {
        Ok(Box::new(MemoryTransaction {
            tables: Arc::clone(&self.tables),
            table: table.to_string(),
            op,
            staged: RecordBatch::default(),
        }))
    }

    async fn snapshot(&self, table: &str) -> Result<TableSnapshot, StoreError> {
        let tables = self.tables.read().expect("table store lock poisoned");
        let state = tables
            .get(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
        let latest = state
            .latest()
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
        Ok(TableSnapshot {
            table: table.to_string(),
            version: latest.version,
            rows: latest.rows.clone(),
        })
    }
}

/// Buffered write against a [`MemoryTableStore`].
struct MemoryTransaction {
    tables: Arc<RwLock<HashMap<String, TableState>>>,
    table: String,
    op: WriteOp,
    staged: RecordBatch,
}

#[async_trait]
impl WriteTransaction for MemoryTransaction {
    fn stage(&mut self, batch: RecordBatch) -> Result<(), StoreError> {
        self.staged.rows.extend(batch.rows);
        // Reject ragged batches at stage time, before the commit lock.
        self.staged.uniform_schema(&self.table)?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<TableVersion, StoreError> {
        let staged_schema = self.staged.uniform_schema(&self.table)?;

        let mut tables = self.tables.write().expect("table store lock poisoned");
        let state = tables.entry(self.table.clone()).or_default();

        let rows = match &self.op {
            WriteOp::Append => apply_append(&self.table, state, &self.staged, &staged_schema)?,
            WriteOp::Overwrite { partition_columns } => apply_overwrite(
                &self.table,
                state,
                &self.staged,
                &staged_schema,
                partition_columns,
            )?,
            WriteOp::Merge { key } => {
                apply_merge(&self.table, state, &self.staged, &staged_schema, key)?
            }
        };

        let version = state.next_version();
        state.versions.push(CommittedVersion { version, rows });
        Ok(version)
    }

    async fn abort(self: Box<Self>) {
        // Staged rows were never visible; dropping them is the whole story.
    }
}

// ---------------------------------------------------------------------------
// Commit operations
// ---------------------------------------------------------------------------

fn schema_conflict(table: &str, detail: String) -> StoreError {
    StoreError::SchemaConflict {
        table: table.to_string(),
        detail,
    }
}

/// Existing rows plus the staged rows; schemas must agree.
fn apply_append(
    table: &str,
    state: &TableState,
    staged: &RecordBatch,
    staged_schema: &Option<Schema>,
) -> Result<Vec<Row>, StoreError> {
    check_schema_match(table, state, staged_schema)?;
    let mut rows = state.latest().map(|v| v.rows.clone()).unwrap_or_default();
    rows.extend(staged.rows.iter().cloned());
    Ok(rows)
}

/// Replace the whole table, or only the staged partitions when partition
/// columns are given (dynamic partition overwrite).
///
/// A whole-table overwrite may redefine the schema; a partition overwrite
/// may not, since surviving rows from other partitions stay in place.
fn apply_overwrite(
    table: &str,
    state: &TableState,
    staged: &RecordBatch,
    staged_schema: &Option<Schema>,
    partition_columns: &[String],
) -> Result<Vec<Row>, StoreError> {
    if partition_columns.is_empty() {
        return Ok(staged.rows.clone());
    }
    check_schema_match(table, state, staged_schema)?;

    if let Some(schema) = staged_schema {
        for column in partition_columns {
            if !schema.contains(column) {
                return Err(schema_conflict(
                    table,
                    format!("staged rows are missing partition column \"{column}\""),
                ));
            }
        }
    }

    let staged_partitions: HashSet<Vec<Value>> = staged
        .rows
        .iter()
        .map(|row| partition_key(row, partition_columns))
        .collect();

    let mut rows: Vec<Row> = state
        .latest()
        .map(|v| {
            v.rows
                .iter()
                .filter(|row| !staged_partitions.contains(&partition_key(row, partition_columns)))
                .cloned()
                .collect()
        })
        .unwrap_or_default();
    rows.extend(staged.rows.iter().cloned());
    Ok(rows)
}

/// Upsert staged rows by `key`: rows with a matching key value replace the
/// existing row in place, the rest are appended in staged order.
fn apply_merge(
    table: &str,
    state: &TableState,
    staged: &RecordBatch,
    staged_schema: &Option<Schema>,
    key: &str,
) -> Result<Vec<Row>, StoreError> {
    check_schema_match(table, state, staged_schema)?;

    if let Some(schema) = staged_schema {
        if !schema.contains(key) {
            return Err(schema_conflict(
                table,
                format!("staged rows are missing merge key \"{key}\""),
            ));
        }
    }

    let mut rows = state.latest().map(|v| v.rows.clone()).unwrap_or_default();
    for staged_row in &staged.rows {
        let staged_key = staged_row.get(key);
        match rows.iter_mut().find(|row| row.get(key) == staged_key) {
            Some(existing) => *existing = staged_row.clone(),
            None => rows.push(staged_row.clone()),
        }
    }
    Ok(rows)
}

/// Fail when a non-empty table and a non-empty staged batch disagree on
/// their column sets.
fn check_schema_match(
    table: &str,
    state: &TableState,
    staged_schema: &Option<Schema>,
) -> Result<(), StoreError> {
    if let (Some(existing), Some(staged)) = (state.schema(), staged_schema) {
        if existing != *staged {
            return Err(schema_conflict(
                table,
                format!(
                    "table columns [{}] do not match staged columns [{}]",
                    existing.describe(),
                    staged.describe()
                ),
            ));
        }
    }
    Ok(())
}

fn partition_key(row: &Row, partition_columns: &[String]) -> Vec<Value> {
    partition_columns
        .iter()
        .map(|c| row.get(c).cloned().unwrap_or(Value::Null))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn batch(rows: Vec<Row>) -> RecordBatch {
        RecordBatch::new(rows)
    }

    async fn commit(
        store: &MemoryTableStore,
        table: &str,
        op: WriteOp,
        rows: Vec<Row>,
    ) -> Result<TableVersion, StoreError> {
        let mut txn = store.begin_write(table, op).await?;
        txn.stage(batch(rows))?;
        txn.commit().await
    }

    // -- append ---------------------------------------------------------------

    #[tokio::test]
    async fn first_append_creates_table_at_version_zero() {
        let store = MemoryTableStore::new();
        let v = commit(
            &store,
            "t",
            WriteOp::Append,
            vec![row(&[("id", json!(1))])],
        )
        .await
        .unwrap();
        assert_eq!(v, 0);

        let snap = store.snapshot("t").await.unwrap();
        assert_eq!(snap.version, 0);
        assert_eq!(snap.rows.len(), 1);
    }

    #[tokio::test]
    async fn append_increments_version_and_keeps_rows() {
        let store = MemoryTableStore::new();
        commit(&store, "t", WriteOp::Append, vec![row(&[("id", json!(1))])])
            .await
            .unwrap();
        let v = commit(&store, "t", WriteOp::Append, vec![row(&[("id", json!(2))])])
            .await
            .unwrap();
        assert_eq!(v, 1);

        let snap = store.snapshot("t").await.unwrap();
        assert_eq!(snap.rows.len(), 2);
    }

    #[tokio::test]
    async fn append_with_mismatched_schema_rejected() {
        let store = MemoryTableStore::new();
        commit(&store, "t", WriteOp::Append, vec![row(&[("id", json!(1))])])
            .await
            .unwrap();
        let err = commit(
            &store,
            "t",
            WriteOp::Append,
            vec![row(&[("other", json!(1))])],
        )
        .await
        .unwrap_err();
        assert_matches!(err, StoreError::SchemaConflict { .. });

        // The failed attempt must not have produced a version.
        assert_eq!(store.snapshot("t").await.unwrap().version, 0);
    }

    // -- overwrite ------------------------------------------------------------

    #[tokio::test]
    async fn overwrite_replaces_all_rows() {
        let store = MemoryTableStore::new();
        commit(
            &store,
            "t",
            WriteOp::Append,
            vec![row(&[("id", json!(1))]), row(&[("id", json!(2))])],
        )
        .await
        .unwrap();
        let v = commit(
            &store,
            "t",
            WriteOp::Overwrite {
                partition_columns: vec![],
            },
            vec![row(&[("id", json!(9))])],
        )
        .await
        .unwrap();
        assert_eq!(v, 1);

        let snap = store.snapshot("t").await.unwrap();
        assert_eq!(snap.rows.len(), 1);
        assert_eq!(snap.rows[0]["id"], json!(9));
    }

    #[tokio::test]
    async fn partition_overwrite_replaces_only_staged_partitions() {
        let store = MemoryTableStore::new();
        commit(
            &store,
            "t",
            WriteOp::Append,
            vec![
                row(&[("day", json!("mon")), ("n", json!(1))]),
                row(&[("day", json!("tue")), ("n", json!(2))]),
            ],
        )
        .await
        .unwrap();

        commit(
            &store,
            "t",
            WriteOp::Overwrite {
                partition_columns: vec!["day".to_string()],
            },
            vec![row(&[("day", json!("mon")), ("n", json!(10))])],
        )
        .await
        .unwrap();

        let snap = store.snapshot("t").await.unwrap();
        assert_eq!(snap.rows.len(), 2);
        let mon = snap
            .rows
            .iter()
            .find(|r| r["day"] == json!("mon"))
            .unwrap();
        assert_eq!(mon["n"], json!(10));
        let tue = snap
            .rows
            .iter()
            .find(|r| r["day"] == json!("tue"))
            .unwrap();
        assert_eq!(tue["n"], json!(2));
    }

    #[tokio::test]
    async fn partition_overwrite_with_diverged_schema_rejected() {
        let store = MemoryTableStore::new();
        commit(
            &store,
            "t",
            WriteOp::Append,
            vec![
                row(&[("day", json!("mon")), ("n", json!(1))]),
                row(&[("day", json!("tue")), ("n", json!(2))]),
            ],
        )
        .await
        .unwrap();

        // Staged rows carry an extra column; letting them land would leave
        // one committed version with mixed column sets.
        let err = commit(
            &store,
            "t",
            WriteOp::Overwrite {
                partition_columns: vec!["day".to_string()],
            },
            vec![row(&[("day", json!("mon")), ("n", json!(10)), ("x", json!(true))])],
        )
        .await
        .unwrap_err();
        assert_matches!(err, StoreError::SchemaConflict { .. });

        // No version was produced and every committed row kept one schema.
        let snap = store.snapshot("t").await.unwrap();
        assert_eq!(snap.version, 0);
        assert!(snap.rows.iter().all(|r| r.len() == 2));
    }

    #[tokio::test]
    async fn partition_overwrite_requires_partition_column() {
        let store = MemoryTableStore::new();
        let err = commit(
            &store,
            "t",
            WriteOp::Overwrite {
                partition_columns: vec!["day".to_string()],
            },
            vec![row(&[("n", json!(1))])],
        )
        .await
        .unwrap_err();
        assert_matches!(err, StoreError::SchemaConflict { .. });
    }

    // -- merge ----------------------------------------------------------------

    #[tokio::test]
    async fn merge_upserts_by_key() {
        let store = MemoryTableStore::new();
        commit(
            &store,
            "t",
            WriteOp::Append,
            vec![
                row(&[("id", json!(1)), ("v", json!("a"))]),
                row(&[("id", json!(2)), ("v", json!("b"))]),
            ],
        )
        .await
        .unwrap();

        commit(
            &store,
            "t",
            WriteOp::Merge {
                key: "id".to_string(),
            },
            vec![
                row(&[("id", json!(2)), ("v", json!("b2"))]),
                row(&[("id", json!(3)), ("v", json!("c"))]),
            ],
        )
        .await
        .unwrap();

        let snap = store.snapshot("t").await.unwrap();
        assert_eq!(snap.rows.len(), 3);
        let two = snap.rows.iter().find(|r| r["id"] == json!(2)).unwrap();
        assert_eq!(two["v"], json!("b2"));
    }

    #[tokio::test]
    async fn merge_without_key_column_rejected() {
        let store = MemoryTableStore::new();
        let err = commit(
            &store,
            "t",
            WriteOp::Merge {
                key: "id".to_string(),
            },
            vec![row(&[("v", json!("a"))])],
        )
        .await
        .unwrap_err();
        assert_matches!(err, StoreError::SchemaConflict { .. });
    }

    #[tokio::test]
    async fn merge_with_diverged_schema_rejected() {
        let store = MemoryTableStore::new();
        commit(
            &store,
            "t",
            WriteOp::Append,
            vec![row(&[("id", json!(1)), ("v", json!("a"))])],
        )
        .await
        .unwrap();
        let err = commit(
            &store,
            "t",
            WriteOp::Merge {
                key: "id".to_string(),
            },
            vec![row(&[("id", json!(1)), ("w", json!("x"))])],
        )
        .await
        .unwrap_err();
        assert_matches!(err, StoreError::SchemaConflict { .. });
    }

    // -- abort / snapshot -----------------------------------------------------

    #[tokio::test]
    async fn abort_leaves_table_unchanged() {
        let store = MemoryTableStore::new();
        commit(&store, "t", WriteOp::Append, vec![row(&[("id", json!(1))])])
            .await
            .unwrap();

        let mut txn = store.begin_write("t", WriteOp::Append).await.unwrap();
        txn.stage(batch(vec![row(&[("id", json!(2))])])).unwrap();
        txn.abort().await;

        let snap = store.snapshot("t").await.unwrap();
        assert_eq!(snap.version, 0);
        assert_eq!(snap.rows.len(), 1);
    }

    #[tokio::test]
    async fn snapshot_of_unknown_table_fails() {
        let store = MemoryTableStore::new();
        let err = store.snapshot("missing").await.unwrap_err();
        assert_matches!(err, StoreError::TableNotFound(_));
    }

    #[tokio::test]
    async fn snapshot_is_isolated_from_later_commits() {
        let store = MemoryTableStore::new();
        commit(&store, "t", WriteOp::Append, vec![row(&[("id", json!(1))])])
            .await
            .unwrap();
        let before = store.snapshot("t").await.unwrap();

        commit(&store, "t", WriteOp::Append, vec![row(&[("id", json!(2))])])
            .await
            .unwrap();

        // The earlier snapshot still sees exactly one row.
        assert_eq!(before.rows.len(), 1);
        assert_eq!(store.snapshot("t").await.unwrap().rows.len(), 2);
    }
}
