//! Record and schema model shared by the store and compute boundaries.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::error::StoreError;

/// One record: column name to JSON value.
///
/// `serde_json::Map` keeps keys sorted, so row iteration order is stable.
pub type Row = Map<String, Value>;

/// Column-name set of a batch or table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: BTreeSet<String>,
}

impl Schema {
    pub fn of_row(row: &Row) -> Self {
        Self {
            columns: row.keys().cloned().collect(),
        }
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.contains(column)
    }

    /// Comma-separated column list for error messages.
    pub fn describe(&self) -> String {
        self.columns
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A set of rows produced by the compute capability, staged as one unit.
#[derive(Debug, Clone, Default)]
pub struct RecordBatch {
    pub rows: Vec<Row>,
}

impl RecordBatch {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Schema shared by every row in the batch, or `None` for an empty batch.
    ///
    /// Fails with a schema conflict if rows disagree on their column set;
    /// ragged batches are rejected before they reach a table.
    pub fn uniform_schema(&self, table: &str) -> Result<Option<Schema>, StoreError> {
        let Some(first) = self.rows.first() else {
            return Ok(None);
        };
        let schema = Schema::of_row(first);
        for row in &self.rows[1..] {
            let other = Schema::of_row(row);
            if other != schema {
                return Err(StoreError::SchemaConflict {
                    table: table.to_string(),
                    detail: format!(
                        "rows disagree on columns: [{}] vs [{}]",
                        schema.describe(),
                        other.describe()
                    ),
                });
            }
        }
        Ok(Some(schema))
    }
}
