//! Job descriptors: the immutable specification of one requested write.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{JobId, Timestamp};

/// Maximum length of a table name.
const MAX_TABLE_NAME_LEN: usize = 128;

/// Maximum number of partition columns on a single descriptor.
const MAX_PARTITION_COLUMNS: usize = 16;

// ---------------------------------------------------------------------------
// Write mode
// ---------------------------------------------------------------------------

/// How a job's records land in the target table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Add records; fails if the schema is incompatible with the table.
    Append,
    /// Atomically replace the table (or the staged partitions) with new records.
    Overwrite,
    /// Upsert by a configured key column.
    Merge,
}

impl WriteMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteMode::Append => "append",
            WriteMode::Overwrite => "overwrite",
            WriteMode::Merge => "merge",
        }
    }
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Source reference
// ---------------------------------------------------------------------------

/// Where a job's input records come from.
///
/// Submissions carry the source as one opaque string; a leading `select`
/// keyword classifies it as a query, anything else is a path resolved by
/// the compute capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum SourceRef {
    Path(String),
    Query(String),
}

impl SourceRef {
    /// Classify a raw source string. The caller has already rejected empty
    /// input via [`JobDescriptor::new`].
    ///
    /// The `select` keyword must stand alone: a path like
    /// `selected_events.ndjson` stays a path.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let is_query = trimmed
            .get(..6)
            .is_some_and(|head| head.eq_ignore_ascii_case("select"))
            && trimmed[6..].starts_with(|c: char| c.is_whitespace());
        if is_query {
            SourceRef::Query(trimmed.to_string())
        } else {
            SourceRef::Path(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SourceRef::Path(s) | SourceRef::Query(s) => s,
        }
    }
}

// ---------------------------------------------------------------------------
// Descriptor
// ---------------------------------------------------------------------------

/// Immutable specification of one unit of work.
///
/// Built (and validated) once at submission; the scheduler and engine only
/// ever read it.
#[derive(Debug, Clone, Serialize)]
pub struct JobDescriptor {
    pub id: JobId,
    pub table: String,
    pub mode: WriteMode,
    pub source: SourceRef,
    pub partition_columns: Vec<String>,
    pub submitted_at: Timestamp,
}

impl JobDescriptor {
    /// Validate the submission fields and mint a new descriptor.
    ///
    /// Fails with [`CoreError::Validation`] on an empty or malformed table
    /// name, an empty source reference, or bad partition columns. Nothing
    /// is enqueued on failure.
    pub fn new(
        table: String,
        mode: WriteMode,
        source: &str,
        partition_columns: Vec<String>,
    ) -> Result<Self, CoreError> {
        validate_table_name(&table)?;
        if source.trim().is_empty() {
            return Err(CoreError::Validation(
                "Source reference must not be empty".to_string(),
            ));
        }
        validate_partition_columns(&partition_columns)?;

        Ok(Self {
            id: uuid::Uuid::now_v7(),
            table,
            mode,
            source: SourceRef::parse(source),
            partition_columns,
            submitted_at: chrono::Utc::now(),
        })
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a target table name.
///
/// Rules:
/// - Must not be empty.
/// - Must not exceed `MAX_TABLE_NAME_LEN` characters.
/// - Must contain only alphanumeric, hyphen, underscore, or dot characters.
pub fn validate_table_name(name: &str) -> Result<(), CoreError> {
    if name.is_empty() {
        return Err(CoreError::Validation(
            "Table name must not be empty".to_string(),
        ));
    }
    if name.len() > MAX_TABLE_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "Table name must not exceed {MAX_TABLE_NAME_LEN} characters"
        )));
    }
    if !name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(CoreError::Validation(
            "Table name may only contain alphanumeric, hyphen, underscore, or dot characters"
                .to_string(),
        ));
    }
    Ok(())
}

/// Validate a set of partition columns.
///
/// Rules:
/// - At most `MAX_PARTITION_COLUMNS` columns.
/// - Each column name must not be empty.
/// - No duplicates.
fn validate_partition_columns(columns: &[String]) -> Result<(), CoreError> {
    if columns.len() > MAX_PARTITION_COLUMNS {
        return Err(CoreError::Validation(format!(
            "A job may have at most {MAX_PARTITION_COLUMNS} partition columns"
        )));
    }
    let mut seen = std::collections::HashSet::with_capacity(columns.len());
    for (i, column) in columns.iter().enumerate() {
        if column.is_empty() {
            return Err(CoreError::Validation(format!(
                "Partition column at index {i} must not be empty"
            )));
        }
        if !seen.insert(column.as_str()) {
            return Err(CoreError::Validation(format!(
                "Duplicate partition column: \"{column}\""
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
