//! Local compute implementation.
//!
//! Path sources read newline-delimited JSON files under a configured data
//! root. Query sources accept the inline-row form `select <json-array>`,
//! which is enough for local development and tests; anything richer belongs
//! to a real compute backend behind the same trait.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use lakeflow_core::job::SourceRef;
use lakeflow_store::model::{RecordBatch, Row};

use crate::error::ComputeError;
use crate::Compute;

pub struct LocalCompute {
    data_root: PathBuf,
}

impl LocalCompute {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
        }
    }

    /// Resolve a path source inside the data root.
    ///
    /// Absolute paths and `..` components are rejected so a descriptor can
    /// never read outside the configured root.
    fn resolve(&self, source: &str) -> Result<PathBuf, ComputeError> {
        let path = Path::new(source);
        let escapes = path.is_absolute()
            || path
                .components()
                .any(|c| matches!(c, Component::ParentDir | Component::RootDir));
        if escapes {
            return Err(ComputeError::Source {
                input: source.to_string(),
                detail: "path must be relative to the data root".to_string(),
            });
        }
        Ok(self.data_root.join(path))
    }

    async fn run_path(&self, source: &str) -> Result<RecordBatch, ComputeError> {
        let path = self.resolve(source)?;
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| ComputeError::Source {
                input: source.to_string(),
                detail: e.to_string(),
            })?;
        parse_ndjson(source, &text)
    }
}

#[async_trait]
impl Compute for LocalCompute {
    async fn run(&self, source: &SourceRef) -> Result<RecordBatch, ComputeError> {
        match source {
            SourceRef::Path(path) => {
                tracing::debug!(source = %path, "Reading NDJSON source");
                self.run_path(path).await
            }
            SourceRef::Query(query) => parse_inline_query(query),
        }
    }
}

/// Parse one JSON object per non-empty line.
fn parse_ndjson(source: &str, text: &str) -> Result<RecordBatch, ComputeError> {
    let mut rows = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let row: Row = serde_json::from_str(line).map_err(|e| ComputeError::Parse {
            input: source.to_string(),
            detail: format!("line {}: {e}", lineno + 1),
        })?;
        rows.push(row);
    }
    Ok(RecordBatch::new(rows))
}

/// Evaluate the `select <json-array>` inline-row query form.
fn parse_inline_query(query: &str) -> Result<RecordBatch, ComputeError> {
    let body = query
        .trim()
        .get(6..)
        .map(str::trim)
        .filter(|b| b.starts_with('['))
        .ok_or_else(|| {
            ComputeError::Unsupported(
                "only inline-row queries of the form `select [<objects>]` are supported"
                    .to_string(),
            )
        })?;

    let rows: Vec<Row> = serde_json::from_str(body).map_err(|e| ComputeError::Parse {
        input: query.to_string(),
        detail: e.to_string(),
    })?;
    Ok(RecordBatch::new(rows))
}
