//! Handlers for the `/tables` resource.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use lakeflow_core::types::TableVersion;
use lakeflow_store::model::Row;

use crate::error::AppResult;
use crate::state::AppState;

/// Body of `GET /tables/{table}`.
#[derive(Debug, Serialize)]
pub struct TableResponse {
    pub table: String,
    /// Latest committed version id.
    pub version: TableVersion,
    pub row_count: usize,
}

/// GET /tables/{table}
///
/// Snapshot metadata for a table: readers always observe a fully committed
/// version, never a partial write. 404 for tables that have never been
/// written.
pub async fn get_table(
    State(state): State<AppState>,
    Path(table): Path<String>,
) -> AppResult<impl IntoResponse> {
    let snapshot = state.store.snapshot(&table).await?;
    Ok(Json(TableResponse {
        table: snapshot.table,
        version: snapshot.version,
        row_count: snapshot.rows.len(),
    }))
}

/// Body of `GET /tables/{table}/rows`.
#[derive(Debug, Serialize)]
pub struct TableRowsResponse {
    pub table: String,
    pub version: TableVersion,
    pub rows: Vec<Row>,
}

/// GET /tables/{table}/rows
///
/// Full contents of the latest committed version. Like the metadata
/// endpoint, this reads one snapshot: a concurrent commit never shows up
/// halfway through the response.
pub async fn get_table_rows(
    State(state): State<AppState>,
    Path(table): Path<String>,
) -> AppResult<impl IntoResponse> {
    let snapshot = state.store.snapshot(&table).await?;
    Ok(Json(TableRowsResponse {
        table: snapshot.table,
        version: snapshot.version,
        rows: snapshot.rows,
    }))
}
