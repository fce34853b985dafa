//! Route definitions for the `/tables` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::tables;
use crate::state::AppState;

/// Routes mounted at `/tables`.
///
/// ```text
/// GET    /{table}         -> get_table
/// GET    /{table}/rows    -> get_table_rows
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{table}", get(tables::get_table))
        .route("/{table}/rows", get(tables::get_table_rows))
}
