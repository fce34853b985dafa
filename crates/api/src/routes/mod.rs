pub mod health;
pub mod jobs;
pub mod tables;

use axum::Router;

use crate::state::AppState;

/// Build the application route tree.
///
/// ```text
/// /jobs                    submit, status, cancel
/// /tables                  snapshot metadata
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/jobs", jobs::router())
        .nest("/tables", tables::router())
}
