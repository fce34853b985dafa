use std::sync::Arc;

use lakeflow_scheduler::{Scheduler, StatusTracker};
use lakeflow_store::TableStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Job queue / scheduler (submission, cancellation).
    pub scheduler: Arc<Scheduler>,
    /// Job registry (status queries).
    pub tracker: Arc<StatusTracker>,
    /// Table store (snapshot reads for the tables endpoint).
    pub store: Arc<dyn TableStore>,
}
