use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lakeflow_api::config::ServerConfig;
use lakeflow_api::router::build_app_router;
use lakeflow_api::state::AppState;
use lakeflow_compute::local::LocalCompute;
use lakeflow_compute::Compute;
use lakeflow_engine::{EngineConfig, ExecutionEngine};
use lakeflow_scheduler::{Scheduler, StatusTracker, WorkerPool};
use lakeflow_store::memory::MemoryTableStore;
use lakeflow_store::TableStore;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "lakeflow_api=debug,lakeflow_scheduler=debug,lakeflow_engine=debug,tower_http=debug"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        worker_count = config.worker_count,
        "Loaded server configuration"
    );

    // --- Table store & compute capabilities ---
    let store: Arc<dyn TableStore> = Arc::new(MemoryTableStore::new());
    let compute: Arc<dyn Compute> = Arc::new(LocalCompute::new(&config.data_root));
    tracing::info!(data_root = %config.data_root, "Capabilities initialised");

    // --- Execution engine ---
    let engine = Arc::new(ExecutionEngine::new(
        Arc::clone(&store),
        compute,
        EngineConfig {
            execution_timeout: Duration::from_secs(config.execution_timeout_secs),
            merge_key: config.merge_key.clone(),
        },
    ));

    // --- Scheduler & worker pool ---
    let tracker = Arc::new(StatusTracker::new());
    let scheduler = Arc::new(Scheduler::new(Arc::clone(&tracker)));
    let worker_cancel = CancellationToken::new();
    let workers = WorkerPool::start(
        Arc::clone(&scheduler),
        engine,
        config.worker_count,
        worker_cancel.clone(),
    );
    tracing::info!(worker_count = config.worker_count, "Worker pool started");

    // --- App state & router ---
    let state = AppState {
        config: Arc::new(config.clone()),
        scheduler,
        tracker,
        store,
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, draining workers");

    // In-flight jobs run to a terminal state; workers stop claiming new ones.
    workers.shutdown().await;
    tracing::info!("Worker pool drained");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
