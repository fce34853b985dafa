//! Shared harness for API integration tests.
//!
//! Builds the full application router (same middleware stack as production)
//! on top of an in-memory table store and a test compute capability driven
//! by marker sources:
//!
//! - `select [<objects>]`  -> inline rows
//! - `sleep:<ms>`          -> sleeps, then returns one row
//! - `fail`                -> compute error

// Each test binary uses a different subset of these helpers.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use lakeflow_api::config::ServerConfig;
use lakeflow_api::router::build_app_router;
use lakeflow_api::state::AppState;
use lakeflow_compute::error::ComputeError;
use lakeflow_compute::Compute;
use lakeflow_core::job::SourceRef;
use lakeflow_engine::{EngineConfig, ExecutionEngine};
use lakeflow_scheduler::{Scheduler, StatusTracker, WorkerPool};
use lakeflow_store::memory::MemoryTableStore;
use lakeflow_store::model::{RecordBatch, Row};
use lakeflow_store::TableStore;

/// Compute stub for integration tests.
pub struct TestCompute;

#[async_trait]
impl Compute for TestCompute {
    async fn run(&self, source: &SourceRef) -> Result<RecordBatch, ComputeError> {
        match source {
            SourceRef::Query(q) => {
                let body = q.trim_start_matches("select").trim();
                let rows: Vec<Row> =
                    serde_json::from_str(body).map_err(|e| ComputeError::Parse {
                        input: q.clone(),
                        detail: e.to_string(),
                    })?;
                Ok(RecordBatch::new(rows))
            }
            SourceRef::Path(p) if p == "fail" => Err(ComputeError::Source {
                input: p.clone(),
                detail: "test failure".to_string(),
            }),
            SourceRef::Path(p) if p.starts_with("sleep:") => {
                let ms: u64 = p["sleep:".len()..].parse().unwrap();
                tokio::time::sleep(Duration::from_millis(ms)).await;
                let row: Row = serde_json::from_str("{\"id\": 1}").unwrap();
                Ok(RecordBatch::new(vec![row]))
            }
            SourceRef::Path(p) => Err(ComputeError::Source {
                input: p.clone(),
                detail: "unknown test source".to_string(),
            }),
        }
    }
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config(worker_count: usize, execution_timeout_ms: u64) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        worker_count,
        execution_timeout_secs: execution_timeout_ms / 1000,
        merge_key: "id".to_string(),
        data_root: "./data".to_string(),
    }
}

/// Build the full application router with `worker_count` workers and the
/// given execution timeout.
///
/// `worker_count = 0` keeps every submitted job QUEUED, which is what the
/// cancellation tests need.
pub fn build_test_app_with(worker_count: usize, execution_timeout_ms: u64) -> Router {
    let config = test_config(worker_count, execution_timeout_ms);

    let store: Arc<dyn TableStore> = Arc::new(MemoryTableStore::new());
    let engine = Arc::new(ExecutionEngine::new(
        Arc::clone(&store),
        Arc::new(TestCompute),
        EngineConfig {
            execution_timeout: Duration::from_millis(execution_timeout_ms),
            merge_key: config.merge_key.clone(),
        },
    ));

    let tracker = Arc::new(StatusTracker::new());
    let scheduler = Arc::new(Scheduler::new(Arc::clone(&tracker)));

    // The pool handle is dropped on purpose: tasks are detached and live for
    // the duration of the test runtime.
    let _pool = WorkerPool::start(
        Arc::clone(&scheduler),
        engine,
        worker_count,
        CancellationToken::new(),
    );

    let state = AppState {
        config: Arc::new(config.clone()),
        scheduler,
        tracker,
        store,
    };
    build_app_router(state, &config)
}

/// Default harness: two workers, one-second execution deadline.
pub fn build_test_app() -> Router {
    build_test_app_with(2, 1_000)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn post_empty(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Job helpers
// ---------------------------------------------------------------------------

/// Submit a job and return its id. Panics on non-201 responses.
pub async fn submit_job(app: &Router, body: serde_json::Value) -> String {
    let response = post_json(app.clone(), "/jobs", body).await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    let json = body_json(response).await;
    json["job_id"].as_str().unwrap().to_string()
}

/// Poll `GET /jobs/{id}` until the job reaches a terminal state, returning
/// the final status payload.
pub async fn wait_terminal(app: &Router, job_id: &str) -> serde_json::Value {
    for _ in 0..500 {
        let response = get(app.clone(), &format!("/jobs/{job_id}")).await;
        let json = body_json(response).await;
        let status = json["status"].as_str().unwrap_or_default().to_string();
        if matches!(status.as_str(), "committed" | "failed" | "cancelled") {
            return json;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {job_id} did not reach a terminal state in time");
}
