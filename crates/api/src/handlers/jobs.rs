//! Handlers for the `/jobs` resource.
//!
//! Submission is synchronous only up to validation and enqueue: the handler
//! returns a job id immediately and execution happens on the worker pool.
//! Post-dispatch outcomes are observed by polling `GET /jobs/{id}`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use lakeflow_core::error::JobError;
use lakeflow_core::job::WriteMode;
use lakeflow_core::record::JobRecord;
use lakeflow_core::status::JobStatus;
use lakeflow_core::types::{JobId, TableVersion, Timestamp};
use lakeflow_scheduler::SubmitJob;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response payloads
// ---------------------------------------------------------------------------

/// Body of `POST /jobs`.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitJobRequest {
    #[validate(length(min = 1, message = "table must not be empty"))]
    pub table: String,
    pub mode: WriteMode,
    #[validate(length(min = 1, message = "source must not be empty"))]
    pub source: String,
    pub partition_columns: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct SubmitJobResponse {
    pub job_id: JobId,
}

/// Body of `GET /jobs/{id}`.
#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    pub job_id: JobId,
    pub table: String,
    pub mode: WriteMode,
    pub status: JobStatus,
    pub submitted_at: Timestamp,
    pub started_at: Option<Timestamp>,
    pub finished_at: Option<Timestamp>,
    pub result_version: Option<TableVersion>,
    pub error: Option<JobError>,
}

impl From<JobRecord> for JobStatusResponse {
    fn from(record: JobRecord) -> Self {
        Self {
            job_id: record.descriptor.id,
            table: record.descriptor.table.clone(),
            mode: record.descriptor.mode,
            status: record.status,
            submitted_at: record.descriptor.submitted_at,
            started_at: record.started_at,
            finished_at: record.finished_at,
            result_version: record.result_version,
            error: record.error,
        }
    }
}

// ---------------------------------------------------------------------------
// Submit
// ---------------------------------------------------------------------------

/// POST /jobs
///
/// Submit a new write job. Returns 201 with the generated job id; the job
/// starts QUEUED and is picked up by the worker pool once its table is free.
pub async fn submit_job(
    State(state): State<AppState>,
    Json(input): Json<SubmitJobRequest>,
) -> AppResult<impl IntoResponse> {
    input
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let job_id = state.scheduler.submit(SubmitJob {
        table: input.table,
        mode: input.mode,
        source: input.source,
        partition_columns: input.partition_columns,
    })?;

    tracing::info!(job_id = %job_id, "Job submitted");

    Ok((StatusCode::CREATED, Json(SubmitJobResponse { job_id })))
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// GET /jobs/{id}
///
/// Non-blocking lookup of a job's lifecycle record. 404 for unknown ids.
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
) -> AppResult<impl IntoResponse> {
    let record = state.tracker.get_status(job_id)?;
    Ok(Json(JobStatusResponse::from(record)))
}

// ---------------------------------------------------------------------------
// Cancel
// ---------------------------------------------------------------------------

/// POST /jobs/{id}/cancel
///
/// Cancel a QUEUED job before dispatch. Returns 204 on success, 409 once
/// the job has been dispatched (running jobs are driven to a terminal
/// state, never interrupted), 404 for unknown ids.
pub async fn cancel_job(
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
) -> AppResult<impl IntoResponse> {
    state.scheduler.cancel(job_id)?;

    tracing::info!(job_id = %job_id, "Job cancelled");

    Ok(StatusCode::NO_CONTENT)
}
