//! HTTP handlers for job queue status and manual triggers

use axum::{extract::State, Json};
use serde::Serialize;

use crate::error::AppResult;
use crate::jobs::scheduler::run_sweep;
use crate::jobs::JobRecord;
use crate::services::reorder::ReorderService;
use crate::AppState;

#[derive(Serialize)]
pub struct QueueStatus {
    pub name: &'static str,
    pub queued: usize,
    pub recent_completed: usize,
    pub recent_failed: usize,
}

#[derive(Serialize)]
pub struct JobStatusResponse {
    pub queues: Vec<QueueStatus>,
}

#[derive(Serialize)]
pub struct FailedJobsResponse {
    pub forecast: Vec<JobRecord>,
    pub notification: Vec<JobRecord>,
}

#[derive(Serialize)]
pub struct SweepResponse {
    pub dispatched: usize,
}

/// Queue depths and recent outcome counts
pub async fn get_job_status(State(state): State<AppState>) -> AppResult<Json<JobStatusResponse>> {
    let forecast = &state.jobs.forecast_queue;
    let notification = &state.jobs.notification_queue;

    Ok(Json(JobStatusResponse {
        queues: vec![
            QueueStatus {
                name: forecast.name(),
                queued: forecast.queued_len(),
                recent_completed: forecast.completed_snapshot().len(),
                recent_failed: forecast.failed_snapshot().len(),
            },
            QueueStatus {
                name: notification.name(),
                queued: notification.queued_len(),
                recent_completed: notification.completed_snapshot().len(),
                recent_failed: notification.failed_snapshot().len(),
            },
        ],
    }))
}

/// Failed jobs retained for operator inspection
pub async fn get_failed_jobs(State(state): State<AppState>) -> AppResult<Json<FailedJobsResponse>> {
    Ok(Json(FailedJobsResponse {
        forecast: state.jobs.forecast_queue.failed_snapshot(),
        notification: state.jobs.notification_queue.failed_snapshot(),
    }))
}

/// Manually run the low-stock forecast sweep
pub async fn trigger_forecast_sweep(
    State(state): State<AppState>,
) -> AppResult<Json<SweepResponse>> {
    let reorder = ReorderService::new(state.db);
    let dispatched = run_sweep(&reorder, &state.jobs.forecast_queue).await?;
    Ok(Json(SweepResponse { dispatched }))
}
