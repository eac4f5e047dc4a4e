//! Handlers for task submission and inspection.
//!
//! Submission returns as soon as the task is queued; progress is pushed over
//! the WebSocket at `/api/v1/ws`.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use lumen_core::task::SubmitTask;
use lumen_core::types::TaskId;

use crate::error::AppResult;
use crate::query::LimitParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/tasks
///
/// Validate and enqueue a task. Responds `202 Accepted` with the queued
/// snapshot.
pub async fn submit_task(
    State(state): State<AppState>,
    Json(body): Json<SubmitTask>,
) -> AppResult<impl IntoResponse> {
    let task = state.scheduler.submit(body).await?;

    tracing::info!(
        task_id = %task.id,
        kind = task.kind.as_str(),
        config_name = %task.config_name,
        "Task submitted",
    );

    Ok((StatusCode::ACCEPTED, Json(DataResponse { data: task })))
}

/// GET /api/v1/tasks?limit=
///
/// Most recent tasks first.
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> AppResult<impl IntoResponse> {
    let tasks = state.scheduler.list_tasks(params.clamped()).await;
    Ok(Json(DataResponse { data: tasks }))
}

/// GET /api/v1/tasks/{id}
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<TaskId>,
) -> AppResult<impl IntoResponse> {
    let task = state.scheduler.get_task(id).await?;
    Ok(Json(DataResponse { data: task }))
}
