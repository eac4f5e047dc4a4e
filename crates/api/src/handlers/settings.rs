//! Handlers for runtime settings.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use lumen_scheduler::config::{validate_max_concurrent, MAX_CONCURRENT, MIN_CONCURRENT};
use lumen_store::repositories::SettingsRepo;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body for `PUT /settings/concurrency`.
#[derive(Debug, Deserialize)]
pub struct UpdateConcurrencyRequest {
    pub max_concurrent: usize,
}

/// Current budget and occupancy.
#[derive(Debug, Serialize)]
pub struct ConcurrencyResponse {
    pub max_concurrent: usize,
    pub min: usize,
    pub max: usize,
    pub running: usize,
    pub queued: usize,
}

async fn concurrency(state: &AppState) -> ConcurrencyResponse {
    ConcurrencyResponse {
        max_concurrent: state.scheduler.max_concurrent().await,
        min: MIN_CONCURRENT,
        max: MAX_CONCURRENT,
        running: state.scheduler.running_count().await,
        queued: state.scheduler.queued_count().await,
    }
}

/// GET /api/v1/settings/concurrency
pub async fn get_concurrency(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    Ok(Json(DataResponse {
        data: concurrency(&state).await,
    }))
}

/// PUT /api/v1/settings/concurrency
///
/// Persists the new budget, then applies it. Raising it starts queued tasks
/// immediately; lowering it never interrupts running ones. Concurrent
/// updates are applied one at a time.
pub async fn update_concurrency(
    State(state): State<AppState>,
    Json(body): Json<UpdateConcurrencyRequest>,
) -> AppResult<impl IntoResponse> {
    let value = validate_max_concurrent(body.max_concurrent)?;

    {
        let _guard = state.settings_lock.lock().await;
        SettingsRepo::set_max_concurrent(&state.pool, value).await?;
        state.scheduler.set_max_concurrent(value).await?;
    }

    tracing::info!(max_concurrent = value, "Concurrency budget updated");

    Ok(Json(DataResponse {
        data: concurrency(&state).await,
    }))
}
