use axum::routing::get;
use axum::Router;

use crate::handlers::tasks;
use crate::state::AppState;

/// Task routes mounted at `/tasks`.
///
/// ```text
/// GET  /      -> list_tasks
/// POST /      -> submit_task
/// GET  /{id}  -> get_task
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(tasks::list_tasks).post(tasks::submit_task))
        .route("/{id}", get(tasks::get_task))
}
