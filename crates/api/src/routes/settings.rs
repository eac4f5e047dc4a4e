use axum::routing::get;
use axum::Router;

use crate::handlers::settings;
use crate::state::AppState;

/// Runtime settings routes mounted at `/settings`.
///
/// ```text
/// GET /concurrency  -> get_concurrency
/// PUT /concurrency  -> update_concurrency
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/concurrency",
        get(settings::get_concurrency).put(settings::update_concurrency),
    )
}
