use axum::routing::get;
use axum::Router;

use crate::handlers::records;
use crate::state::AppState;

/// Media record routes mounted at `/records`.
///
/// ```text
/// GET    /      -> list_records
/// GET    /{id}  -> get_record
/// DELETE /{id}  -> delete_record
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(records::list_records))
        .route(
            "/{id}",
            get(records::get_record).delete(records::delete_record),
        )
}
