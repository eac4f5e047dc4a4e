use axum::routing::get;
use axum::Router;

use crate::handlers::configs;
use crate::state::AppState;

/// Provider configuration routes mounted at `/configs`.
///
/// ```text
/// GET    /        -> list_configs
/// POST   /        -> create_config
/// GET    /{name}  -> get_config
/// PUT    /{name}  -> update_config
/// DELETE /{name}  -> delete_config
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(configs::list_configs).post(configs::create_config),
        )
        .route(
            "/{name}",
            get(configs::get_config)
                .put(configs::update_config)
                .delete(configs::delete_config),
        )
}
