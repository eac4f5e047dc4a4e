pub mod configs;
pub mod health;
pub mod records;
pub mod settings;
pub mod tasks;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                          WebSocket (snapshot + task updates)
///
/// /tasks                       list recent, submit (GET, POST)
/// /tasks/{id}                  get task (GET)
///
/// /records                     list paginated (GET)
/// /records/{id}                get, delete (GET, DELETE)
///
/// /configs                     list, create (GET, POST)
/// /configs/{name}              get, update, delete (GET, PUT, DELETE)
///
/// /settings/concurrency        get, update (GET, PUT)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/tasks", tasks::router())
        .nest("/records", records::router())
        .nest("/configs", configs::router())
        .nest("/settings", settings::router())
}
