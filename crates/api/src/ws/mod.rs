//! WebSocket live task stream.
//!
//! Each connection receives one `snapshot` message followed by a
//! `task_update` message for every lifecycle transition.

mod handler;
pub mod messages;

pub use handler::ws_handler;
pub use messages::ServerMessage;
