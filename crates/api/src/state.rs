use std::sync::Arc;

use lumen_core::records::RecordStore;
use lumen_scheduler::TaskScheduler;
use tokio::sync::Mutex;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: lumen_store::DbPool,
    pub config: Arc<ServerConfig>,
    /// Admission, execution, and live events for generation tasks.
    pub scheduler: TaskScheduler,
    /// Persisted media and its metadata.
    pub records: Arc<dyn RecordStore>,
    /// Held while a settings change is stored and applied, so the stored
    /// and live values always match.
    pub settings_lock: Arc<Mutex<()>>,
}
