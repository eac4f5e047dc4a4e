use lumen_core::types::Timestamp;
use sqlx::FromRow;

/// Key under which the concurrency budget is persisted.
pub const MAX_CONCURRENT_KEY: &str = "max_concurrent";

/// A row from the `settings` table.
#[derive(Debug, Clone, FromRow)]
pub struct Setting {
    pub key: String,
    pub value: String,
    pub updated_at: Timestamp,
}
