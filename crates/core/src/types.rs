/// Record store primary keys are SQLite INTEGER PRIMARY KEY.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Tasks live only in memory and are keyed by a random UUID.
pub type TaskId = uuid::Uuid;
