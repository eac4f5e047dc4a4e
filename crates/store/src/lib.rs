//! SQLite persistence and media file storage.
//!
//! Row models live in [`models`], query code in [`repositories`] (unit
//! structs taking a `&SqlitePool`), and [`SqliteRecordStore`] ties the
//! metadata tables to a [`MediaDir`] to implement the
//! [`RecordStore`](lumen_core::records::RecordStore) and
//! [`ConfigProvider`](lumen_core::provider_config::ConfigProvider) seams.

use std::str::FromStr;

use lumen_core::records::StoreError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

pub mod media_dir;
pub mod models;
pub mod record_store;
pub mod repositories;

pub use media_dir::MediaDir;
pub use record_store::SqliteRecordStore;

pub type DbPool = sqlx::SqlitePool;

/// Create a connection pool from a database URL.
///
/// In-memory databases are per-connection in SQLite, so they get a single
/// connection that is never recycled.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");
    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };

    pool_options.connect_with(options).await
}

/// Round-trip a trivial query.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the embedded schema migrations.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Map a database failure into the store seam's error type.
pub fn db_error(err: sqlx::Error) -> StoreError {
    StoreError::Database(err.to_string())
}
