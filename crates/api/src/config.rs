use std::path::PathBuf;

use lumen_core::task_store::DEFAULT_HISTORY_LIMIT;
use lumen_scheduler::config::{
    validate_max_concurrent, DEFAULT_MAX_CONCURRENT, DEFAULT_SNAPSHOT_LIMIT,
};

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for running tasks, in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    pub database_url: String,
    /// Where generated media is written and served from.
    pub media_dir: PathBuf,
    /// Concurrency budget used until one has been stored in the database.
    pub default_max_concurrent: usize,
    pub task_history_limit: usize,
    pub snapshot_limit: usize,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                      |
    /// |--------------------------|------------------------------|
    /// | `HOST`                   | `0.0.0.0`                    |
    /// | `PORT`                   | `3000`                       |
    /// | `CORS_ORIGINS`           | `http://localhost:5173`      |
    /// | `REQUEST_TIMEOUT_SECS`   | `30`                         |
    /// | `SHUTDOWN_TIMEOUT_SECS`  | `30`                         |
    /// | `DATABASE_URL`           | `sqlite://lumen.db?mode=rwc` |
    /// | `MEDIA_DIR`              | `output`                     |
    /// | `DEFAULT_MAX_CONCURRENT` | `2`                          |
    /// | `TASK_HISTORY_LIMIT`     | `200`                        |
    /// | `SNAPSHOT_LIMIT`         | `10`                         |
    ///
    /// Panics on unparseable values so misconfiguration fails at startup.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://lumen.db?mode=rwc".into());

        let media_dir = PathBuf::from(std::env::var("MEDIA_DIR").unwrap_or_else(|_| "output".into()));

        let default_max_concurrent: usize = std::env::var("DEFAULT_MAX_CONCURRENT")
            .map(|v| v.parse().expect("DEFAULT_MAX_CONCURRENT must be a valid usize"))
            .unwrap_or(DEFAULT_MAX_CONCURRENT);
        let default_max_concurrent = validate_max_concurrent(default_max_concurrent)
            .unwrap_or_else(|e| panic!("DEFAULT_MAX_CONCURRENT: {e}"));

        let task_history_limit: usize = std::env::var("TASK_HISTORY_LIMIT")
            .map(|v| v.parse().expect("TASK_HISTORY_LIMIT must be a valid usize"))
            .unwrap_or(DEFAULT_HISTORY_LIMIT);

        let snapshot_limit: usize = std::env::var("SNAPSHOT_LIMIT")
            .map(|v| v.parse().expect("SNAPSHOT_LIMIT must be a valid usize"))
            .unwrap_or(DEFAULT_SNAPSHOT_LIMIT);

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            database_url,
            media_dir,
            default_max_concurrent,
            task_history_limit,
            snapshot_limit,
        }
    }
}
