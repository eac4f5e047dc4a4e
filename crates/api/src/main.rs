use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use lumen_api::config::ServerConfig;
use lumen_api::router::build_app_router;
use lumen_api::state::AppState;
use lumen_events::TaskBroadcaster;
use lumen_provider::OpenAiCompatBackend;
use lumen_scheduler::config::validate_max_concurrent;
use lumen_scheduler::{SchedulerConfig, TaskScheduler};
use lumen_store::repositories::SettingsRepo;
use lumen_store::{MediaDir, SqliteRecordStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let fmt_layer = if json_logs {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "lumen_api=debug,lumen_scheduler=debug,tower_http=debug".into()
            }),
        )
        .with(fmt_layer)
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let pool = lumen_store::create_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    lumen_store::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    lumen_store::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Media storage ---
    let media = MediaDir::open(config.media_dir.clone())
        .await
        .expect("Failed to create media directory");
    tracing::info!(media_dir = %config.media_dir.display(), "Media directory ready");
    let store = Arc::new(SqliteRecordStore::new(pool.clone(), media));

    // --- Scheduler ---
    let max_concurrent = match SettingsRepo::max_concurrent(&pool)
        .await
        .expect("Failed to read stored settings")
    {
        Some(stored) => validate_max_concurrent(stored).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Stored max_concurrent out of range, using default");
            config.default_max_concurrent
        }),
        None => config.default_max_concurrent,
    };

    let broadcaster = Arc::new(TaskBroadcaster::new());
    let scheduler = TaskScheduler::new(
        SchedulerConfig {
            max_concurrent,
            task_history_limit: config.task_history_limit,
            snapshot_limit: config.snapshot_limit,
        },
        Arc::new(OpenAiCompatBackend::new()),
        store.clone(),
        store.clone(),
        broadcaster,
    )
    .expect("Invalid scheduler configuration");

    // --- App state ---
    let state = AppState {
        pool: pool.clone(),
        config: Arc::new(config.clone()),
        scheduler: scheduler.clone(),
        records: store,
        settings_lock: Default::default(),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    let drained = scheduler
        .shutdown(Duration::from_secs(config.shutdown_timeout_secs))
        .await;
    if drained {
        tracing::info!("Running tasks finished");
    } else {
        tracing::warn!(
            running = scheduler.running_count().await,
            "Shutdown timed out with tasks still running",
        );
    }

    pool.close().await;
    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
