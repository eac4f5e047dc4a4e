#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use lumen_api::config::ServerConfig;
use lumen_api::router::build_app_router;
use lumen_api::state::AppState;
use lumen_core::backend::{BackendError, GenerationBackend, GenerationRequest};
use lumen_core::media::MediaArtifact;
use lumen_core::provider_config::ProviderConfig;
use lumen_core::task::TaskSnapshot;
use lumen_core::types::TaskId;
use lumen_events::TaskBroadcaster;
use lumen_scheduler::{SchedulerConfig, TaskScheduler};
use lumen_store::repositories::ConfigRepo;
use lumen_store::{DbPool, MediaDir, SqliteRecordStore};
use tempfile::TempDir;
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config(media_dir: &std::path::Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        database_url: "sqlite::memory:".to_string(),
        media_dir: media_dir.to_path_buf(),
        default_max_concurrent: 2,
        task_history_limit: 200,
        snapshot_limit: 10,
    }
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

/// Completes immediately. A prompt of `"fail"` errors; anything else yields
/// `count` small PNG payloads.
#[derive(Default)]
pub struct FakeBackend {
    prompts: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationBackend for FakeBackend {
    async fn generate(
        &self,
        _config: &ProviderConfig,
        request: &GenerationRequest,
    ) -> Result<Vec<MediaArtifact>, BackendError> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        if request.prompt == "fail" {
            return Err(BackendError::Api {
                status: 401,
                message: "Invalid API key".into(),
            });
        }
        Ok((0..request.count)
            .map(|i| MediaArtifact::new(request.kind.media_kind(), "png", vec![0x89, b'P', i as u8]))
            .collect())
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// A fully wired app over an in-memory database and a temporary media dir.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub backend: Arc<FakeBackend>,
    _media: TempDir,
}

impl TestApp {
    pub fn pool(&self) -> &DbPool {
        &self.state.pool
    }

    pub fn scheduler(&self) -> &TaskScheduler {
        &self.state.scheduler
    }

    /// Poll until the task reaches a terminal status.
    pub async fn wait_for_terminal(&self, id: TaskId) -> TaskSnapshot {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let task = self.scheduler().get_task(id).await.unwrap();
                if task.status.is_terminal() {
                    return task;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("task did not finish in time")
    }
}

pub fn provider_config(name: &str) -> ProviderConfig {
    ProviderConfig {
        name: name.to_string(),
        base_url: "https://api.example.com".to_string(),
        api_key: "sk-test-0123456789".to_string(),
        image_model: "image-1".to_string(),
        video_model: "video-1".to_string(),
        proxy: None,
    }
}

/// Build the app with the same router `main.rs` uses and a `default`
/// provider config already stored.
pub async fn build_test_app() -> TestApp {
    let media = TempDir::new().unwrap();
    let config = test_config(media.path());

    let pool = lumen_store::create_pool(&config.database_url).await.unwrap();
    lumen_store::run_migrations(&pool).await.unwrap();
    ConfigRepo::insert(&pool, &provider_config("default"))
        .await
        .unwrap();

    let media_dir = MediaDir::open(media.path()).await.unwrap();
    let store = Arc::new(SqliteRecordStore::new(pool.clone(), media_dir));
    let backend = Arc::new(FakeBackend::default());

    let scheduler = TaskScheduler::new(
        SchedulerConfig {
            max_concurrent: config.default_max_concurrent,
            task_history_limit: config.task_history_limit,
            snapshot_limit: config.snapshot_limit,
        },
        backend.clone(),
        store.clone(),
        store.clone(),
        Arc::new(TaskBroadcaster::new()),
    )
    .unwrap();

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        scheduler,
        records: store,
        settings_lock: Default::default(),
    };

    TestApp {
        router: build_app_router(state.clone(), &config),
        state,
        backend,
        _media: media,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: &TestApp, method: Method, uri: &str, body: Option<serde_json::Value>) -> Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.router.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &TestApp, uri: &str) -> Response {
    send(app, Method::GET, uri, None).await
}

pub async fn post_json(app: &TestApp, uri: &str, body: serde_json::Value) -> Response {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn put_json(app: &TestApp, uri: &str, body: serde_json::Value) -> Response {
    send(app, Method::PUT, uri, Some(body)).await
}

pub async fn delete(app: &TestApp, uri: &str) -> Response {
    send(app, Method::DELETE, uri, None).await
}

/// Collect the response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub fn assert_status(response: &Response, status: StatusCode) {
    assert_eq!(response.status(), status, "unexpected status for response");
}
