#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use lumen_core::backend::{BackendError, GenerationBackend, GenerationRequest};
use lumen_core::media::{ArtifactOrigin, MediaArtifact, MediaKind, MediaRecord};
use lumen_core::pagination::Page;
use lumen_core::provider_config::{ConfigProvider, ProviderConfig};
use lumen_core::records::{RecordStore, StoreError};
use lumen_core::task::TaskStatus;
use lumen_core::task_events::TaskEvent;
use lumen_core::types::{DbId, TaskId};
use lumen_events::{Subscription, TaskBroadcaster};
use lumen_scheduler::{SchedulerConfig, TaskScheduler};
use tokio::sync::Semaphore;

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

/// Backend whose calls block until the test releases them.
///
/// The prompt picks the outcome: `"fail"` errors, `"empty"` returns
/// nothing, `"panic"` panics; anything else yields `count` PNGs.
pub struct FakeBackend {
    release: Semaphore,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl FakeBackend {
    /// Every call waits for [`FakeBackend::release`].
    pub fn gated() -> Arc<Self> {
        Arc::new(Self {
            release: Semaphore::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Calls complete immediately.
    pub fn immediate() -> Arc<Self> {
        Arc::new(Self {
            release: Semaphore::new(Semaphore::MAX_PERMITS),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Let `n` blocked (or future) calls complete, in arrival order.
    pub fn release(&self, n: usize) {
        self.release.add_permits(n);
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.prompt).collect()
    }
}

#[async_trait]
impl GenerationBackend for FakeBackend {
    async fn generate(
        &self,
        _config: &ProviderConfig,
        request: &GenerationRequest,
    ) -> Result<Vec<MediaArtifact>, BackendError> {
        self.requests.lock().unwrap().push(request.clone());
        self.release
            .acquire()
            .await
            .expect("semaphore open")
            .forget();

        match request.prompt.as_str() {
            "fail" => Err(BackendError::Provider("content policy violation".into())),
            "empty" => Ok(Vec::new()),
            "panic" => panic!("backend exploded"),
            _ => Ok((0..request.count)
                .map(|i| MediaArtifact::new(request.kind.media_kind(), "png", vec![i as u8; 8]))
                .collect()),
        }
    }
}

// ---------------------------------------------------------------------------
// Record store
// ---------------------------------------------------------------------------

/// In-memory record store; optionally fails the n-th save (1-based).
#[derive(Default)]
pub struct MemoryRecordStore {
    inner: Mutex<MemoryRecords>,
}

#[derive(Default)]
struct MemoryRecords {
    records: Vec<(MediaRecord, MediaArtifact)>,
    saves: usize,
    fail_on_save: Option<usize>,
}

impl MemoryRecordStore {
    pub fn failing_on_save(n: usize) -> Arc<Self> {
        let store = Self::default();
        store.inner.lock().unwrap().fail_on_save = Some(n);
        Arc::new(store)
    }

    /// Seed a stored image, e.g. as an image-to-video source.
    pub fn seed_image(&self, bytes: &[u8]) -> DbId {
        self.seed(MediaKind::Image, "png", bytes)
    }

    pub fn seed_video(&self, bytes: &[u8]) -> DbId {
        self.seed(MediaKind::Video, "mp4", bytes)
    }

    fn seed(&self, kind: MediaKind, extension: &str, bytes: &[u8]) -> DbId {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.records.len() as DbId + 1;
        inner.records.push((
            MediaRecord {
                id,
                kind,
                filename: format!("seed_{id}.{extension}"),
                prompt: "seed".into(),
                config_name: "default".into(),
                task_id: None,
                created_at: chrono::Utc::now(),
            },
            MediaArtifact::new(kind, extension, bytes.to_vec()),
        ));
        id
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().records.len()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn save(
        &self,
        origin: &ArtifactOrigin,
        artifact: MediaArtifact,
    ) -> Result<DbId, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.saves += 1;
        if inner.fail_on_save == Some(inner.saves) {
            return Err(StoreError::Database("disk full".into()));
        }
        let id = inner.records.len() as DbId + 1;
        inner.records.push((
            MediaRecord {
                id,
                kind: artifact.kind,
                filename: format!("{id}.{}", artifact.extension),
                prompt: origin.prompt.clone(),
                config_name: origin.config_name.clone(),
                task_id: Some(origin.task_id),
                created_at: chrono::Utc::now(),
            },
            artifact,
        ));
        Ok(id)
    }

    async fn list(&self, page: i64, page_size: i64) -> Result<Page<MediaRecord>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let items = inner
            .records
            .iter()
            .rev()
            .skip(((page - 1) * page_size) as usize)
            .take(page_size as usize)
            .map(|(r, _)| r.clone())
            .collect();
        Ok(Page {
            items,
            total: inner.records.len() as i64,
            page,
            page_size,
        })
    }

    async fn get(&self, id: DbId) -> Result<MediaRecord, StoreError> {
        self.inner
            .lock()
            .unwrap()
            .records
            .iter()
            .find(|(r, _)| r.id == id)
            .map(|(r, _)| r.clone())
            .ok_or(StoreError::NotFound {
                entity: "media_record",
                id: id.to_string(),
            })
    }

    async fn delete(&self, id: DbId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.records.len();
        inner.records.retain(|(r, _)| r.id != id);
        if inner.records.len() == before {
            return Err(StoreError::NotFound {
                entity: "media_record",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn load_artifact(&self, id: DbId) -> Result<MediaArtifact, StoreError> {
        self.inner
            .lock()
            .unwrap()
            .records
            .iter()
            .find(|(r, _)| r.id == id)
            .map(|(_, a)| a.clone())
            .ok_or(StoreError::NotFound {
                entity: "media_record",
                id: id.to_string(),
            })
    }

    async fn list_by_task(&self, task_id: TaskId) -> Result<Vec<MediaRecord>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .records
            .iter()
            .filter(|(r, _)| r.task_id == Some(task_id))
            .map(|(r, _)| r.clone())
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Config provider
// ---------------------------------------------------------------------------

pub struct StaticConfigs {
    names: HashSet<String>,
}

impl StaticConfigs {
    pub fn with(names: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            names: names.iter().map(|n| n.to_string()).collect(),
        })
    }
}

#[async_trait]
impl ConfigProvider for StaticConfigs {
    async fn resolve(&self, name: &str) -> Result<ProviderConfig, StoreError> {
        if !self.names.contains(name) {
            return Err(StoreError::NotFound {
                entity: "provider_config",
                id: name.to_string(),
            });
        }
        Ok(ProviderConfig {
            name: name.to_string(),
            base_url: "https://api.example.com".into(),
            api_key: "sk-test".into(),
            image_model: "image-1".into(),
            video_model: "video-1".into(),
            proxy: None,
        })
    }

    async fn list_names(&self) -> Result<Vec<String>, StoreError> {
        let mut names: Vec<String> = self.names.iter().cloned().collect();
        names.sort();
        Ok(names)
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub scheduler: TaskScheduler,
    pub backend: Arc<FakeBackend>,
    pub records: Arc<MemoryRecordStore>,
    pub broadcaster: Arc<TaskBroadcaster>,
}

pub fn harness(max_concurrent: usize, backend: Arc<FakeBackend>) -> Harness {
    harness_with(
        SchedulerConfig {
            max_concurrent,
            ..SchedulerConfig::default()
        },
        backend,
        Arc::new(MemoryRecordStore::default()),
    )
}

pub fn harness_with(
    config: SchedulerConfig,
    backend: Arc<FakeBackend>,
    records: Arc<MemoryRecordStore>,
) -> Harness {
    let broadcaster = Arc::new(TaskBroadcaster::new());
    let scheduler = TaskScheduler::new(
        config,
        backend.clone(),
        records.clone(),
        StaticConfigs::with(&["default"]),
        broadcaster.clone(),
    )
    .expect("valid scheduler config");
    Harness {
        scheduler,
        backend,
        records,
        broadcaster,
    }
}

/// Next event, failing the test if none arrives within 5 seconds.
pub async fn next_event(sub: &mut Subscription) -> TaskEvent {
    tokio::time::timeout(Duration::from_secs(5), sub.events.recv())
        .await
        .expect("event within timeout")
        .expect("subscription open")
}

/// Consume events until `task_id` reaches `status`.
pub async fn wait_for(sub: &mut Subscription, task_id: TaskId, status: TaskStatus) -> TaskEvent {
    loop {
        let event = next_event(sub).await;
        if event.task.id == task_id && event.task.status == status {
            return event;
        }
    }
}

/// Consume events until `n` tasks have reached a terminal state.
pub async fn wait_for_terminal(sub: &mut Subscription, n: usize) -> Vec<TaskEvent> {
    let mut terminal = Vec::with_capacity(n);
    while terminal.len() < n {
        let event = next_event(sub).await;
        if event.task.status.is_terminal() {
            terminal.push(event);
        }
    }
    terminal
}

/// Poll until the backend has seen `n` calls.
pub async fn wait_for_calls(backend: &FakeBackend, n: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while backend.requests().len() < n {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("backend calls within timeout");
}
