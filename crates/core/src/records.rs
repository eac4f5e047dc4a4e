//! Record store seam: persistence of generated media and its metadata.

use async_trait::async_trait;

use crate::error::CoreError;
use crate::media::{ArtifactOrigin, MediaArtifact, MediaRecord};
use crate::pagination::Page;
use crate::types::{DbId, TaskId};

/// Errors from the record store and config provider.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Media file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid stored data: {0}")]
    Corrupt(String),
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => CoreError::NotFound { entity, id },
            other => CoreError::Internal(other.to_string()),
        }
    }
}

/// Persists artifacts and serves them back.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Write the artifact and its metadata; returns the new record id.
    async fn save(&self, origin: &ArtifactOrigin, artifact: MediaArtifact)
        -> Result<DbId, StoreError>;

    /// Newest first. `page` is 1-based.
    async fn list(&self, page: i64, page_size: i64) -> Result<Page<MediaRecord>, StoreError>;

    async fn get(&self, id: DbId) -> Result<MediaRecord, StoreError>;

    /// Remove both the metadata row and the media file.
    async fn delete(&self, id: DbId) -> Result<(), StoreError>;

    /// Read a stored record back as an artifact (used for image-to-video).
    async fn load_artifact(&self, id: DbId) -> Result<MediaArtifact, StoreError>;

    /// All records attributed to a task, oldest first.
    async fn list_by_task(&self, task_id: TaskId) -> Result<Vec<MediaRecord>, StoreError>;
}
