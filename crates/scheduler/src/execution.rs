//! Running one task: config, source image, backend call, persistence.

use std::sync::Arc;

use lumen_core::backend::{BackendError, GenerationBackend, GenerationRequest};
use lumen_core::media::{ArtifactOrigin, MediaKind};
use lumen_core::provider_config::ConfigProvider;
use lumen_core::records::{RecordStore, StoreError};
use lumen_core::task::SubmitTask;
use lumen_core::types::{DbId, TaskId};

/// Why a running task failed. The `Display` text becomes the task's
/// `error` field.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("Config '{name}' unavailable: {source}")]
    Config {
        name: String,
        #[source]
        source: StoreError,
    },

    #[error("Source image {id} unavailable: {source}")]
    SourceImage {
        id: DbId,
        #[source]
        source: StoreError,
    },

    #[error("Source record {id} is a {kind}, not an image")]
    SourceNotImage { id: DbId, kind: MediaKind },

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("provider returned no media")]
    NoMedia,

    #[error("Failed to save result {index} of {total}: {source}")]
    Save {
        index: usize,
        total: usize,
        #[source]
        source: StoreError,
    },

    #[error("Task execution panicked")]
    Panicked,
}

/// The collaborators a task needs while it runs.
#[derive(Clone)]
pub struct Executor {
    pub backend: Arc<dyn GenerationBackend>,
    pub records: Arc<dyn RecordStore>,
    pub configs: Arc<dyn ConfigProvider>,
}

impl Executor {
    /// Make the single backend call for `request` and persist every
    /// artifact in order. Returns the new record ids.
    ///
    /// Records saved before a failing save are left in place.
    pub async fn run(&self, task_id: TaskId, request: &SubmitTask) -> Result<Vec<DbId>, ExecutionError> {
        let config = self
            .configs
            .resolve(&request.config_name)
            .await
            .map_err(|source| ExecutionError::Config {
                name: request.config_name.clone(),
                source,
            })?;

        let source_image = match request.source_image_id {
            Some(id) => {
                let artifact = self
                    .records
                    .load_artifact(id)
                    .await
                    .map_err(|source| ExecutionError::SourceImage { id, source })?;
                if artifact.kind != MediaKind::Image {
                    return Err(ExecutionError::SourceNotImage {
                        id,
                        kind: artifact.kind,
                    });
                }
                Some(artifact)
            }
            None => None,
        };

        let prompt = request.effective_prompt().to_string();
        let generation = GenerationRequest {
            kind: request.kind,
            prompt: prompt.clone(),
            count: request.requested_count(),
            video_config: request.video_config.clone(),
            source_image,
        };

        let artifacts = self.backend.generate(&config, &generation).await?;
        if artifacts.is_empty() {
            return Err(ExecutionError::NoMedia);
        }

        let total = artifacts.len();
        let mut record_ids = Vec::with_capacity(total);
        for (i, artifact) in artifacts.into_iter().enumerate() {
            let origin = ArtifactOrigin {
                task_id,
                prompt: prompt.clone(),
                config_name: config.name.clone(),
                index: i + 1,
            };
            let id = self
                .records
                .save(&origin, artifact)
                .await
                .map_err(|source| ExecutionError::Save {
                    index: i + 1,
                    total,
                    source,
                })?;
            record_ids.push(id);
        }

        Ok(record_ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_errors_are_reported_verbatim() {
        let err = ExecutionError::from(BackendError::Api {
            status: 429,
            message: "slow down".into(),
        });
        assert_eq!(err.to_string(), "API error (HTTP 429): slow down");
    }

    #[test]
    fn save_error_names_position() {
        let err = ExecutionError::Save {
            index: 3,
            total: 3,
            source: StoreError::Database("disk full".into()),
        };
        assert_eq!(
            err.to_string(),
            "Failed to save result 3 of 3: Database error: disk full"
        );
    }

    #[test]
    fn empty_result_message() {
        assert_eq!(ExecutionError::NoMedia.to_string(), "provider returned no media");
    }
}
