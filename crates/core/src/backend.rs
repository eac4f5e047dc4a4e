//! Generation backend seam.
//!
//! The scheduler makes exactly one [`GenerationBackend::generate`] call per
//! task and treats the outcome as all-or-nothing: any error fails the task.

use async_trait::async_trait;

use crate::media::MediaArtifact;
use crate::provider_config::ProviderConfig;
use crate::task::{TaskKind, VideoConfig};

/// Everything a backend needs to produce media for one task.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub kind: TaskKind,
    pub prompt: String,
    /// Number of images requested; always 1 for video.
    pub count: u32,
    pub video_config: Option<VideoConfig>,
    /// Source frame for image-to-video.
    pub source_image: Option<MediaArtifact>,
}

/// Errors reported by a generation backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The provider answered with a non-success HTTP status.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The provider answered 200 but the body carried an error object.
    #[error("API error: {0}")]
    Provider(String),

    /// Network, DNS, TLS, or timeout failure.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The provider answered with something we could not interpret.
    #[error("Unexpected response: {0}")]
    InvalidResponse(String),

    /// A media download never produced a usable file.
    #[error("Download failed: {0}")]
    Download(String),
}

/// Performs the actual image / video synthesis call.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate(
        &self,
        config: &ProviderConfig,
        request: &GenerationRequest,
    ) -> Result<Vec<MediaArtifact>, BackendError>;
}
