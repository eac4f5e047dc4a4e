//! Generated media artifacts and their persisted records.

use serde::{Deserialize, Serialize};

use crate::types::{DbId, TaskId, Timestamp};

/// Kind of generated media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }

    /// Parse the stored column value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "image" => Some(MediaKind::Image),
            "video" => Some(MediaKind::Video),
            _ => None,
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One output returned by a generation backend, not yet persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct MediaArtifact {
    pub kind: MediaKind,
    /// File extension without the dot, e.g. `png`, `mp4`.
    pub extension: String,
    pub bytes: Vec<u8>,
}

impl MediaArtifact {
    pub fn new(kind: MediaKind, extension: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            kind,
            extension: extension.into(),
            bytes,
        }
    }

    /// MIME type derived from the extension, used for data URLs.
    pub fn mime_type(&self) -> &'static str {
        match self.extension.as_str() {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "webp" => "image/webp",
            "webm" => "video/webm",
            "mp4" => "video/mp4",
            _ => match self.kind {
                MediaKind::Image => "image/jpeg",
                MediaKind::Video => "video/mp4",
            },
        }
    }
}

// Artifacts can be megabytes; keep logs readable.
impl std::fmt::Debug for MediaArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaArtifact")
            .field("kind", &self.kind)
            .field("extension", &self.extension)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Where an artifact came from; stored alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactOrigin {
    pub task_id: TaskId,
    pub prompt: String,
    pub config_name: String,
    /// 1-based position of the artifact within its task's output.
    pub index: usize,
}

/// A persisted artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRecord {
    pub id: DbId,
    pub kind: MediaKind,
    pub filename: String,
    pub prompt: String,
    pub config_name: String,
    pub task_id: Option<TaskId>,
    pub created_at: Timestamp,
}
