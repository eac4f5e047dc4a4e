//! Generation task model, submission validation, and lifecycle transitions.
//!
//! A task moves through `queued -> running -> {succeeded, failed}` exactly
//! once. Transitions are expressed as [`TaskTransition`] values and applied
//! with [`Task::apply`]; anything else is rejected with
//! [`CoreError::Conflict`].

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::media::MediaKind;
use crate::types::{DbId, TaskId, Timestamp};

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Smallest number of images a single task may request.
pub const MIN_IMAGE_COUNT: u32 = 1;
/// Largest number of images a single task may request.
pub const MAX_IMAGE_COUNT: u32 = 10;
/// Image count used when the request omits one.
pub const DEFAULT_IMAGE_COUNT: u32 = 1;
/// Prompt text sent for image-to-video tasks submitted without a prompt.
pub const DEFAULT_ANIMATE_PROMPT: &str = "Animate this image";

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// What a task generates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Image,
    Video,
}

impl TaskKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskKind::Image => "image",
            TaskKind::Video => "video",
        }
    }

    /// Kind of artifact a task of this kind produces.
    pub fn media_kind(self) -> MediaKind {
        match self {
            TaskKind::Image => MediaKind::Image,
            TaskKind::Video => MediaKind::Video,
        }
    }
}

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Queued => "queued",
            TaskStatus::Running => "running",
            TaskStatus::Succeeded => "succeeded",
            TaskStatus::Failed => "failed",
        }
    }

    /// `succeeded` and `failed` are final.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Succeeded | TaskStatus::Failed)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Submission DTO
// ---------------------------------------------------------------------------

/// Provider-side video options, forwarded untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
}

/// DTO for submitting a new task via `POST /api/v1/tasks`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitTask {
    pub kind: TaskKind,
    #[serde(default)]
    pub prompt: String,
    /// Number of images; image tasks only.
    #[serde(default)]
    pub count: Option<u32>,
    pub config_name: String,
    #[serde(default)]
    pub video_config: Option<VideoConfig>,
    /// Stored image to animate; video tasks only.
    #[serde(default)]
    pub source_image_id: Option<DbId>,
}

impl SubmitTask {
    /// Text-to-image request.
    pub fn image(prompt: impl Into<String>, count: u32, config_name: impl Into<String>) -> Self {
        Self {
            kind: TaskKind::Image,
            prompt: prompt.into(),
            count: Some(count),
            config_name: config_name.into(),
            video_config: None,
            source_image_id: None,
        }
    }

    /// Text-to-video request with default provider options.
    pub fn video(prompt: impl Into<String>, config_name: impl Into<String>) -> Self {
        Self {
            kind: TaskKind::Video,
            prompt: prompt.into(),
            count: None,
            config_name: config_name.into(),
            video_config: None,
            source_image_id: None,
        }
    }

    /// Number of artifacts this request asks the provider for.
    pub fn requested_count(&self) -> u32 {
        match self.kind {
            TaskKind::Image => self.count.unwrap_or(DEFAULT_IMAGE_COUNT),
            TaskKind::Video => 1,
        }
    }

    /// Structural validation. Whether `config_name` resolves is checked by
    /// the scheduler against its config provider.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.config_name.trim().is_empty() {
            return Err(CoreError::Validation(
                "config_name must not be empty".to_string(),
            ));
        }

        match self.kind {
            TaskKind::Image => {
                if self.prompt.trim().is_empty() {
                    return Err(CoreError::Validation("prompt must not be empty".to_string()));
                }
                let count = self.requested_count();
                if !(MIN_IMAGE_COUNT..=MAX_IMAGE_COUNT).contains(&count) {
                    return Err(CoreError::Validation(format!(
                        "count must be between {MIN_IMAGE_COUNT} and {MAX_IMAGE_COUNT}, got {count}"
                    )));
                }
                if self.video_config.is_some() {
                    return Err(CoreError::Validation(
                        "video_config is only valid for video tasks".to_string(),
                    ));
                }
                if self.source_image_id.is_some() {
                    return Err(CoreError::Validation(
                        "source_image_id is only valid for video tasks".to_string(),
                    ));
                }
            }
            TaskKind::Video => {
                if let Some(count) = self.count.filter(|&c| c != 1) {
                    return Err(CoreError::Validation(format!(
                        "video tasks produce exactly one video, got count {count}"
                    )));
                }
                if self.prompt.trim().is_empty() && self.source_image_id.is_none() {
                    return Err(CoreError::Validation(
                        "prompt must not be empty without a source image".to_string(),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Prompt text to send to the provider.
    pub fn effective_prompt(&self) -> &str {
        if self.prompt.trim().is_empty() && self.source_image_id.is_some() {
            DEFAULT_ANIMATE_PROMPT
        } else {
            &self.prompt
        }
    }
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// A state change requested by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskTransition {
    /// `queued -> running`
    Start,
    /// `running -> succeeded` with the persisted record ids, in order.
    Succeed(Vec<DbId>),
    /// `running -> failed` with the verbatim failure reason.
    Fail(String),
}

/// Immutable copy of a task's fields, safe to hand across threads and to
/// serialize onto the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub id: TaskId,
    pub kind: TaskKind,
    pub prompt: String,
    pub count: u32,
    pub config_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_config: Option<VideoConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_image_id: Option<DbId>,
    pub status: TaskStatus,
    pub created_at: Timestamp,
    pub started_at: Option<Timestamp>,
    pub finished_at: Option<Timestamp>,
    pub error: Option<String>,
    pub result_ids: Option<Vec<DbId>>,
}

/// The authoritative, mutable task record. Owned by the task store.
#[derive(Debug, Clone)]
pub struct Task {
    id: TaskId,
    request: SubmitTask,
    status: TaskStatus,
    created_at: Timestamp,
    started_at: Option<Timestamp>,
    finished_at: Option<Timestamp>,
    error: Option<String>,
    result_ids: Option<Vec<DbId>>,
}

impl Task {
    /// Create a queued task from an already-validated request.
    pub fn new(request: SubmitTask) -> Self {
        Self {
            id: TaskId::new_v4(),
            request,
            status: TaskStatus::Queued,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            error: None,
            result_ids: None,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn request(&self) -> &SubmitTask {
        &self.request
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Apply a transition, stamping the matching timestamp.
    pub fn apply(&mut self, transition: TaskTransition) -> Result<(), CoreError> {
        match (self.status, transition) {
            (TaskStatus::Queued, TaskTransition::Start) => {
                self.status = TaskStatus::Running;
                self.started_at = Some(stamp_after(self.created_at));
            }
            (TaskStatus::Running, TaskTransition::Succeed(result_ids)) => {
                self.status = TaskStatus::Succeeded;
                self.result_ids = Some(result_ids);
                self.finished_at = Some(stamp_after(self.started_at.unwrap_or(self.created_at)));
            }
            (TaskStatus::Running, TaskTransition::Fail(reason)) => {
                self.status = TaskStatus::Failed;
                self.error = Some(reason);
                self.finished_at = Some(stamp_after(self.started_at.unwrap_or(self.created_at)));
            }
            (from, transition) => {
                let to = match transition {
                    TaskTransition::Start => TaskStatus::Running,
                    TaskTransition::Succeed(_) => TaskStatus::Succeeded,
                    TaskTransition::Fail(_) => TaskStatus::Failed,
                };
                return Err(CoreError::Conflict(format!(
                    "Task {} cannot move from {from} to {to}",
                    self.id
                )));
            }
        }
        Ok(())
    }

    pub fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            id: self.id,
            kind: self.request.kind,
            prompt: self.request.prompt.clone(),
            count: self.request.requested_count(),
            config_name: self.request.config_name.clone(),
            video_config: self.request.video_config.clone(),
            source_image_id: self.request.source_image_id,
            status: self.status,
            created_at: self.created_at,
            started_at: self.started_at,
            finished_at: self.finished_at,
            error: self.error.clone(),
            result_ids: self.result_ids.clone(),
        }
    }
}

/// Current time, clamped so lifecycle stamps never go backwards.
fn stamp_after(previous: Timestamp) -> Timestamp {
    Utc::now().max(previous)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
