//! Media record rows and insert DTO.

use lumen_core::media::{MediaKind, MediaRecord};
use lumen_core::records::StoreError;
use lumen_core::types::{DbId, TaskId, Timestamp};
use sqlx::FromRow;

/// A row from the `media_records` table.
#[derive(Debug, Clone, FromRow)]
pub struct MediaRecordRow {
    pub id: DbId,
    pub kind: String,
    pub filename: String,
    pub prompt: String,
    pub config_name: String,
    pub task_id: Option<TaskId>,
    pub created_at: Timestamp,
}

impl TryFrom<MediaRecordRow> for MediaRecord {
    type Error = StoreError;

    fn try_from(row: MediaRecordRow) -> Result<Self, Self::Error> {
        let kind = MediaKind::parse(&row.kind).ok_or_else(|| {
            StoreError::Corrupt(format!("media record {} has unknown kind '{}'", row.id, row.kind))
        })?;
        Ok(MediaRecord {
            id: row.id,
            kind,
            filename: row.filename,
            prompt: row.prompt,
            config_name: row.config_name,
            task_id: row.task_id,
            created_at: row.created_at,
        })
    }
}

/// DTO for inserting a media record.
#[derive(Debug, Clone)]
pub struct CreateMediaRecord {
    pub kind: MediaKind,
    pub filename: String,
    pub prompt: String,
    pub config_name: String,
    pub task_id: Option<TaskId>,
}
