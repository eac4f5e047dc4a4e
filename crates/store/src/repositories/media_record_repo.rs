//! Repository for the `media_records` table.

use lumen_core::types::{DbId, TaskId};
use sqlx::SqlitePool;

use crate::models::media_record::{CreateMediaRecord, MediaRecordRow};

/// Column list for `media_records` queries.
const COLUMNS: &str = "id, kind, filename, prompt, config_name, task_id, created_at";

/// Provides CRUD operations for media records.
pub struct MediaRecordRepo;

impl MediaRecordRepo {
    /// Insert a record, returning the created row.
    pub async fn insert(
        pool: &SqlitePool,
        input: &CreateMediaRecord,
    ) -> Result<MediaRecordRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO media_records (kind, filename, prompt, config_name, task_id, created_at) \
             VALUES (?, ?, ?, ?, ?, ?) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MediaRecordRow>(&query)
            .bind(input.kind.as_str())
            .bind(&input.filename)
            .bind(&input.prompt)
            .bind(&input.config_name)
            .bind(input.task_id)
            .bind(chrono::Utc::now())
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &SqlitePool,
        id: DbId,
    ) -> Result<Option<MediaRecordRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM media_records WHERE id = ?");
        sqlx::query_as::<_, MediaRecordRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// One page of records, newest first.
    pub async fn list_page(
        pool: &SqlitePool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<MediaRecordRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM media_records ORDER BY id DESC LIMIT ? OFFSET ?");
        sqlx::query_as::<_, MediaRecordRow>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM media_records")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    /// Records produced by one task, in save order.
    pub async fn list_by_task(
        pool: &SqlitePool,
        task_id: TaskId,
    ) -> Result<Vec<MediaRecordRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM media_records WHERE task_id = ? ORDER BY id");
        sqlx::query_as::<_, MediaRecordRow>(&query)
            .bind(task_id)
            .fetch_all(pool)
            .await
    }

    /// Delete a record by ID. Returns `true` if a row was deleted.
    pub async fn delete(pool: &SqlitePool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM media_records WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
