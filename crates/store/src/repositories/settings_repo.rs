//! Repository for the `settings` key/value table.

use sqlx::SqlitePool;

use crate::models::setting::{Setting, MAX_CONCURRENT_KEY};

pub struct SettingsRepo;

impl SettingsRepo {
    pub async fn get(pool: &SqlitePool, key: &str) -> Result<Option<Setting>, sqlx::Error> {
        sqlx::query_as::<_, Setting>("SELECT key, value, updated_at FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(pool)
            .await
    }

    /// Insert or replace a setting.
    pub async fn set(pool: &SqlitePool, key: &str, value: &str) -> Result<Setting, sqlx::Error> {
        sqlx::query_as::<_, Setting>(
            "INSERT INTO settings (key, value, updated_at) VALUES (?, ?, ?) \
             ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at \
             RETURNING key, value, updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(chrono::Utc::now())
        .fetch_one(pool)
        .await
    }

    /// Stored concurrency budget, if any. Unparseable values are ignored.
    pub async fn max_concurrent(pool: &SqlitePool) -> Result<Option<usize>, sqlx::Error> {
        let Some(setting) = Self::get(pool, MAX_CONCURRENT_KEY).await? else {
            return Ok(None);
        };
        match setting.value.parse::<usize>() {
            Ok(value) => Ok(Some(value)),
            Err(_) => {
                tracing::warn!(value = %setting.value, "Ignoring invalid stored max_concurrent");
                Ok(None)
            }
        }
    }

    pub async fn set_max_concurrent(pool: &SqlitePool, value: usize) -> Result<(), sqlx::Error> {
        Self::set(pool, MAX_CONCURRENT_KEY, &value.to_string()).await?;
        Ok(())
    }
}
