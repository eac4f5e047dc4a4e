//! Repository for the `provider_configs` table.
//!
//! Rows are keyed by their unique name; callers validate input with
//! [`ProviderConfig::validate`] before writing.

use lumen_core::provider_config::ProviderConfig;
use sqlx::SqlitePool;

use crate::models::provider_config::ProviderConfigRow;

/// Column list for `provider_configs` queries.
const COLUMNS: &str = "\
    name, base_url, api_key, image_model, video_model, proxy, \
    created_at, updated_at";

/// Provides CRUD operations for provider configurations.
pub struct ConfigRepo;

impl ConfigRepo {
    /// List all configurations, ordered by name ascending.
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<ProviderConfigRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM provider_configs ORDER BY name");
        sqlx::query_as::<_, ProviderConfigRow>(&query)
            .fetch_all(pool)
            .await
    }

    pub async fn list_names(pool: &SqlitePool) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT name FROM provider_configs ORDER BY name")
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    pub async fn find_by_name(
        pool: &SqlitePool,
        name: &str,
    ) -> Result<Option<ProviderConfigRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM provider_configs WHERE name = ?");
        sqlx::query_as::<_, ProviderConfigRow>(&query)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// Insert a new configuration. A duplicate name surfaces as a unique
    /// constraint violation.
    pub async fn insert(
        pool: &SqlitePool,
        input: &ProviderConfig,
    ) -> Result<ProviderConfigRow, sqlx::Error> {
        let now = chrono::Utc::now();
        let query = format!(
            "INSERT INTO provider_configs \
                (name, base_url, api_key, image_model, video_model, proxy, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProviderConfigRow>(&query)
            .bind(&input.name)
            .bind(&input.base_url)
            .bind(&input.api_key)
            .bind(&input.image_model)
            .bind(&input.video_model)
            .bind(&input.proxy)
            .bind(now)
            .bind(now)
            .fetch_one(pool)
            .await
    }

    /// Replace the settings of `name`. Returns `None` if not found.
    ///
    /// The stored name never changes; `input.name` is ignored.
    pub async fn update(
        pool: &SqlitePool,
        name: &str,
        input: &ProviderConfig,
    ) -> Result<Option<ProviderConfigRow>, sqlx::Error> {
        let query = format!(
            "UPDATE provider_configs SET \
                base_url = ?, api_key = ?, image_model = ?, video_model = ?, proxy = ?, \
                updated_at = ? \
             WHERE name = ? \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProviderConfigRow>(&query)
            .bind(&input.base_url)
            .bind(&input.api_key)
            .bind(&input.image_model)
            .bind(&input.video_model)
            .bind(&input.proxy)
            .bind(chrono::Utc::now())
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// Delete a configuration by name. Returns `true` if a row was deleted.
    pub async fn delete(pool: &SqlitePool, name: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM provider_configs WHERE name = ?")
            .bind(name)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
