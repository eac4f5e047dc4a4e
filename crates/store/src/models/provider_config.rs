//! Provider configuration rows.

use lumen_core::provider_config::{mask_api_key, ProviderConfig};
use lumen_core::types::Timestamp;
use sqlx::FromRow;

/// A row from the `provider_configs` table.
#[derive(Clone, FromRow)]
pub struct ProviderConfigRow {
    pub name: String,
    pub base_url: String,
    pub api_key: String,
    pub image_model: String,
    pub video_model: String,
    pub proxy: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl std::fmt::Debug for ProviderConfigRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfigRow")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("api_key", &mask_api_key(&self.api_key))
            .field("image_model", &self.image_model)
            .field("video_model", &self.video_model)
            .field("proxy", &self.proxy)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

impl From<ProviderConfigRow> for ProviderConfig {
    fn from(row: ProviderConfigRow) -> Self {
        ProviderConfig {
            name: row.name,
            base_url: row.base_url,
            api_key: row.api_key,
            image_model: row.image_model,
            video_model: row.video_model,
            proxy: row.proxy.filter(|p| !p.is_empty()),
        }
    }
}
