//! Named provider configurations.
//!
//! A task refers to its provider by name; the scheduler resolves that name
//! through a [`ConfigProvider`] at submission and again at execution time.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::records::StoreError;

/// Maximum length of a configuration name.
pub const MAX_CONFIG_NAME_LEN: usize = 64;

/// Connection settings for one OpenAI-compatible provider account.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub name: String,
    pub base_url: String,
    pub api_key: String,
    pub image_model: String,
    pub video_model: String,
    #[serde(default)]
    pub proxy: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("api_key", &mask_api_key(&self.api_key))
            .field("image_model", &self.image_model)
            .field("video_model", &self.video_model)
            .field("proxy", &self.proxy)
            .finish()
    }
}

impl ProviderConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_config_name(&self.name)?;
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(CoreError::Validation(
                "base_url must start with http:// or https://".to_string(),
            ));
        }
        for (field, value) in [
            ("api_key", &self.api_key),
            ("image_model", &self.image_model),
            ("video_model", &self.video_model),
        ] {
            if value.trim().is_empty() {
                return Err(CoreError::Validation(format!("{field} must not be empty")));
            }
        }
        if let Some(proxy) = self.proxy.as_deref().filter(|p| !p.is_empty()) {
            if !proxy.contains("://") {
                return Err(CoreError::Validation(format!(
                    "proxy '{proxy}' must be a URL, e.g. http://127.0.0.1:7890"
                )));
            }
        }
        Ok(())
    }

    /// Base URL without trailing slashes.
    pub fn api_root(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Copy safe to return from list/get endpoints.
    pub fn masked(&self) -> ProviderConfig {
        ProviderConfig {
            api_key: mask_api_key(&self.api_key),
            ..self.clone()
        }
    }
}

/// Validate a configuration name: 1..=64 chars of `[A-Za-z0-9_.-]`.
pub fn validate_config_name(name: &str) -> Result<(), CoreError> {
    if name.is_empty() || name.len() > MAX_CONFIG_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "Config name must be 1 to {MAX_CONFIG_NAME_LEN} characters"
        )));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(CoreError::Validation(format!(
            "Config name '{name}' may only contain letters, digits, '_', '-' and '.'"
        )));
    }
    Ok(())
}

const MASK_PREFIX: &str = "****";

/// Keep only the last four characters of a secret.
pub fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 4 {
        return MASK_PREFIX.to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{MASK_PREFIX}{tail}")
}

/// Whether `key` looks like the output of [`mask_api_key`] rather than a
/// real secret.
pub fn is_masked_api_key(key: &str) -> bool {
    key.starts_with(MASK_PREFIX)
}

/// Resolves provider configuration names.
#[async_trait]
pub trait ConfigProvider: Send + Sync {
    async fn resolve(&self, name: &str) -> Result<ProviderConfig, StoreError>;

    async fn list_names(&self) -> Result<Vec<String>, StoreError>;
}
