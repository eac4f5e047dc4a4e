//! Handlers for named provider configurations.
//!
//! API keys are never returned in full; every response goes through
//! [`ProviderConfig::masked`].

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use lumen_core::error::CoreError;
use lumen_core::provider_config::{is_masked_api_key, ProviderConfig};
use lumen_store::repositories::ConfigRepo;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

/// Body for `PUT /configs/{name}`.
///
/// An omitted, empty, or masked `api_key` keeps the stored key, so clients
/// can send back a config exactly as `GET` returned it.
#[derive(Debug, Deserialize)]
pub struct UpdateConfigRequest {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    pub image_model: String,
    pub video_model: String,
    #[serde(default)]
    pub proxy: Option<String>,
}

fn not_found(name: String) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "ProviderConfig",
        id: name,
    })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/configs
pub async fn list_configs(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let configs: Vec<ProviderConfig> = ConfigRepo::list_all(&state.pool)
        .await?
        .into_iter()
        .map(|row| ProviderConfig::from(row).masked())
        .collect();

    Ok(Json(DataResponse { data: configs }))
}

/// POST /api/v1/configs
///
/// Responds `409 Conflict` if the name is taken.
pub async fn create_config(
    State(state): State<AppState>,
    Json(body): Json<ProviderConfig>,
) -> AppResult<impl IntoResponse> {
    body.validate()?;

    let row = ConfigRepo::insert(&state.pool, &body).await?;
    tracing::info!(config_name = %row.name, "Provider config created");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: ProviderConfig::from(row).masked(),
        }),
    ))
}

/// GET /api/v1/configs/{name}
pub async fn get_config(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<impl IntoResponse> {
    let row = ConfigRepo::find_by_name(&state.pool, &name)
        .await?
        .ok_or_else(|| not_found(name))?;

    Ok(Json(DataResponse {
        data: ProviderConfig::from(row).masked(),
    }))
}

/// PUT /api/v1/configs/{name}
///
/// Replace a config's settings. Tasks already running keep the settings
/// they resolved at start.
pub async fn update_config(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(body): Json<UpdateConfigRequest>,
) -> AppResult<impl IntoResponse> {
    let existing = ConfigRepo::find_by_name(&state.pool, &name)
        .await?
        .ok_or_else(|| not_found(name.clone()))?;

    let api_key = body
        .api_key
        .filter(|key| !key.trim().is_empty() && !is_masked_api_key(key))
        .unwrap_or(existing.api_key);
    let updated = ProviderConfig {
        name: name.clone(),
        base_url: body.base_url,
        api_key,
        image_model: body.image_model,
        video_model: body.video_model,
        proxy: body.proxy.filter(|p| !p.trim().is_empty()),
    };
    updated.validate()?;

    let row = ConfigRepo::update(&state.pool, &name, &updated)
        .await?
        .ok_or_else(|| not_found(name))?;
    tracing::info!(config_name = %row.name, "Provider config updated");

    Ok(Json(DataResponse {
        data: ProviderConfig::from(row).masked(),
    }))
}

/// DELETE /api/v1/configs/{name}
pub async fn delete_config(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<StatusCode> {
    if !ConfigRepo::delete(&state.pool, &name).await? {
        return Err(not_found(name));
    }
    tracing::info!(config_name = %name, "Provider config deleted");
    Ok(StatusCode::NO_CONTENT)
}
