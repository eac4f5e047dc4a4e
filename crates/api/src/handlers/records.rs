//! Handlers for persisted media records.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use lumen_core::media::MediaRecord;
use lumen_core::pagination::{clamp_page, clamp_page_size};
use lumen_core::types::DbId;
use serde::Serialize;

use crate::error::AppResult;
use crate::query::PageParams;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response DTOs
// ---------------------------------------------------------------------------

/// A record plus the URL its file is served from.
#[derive(Debug, Serialize)]
pub struct RecordResponse {
    #[serde(flatten)]
    pub record: MediaRecord,
    pub url: String,
}

impl From<MediaRecord> for RecordResponse {
    fn from(record: MediaRecord) -> Self {
        let url = format!("/media/{}", record.filename);
        Self { record, url }
    }
}

#[derive(Debug, Serialize)]
pub struct RecordPage {
    pub items: Vec<RecordResponse>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/records?page=&page_size=
///
/// Newest records first.
pub async fn list_records(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> AppResult<impl IntoResponse> {
    let page = state
        .records
        .list(clamp_page(params.page), clamp_page_size(params.page_size))
        .await?;
    let total_pages = page.total_pages();

    Ok(Json(DataResponse {
        data: RecordPage {
            items: page.items.into_iter().map(RecordResponse::from).collect(),
            total: page.total,
            page: page.page,
            page_size: page.page_size,
            total_pages,
        },
    }))
}

/// GET /api/v1/records/{id}
pub async fn get_record(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let record = state.records.get(id).await?;
    Ok(Json(DataResponse {
        data: RecordResponse::from(record),
    }))
}

/// DELETE /api/v1/records/{id}
///
/// Removes the row and its file.
pub async fn delete_record(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    state.records.delete(id).await?;
    tracing::info!(record_id = id, "Media record deleted");
    Ok(StatusCode::NO_CONTENT)
}
