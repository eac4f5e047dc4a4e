//! SQLite-backed [`RecordStore`] and [`ConfigProvider`].

use async_trait::async_trait;
use lumen_core::media::{ArtifactOrigin, MediaArtifact, MediaRecord};
use lumen_core::pagination::{clamp_page, clamp_page_size, Page};
use lumen_core::provider_config::{ConfigProvider, ProviderConfig};
use lumen_core::records::{RecordStore, StoreError};
use lumen_core::types::{DbId, TaskId};

use crate::media_dir::{extension_of, MediaDir};
use crate::models::media_record::CreateMediaRecord;
use crate::repositories::{ConfigRepo, MediaRecordRepo};
use crate::{db_error, DbPool};

const MEDIA_RECORD: &str = "media_record";
const PROVIDER_CONFIG: &str = "provider_config";

/// Media metadata in SQLite, media bytes in a [`MediaDir`].
#[derive(Debug, Clone)]
pub struct SqliteRecordStore {
    pool: DbPool,
    media: MediaDir,
}

impl SqliteRecordStore {
    pub fn new(pool: DbPool, media: MediaDir) -> Self {
        Self { pool, media }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn media_dir(&self) -> &MediaDir {
        &self.media
    }

    async fn find(&self, id: DbId) -> Result<MediaRecord, StoreError> {
        MediaRecordRepo::find_by_id(&self.pool, id)
            .await
            .map_err(db_error)?
            .ok_or_else(|| StoreError::NotFound {
                entity: MEDIA_RECORD,
                id: id.to_string(),
            })?
            .try_into()
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn save(
        &self,
        origin: &ArtifactOrigin,
        artifact: MediaArtifact,
    ) -> Result<DbId, StoreError> {
        let filename = MediaDir::new_filename(
            artifact.kind,
            origin.index,
            &artifact.extension,
            chrono::Utc::now(),
        );
        self.media.write(&filename, &artifact.bytes).await?;

        let input = CreateMediaRecord {
            kind: artifact.kind,
            filename: filename.clone(),
            prompt: origin.prompt.clone(),
            config_name: origin.config_name.clone(),
            task_id: Some(origin.task_id),
        };
        let row = match MediaRecordRepo::insert(&self.pool, &input).await {
            Ok(row) => row,
            Err(e) => {
                // Without a row nothing can reach the file.
                if let Err(cleanup) = self.media.remove(&filename).await {
                    tracing::warn!(%filename, error = %cleanup, "Failed to remove orphaned media file");
                }
                return Err(db_error(e));
            }
        };

        tracing::info!(
            record_id = row.id,
            task_id = %origin.task_id,
            %filename,
            size = artifact.bytes.len(),
            "Media saved",
        );
        Ok(row.id)
    }

    async fn list(&self, page: i64, page_size: i64) -> Result<Page<MediaRecord>, StoreError> {
        let page = clamp_page(Some(page));
        let page_size = clamp_page_size(Some(page_size));

        let total = MediaRecordRepo::count(&self.pool).await.map_err(db_error)?;
        // Huge page numbers saturate to an offset past every row.
        let offset = (page - 1).saturating_mul(page_size);
        let rows = MediaRecordRepo::list_page(&self.pool, page_size, offset)
            .await
            .map_err(db_error)?;
        let items = rows
            .into_iter()
            .map(MediaRecord::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            items,
            total,
            page,
            page_size,
        })
    }

    async fn get(&self, id: DbId) -> Result<MediaRecord, StoreError> {
        self.find(id).await
    }

    async fn delete(&self, id: DbId) -> Result<(), StoreError> {
        let record = self.find(id).await?;
        let deleted = MediaRecordRepo::delete(&self.pool, id)
            .await
            .map_err(db_error)?;
        if !deleted {
            return Err(StoreError::NotFound {
                entity: MEDIA_RECORD,
                id: id.to_string(),
            });
        }
        self.media.remove(&record.filename).await?;
        tracing::info!(record_id = id, filename = %record.filename, "Media record deleted");
        Ok(())
    }

    async fn load_artifact(&self, id: DbId) -> Result<MediaArtifact, StoreError> {
        let record = self.find(id).await?;
        let bytes = self.media.read(&record.filename).await?;
        Ok(MediaArtifact::new(
            record.kind,
            extension_of(&record.filename),
            bytes,
        ))
    }

    async fn list_by_task(&self, task_id: TaskId) -> Result<Vec<MediaRecord>, StoreError> {
        MediaRecordRepo::list_by_task(&self.pool, task_id)
            .await
            .map_err(db_error)?
            .into_iter()
            .map(MediaRecord::try_from)
            .collect()
    }
}

#[async_trait]
impl ConfigProvider for SqliteRecordStore {
    async fn resolve(&self, name: &str) -> Result<ProviderConfig, StoreError> {
        ConfigRepo::find_by_name(&self.pool, name)
            .await
            .map_err(db_error)?
            .map(ProviderConfig::from)
            .ok_or_else(|| StoreError::NotFound {
                entity: PROVIDER_CONFIG,
                id: name.to_string(),
            })
    }

    async fn list_names(&self) -> Result<Vec<String>, StoreError> {
        ConfigRepo::list_names(&self.pool).await.map_err(db_error)
    }
}
