use lumen_core::provider_config::ProviderConfig;
use lumen_store::{DbPool, MediaDir, SqliteRecordStore};
use tempfile::TempDir;

/// Fresh in-memory database with the schema applied.
pub async fn test_pool() -> DbPool {
    let pool = lumen_store::create_pool("sqlite::memory:")
        .await
        .expect("in-memory pool");
    lumen_store::run_migrations(&pool)
        .await
        .expect("migrations apply");
    pool
}

/// Record store over an in-memory database and a temporary media directory.
///
/// Keep the returned [`TempDir`] alive for the duration of the test.
pub async fn test_store() -> (SqliteRecordStore, TempDir) {
    let tmp = tempfile::tempdir().expect("tempdir");
    let media = MediaDir::open(tmp.path().join("output"))
        .await
        .expect("media dir");
    (SqliteRecordStore::new(test_pool().await, media), tmp)
}

pub fn provider_config(name: &str) -> ProviderConfig {
    ProviderConfig {
        name: name.to_string(),
        base_url: "https://api.example.com".to_string(),
        api_key: "sk-live-0123456789".to_string(),
        image_model: "image-1".to_string(),
        video_model: "video-1".to_string(),
        proxy: None,
    }
}
