pub mod config_repo;
pub mod media_record_repo;
pub mod settings_repo;

pub use config_repo::ConfigRepo;
pub use media_record_repo::MediaRecordRepo;
pub use settings_repo::SettingsRepo;
