pub mod media_record;
pub mod provider_config;
pub mod setting;
