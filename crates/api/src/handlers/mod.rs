pub mod configs;
pub mod records;
pub mod settings;
pub mod tasks;
