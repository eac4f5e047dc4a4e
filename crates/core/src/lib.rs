//! Lumen domain core.
//!
//! Shared types, errors, and the seams the scheduler drives:
//!
//! - [`task`]: generation task model, submission validation, and the
//!   per-task state machine.
//! - [`task_store`]: bounded, insertion-ordered in-memory task table.
//! - [`task_events`]: lifecycle events and WebSocket message type names.
//! - [`backend`]: the [`GenerationBackend`](backend::GenerationBackend)
//!   trait implemented by provider adapters.
//! - [`records`]: the [`RecordStore`](records::RecordStore) trait for
//!   persisted media.
//! - [`provider_config`]: named provider configurations and the
//!   [`ConfigProvider`](provider_config::ConfigProvider) trait.

pub mod backend;
pub mod error;
pub mod media;
pub mod pagination;
pub mod provider_config;
pub mod records;
pub mod task;
pub mod task_events;
pub mod task_store;
pub mod types;
