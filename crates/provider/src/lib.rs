//! OpenAI-compatible generation provider client.
//!
//! Implements [`GenerationBackend`](lumen_core::backend::GenerationBackend)
//! against the `/v1/images/generations` and `/v1/chat/completions`
//! endpoints, including batching, response-format fallback, and the
//! delayed video download loop.

pub mod client;
pub mod error;
pub mod response;

pub use client::OpenAiCompatBackend;
pub use error::ProviderError;
