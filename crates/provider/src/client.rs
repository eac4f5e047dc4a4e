//! HTTP client for OpenAI-compatible image and video endpoints.
//!
//! One [`reqwest::Client`] is built per generation call because every
//! provider configuration may route through its own proxy.

use std::time::Duration;

use async_trait::async_trait;
use lumen_core::backend::{BackendError, GenerationBackend, GenerationRequest};
use lumen_core::media::{MediaArtifact, MediaKind};
use lumen_core::provider_config::ProviderConfig;
use lumen_core::task::{TaskKind, DEFAULT_ANIMATE_PROMPT};
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde_json::{json, Value};

use crate::error::ProviderError;
use crate::response::{
    data_url, decode_b64_image, embedded_error, error_message, image_extension,
    parse_image_payload, parse_video_response, video_extension, ImagePayload, MIN_VIDEO_BYTES,
};

/// Images requested per `/v1/images/generations` call.
pub const DEFAULT_BATCH_SIZE: u32 = 2;
pub const DEFAULT_IMAGE_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_VIDEO_TIMEOUT: Duration = Duration::from_secs(600);
/// Rendered videos often 404 for a while after the URL is handed out.
pub const DEFAULT_DOWNLOAD_ATTEMPTS: u32 = 12;
pub const DEFAULT_DOWNLOAD_RETRY_DELAY: Duration = Duration::from_secs(10);

const IMAGE_SIZE: &str = "1024x1024";
const IMAGE_QUALITY: &str = "standard";

/// [`GenerationBackend`] speaking the OpenAI-compatible REST dialect.
#[derive(Debug, Clone)]
pub struct OpenAiCompatBackend {
    batch_size: u32,
    image_timeout: Duration,
    video_timeout: Duration,
    download_attempts: u32,
    download_retry_delay: Duration,
}

impl Default for OpenAiCompatBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenAiCompatBackend {
    pub fn new() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            image_timeout: DEFAULT_IMAGE_TIMEOUT,
            video_timeout: DEFAULT_VIDEO_TIMEOUT,
            download_attempts: DEFAULT_DOWNLOAD_ATTEMPTS,
            download_retry_delay: DEFAULT_DOWNLOAD_RETRY_DELAY,
        }
    }

    /// Override the video download retry policy.
    pub fn with_download_retry(mut self, attempts: u32, delay: Duration) -> Self {
        self.download_attempts = attempts.max(1);
        self.download_retry_delay = delay;
        self
    }

    fn http_client(
        &self,
        config: &ProviderConfig,
        timeout: Duration,
    ) -> Result<reqwest::Client, ProviderError> {
        let mut builder = reqwest::Client::builder().timeout(timeout);
        if let Some(proxy) = config.proxy.as_deref().filter(|p| !p.is_empty()) {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }
        Ok(builder.build()?)
    }

    // ---- images ----

    /// Generate `count` images in batches.
    ///
    /// A failing batch after at least one successful batch ends generation
    /// early and returns what was produced so far.
    pub async fn generate_images(
        &self,
        config: &ProviderConfig,
        prompt: &str,
        count: u32,
    ) -> Result<Vec<MediaArtifact>, ProviderError> {
        let client = self.http_client(config, self.image_timeout)?;
        let mut artifacts = Vec::with_capacity(count as usize);
        let mut remaining = count;

        while remaining > 0 {
            let n = remaining.min(self.batch_size);
            match self.image_batch(&client, config, prompt, n).await {
                Ok(batch) => artifacts.extend(batch),
                Err(e) if artifacts.is_empty() => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        config = %config.name,
                        produced = artifacts.len(),
                        requested = count,
                        error = %e,
                        "Image batch failed, returning partial result",
                    );
                    break;
                }
            }
            remaining -= n;
        }

        tracing::info!(config = %config.name, count = artifacts.len(), "Images generated");
        Ok(artifacts)
    }

    async fn image_batch(
        &self,
        client: &reqwest::Client,
        config: &ProviderConfig,
        prompt: &str,
        n: u32,
    ) -> Result<Vec<MediaArtifact>, ProviderError> {
        match self.request_images(client, config, prompt, n, "b64_json").await {
            Err(e) if e.is_format_error() => {
                tracing::warn!(error = %e, "b64_json response unusable, retrying with url format");
                self.request_images(client, config, prompt, n, "url").await
            }
            other => other,
        }
    }

    async fn request_images(
        &self,
        client: &reqwest::Client,
        config: &ProviderConfig,
        prompt: &str,
        n: u32,
        response_format: &str,
    ) -> Result<Vec<MediaArtifact>, ProviderError> {
        let body = json!({
            "model": config.image_model,
            "prompt": prompt,
            "n": n,
            "stream": false,
            "size": IMAGE_SIZE,
            "quality": IMAGE_QUALITY,
            "response_format": response_format,
        });

        tracing::debug!(config = %config.name, n, response_format, "Requesting images");
        let response = client
            .post(format!("{}/v1/images/generations", config.api_root()))
            .bearer_auth(&config.api_key)
            .json(&body)
            .send()
            .await?;
        let text = Self::ensure_success(response).await?.text().await?;

        let json: Value = serde_json::from_str(&text)
            .map_err(|e| ProviderError::Format(format!("Invalid JSON in image response: {e}")))?;
        if let Some(message) = embedded_error(&json) {
            return Err(ProviderError::Provider(message));
        }

        match parse_image_payload(&json)? {
            ImagePayload::Base64(items) => items
                .iter()
                .map(|item| Ok(MediaArtifact::new(MediaKind::Image, "png", decode_b64_image(item)?)))
                .collect(),
            ImagePayload::Urls(urls) => {
                let mut artifacts = Vec::with_capacity(urls.len());
                for url in &urls {
                    artifacts.push(Self::download_image(client, url).await?);
                }
                Ok(artifacts)
            }
        }
    }

    async fn download_image(
        client: &reqwest::Client,
        url: &str,
    ) -> Result<MediaArtifact, ProviderError> {
        let response = Self::ensure_success(client.get(url).send().await?).await?;
        let extension = image_extension(&Self::content_type(&response), url);
        let bytes = response.bytes().await?;
        Ok(MediaArtifact::new(MediaKind::Image, extension, bytes.to_vec()))
    }

    // ---- video ----

    pub async fn generate_video(
        &self,
        config: &ProviderConfig,
        request: &GenerationRequest,
    ) -> Result<MediaArtifact, ProviderError> {
        let client = self.http_client(config, self.video_timeout)?;

        let prompt = if request.prompt.trim().is_empty() {
            DEFAULT_ANIMATE_PROMPT
        } else {
            request.prompt.as_str()
        };
        let content = match &request.source_image {
            Some(image) => json!([
                {
                    "type": "image_url",
                    "image_url": { "url": data_url(image.mime_type(), &image.bytes) },
                },
                { "type": "text", "text": prompt },
            ]),
            None => json!(prompt),
        };
        let video_config = match &request.video_config {
            Some(cfg) => json!(cfg),
            None => json!({}),
        };
        let body = json!({
            "model": config.video_model,
            "messages": [{ "role": "user", "content": content }],
            "stream": false,
            "video_config": video_config,
        });

        tracing::info!(
            config = %config.name,
            image_to_video = request.source_image.is_some(),
            "Requesting video",
        );
        let response = client
            .post(format!("{}/v1/chat/completions", config.api_root()))
            .bearer_auth(&config.api_key)
            .json(&body)
            .send()
            .await?;
        let text = Self::ensure_success(response).await?.text().await?;

        let url = parse_video_response(&text)?;
        tracing::info!(%url, "Video URL received, downloading");
        self.download_video(&client, &url).await
    }

    /// Fetch a rendered video, waiting while the provider still reports
    /// 404 or serves a placeholder body.
    async fn download_video(
        &self,
        client: &reqwest::Client,
        url: &str,
    ) -> Result<MediaArtifact, ProviderError> {
        let mut last_problem = String::new();

        for attempt in 1..=self.download_attempts {
            let response = client.get(url).send().await?;
            if response.status() == StatusCode::NOT_FOUND {
                last_problem = "HTTP 404".to_string();
            } else {
                let response = Self::ensure_success(response).await?;
                let extension = video_extension(&Self::content_type(&response), url);
                let bytes = response.bytes().await?;
                if bytes.len() >= MIN_VIDEO_BYTES {
                    tracing::info!(attempt, size = bytes.len(), "Video downloaded");
                    return Ok(MediaArtifact::new(MediaKind::Video, extension, bytes.to_vec()));
                }
                last_problem = format!("file too small ({} bytes)", bytes.len());
            }

            if attempt < self.download_attempts {
                tracing::info!(
                    attempt,
                    max_attempts = self.download_attempts,
                    reason = %last_problem,
                    "Video not ready, retrying download",
                );
                tokio::time::sleep(self.download_retry_delay).await;
            }
        }

        Err(ProviderError::Download(format!(
            "video not available after {} attempts: {last_problem}",
            self.download_attempts
        )))
    }

    // ---- private helpers ----

    fn content_type(response: &reqwest::Response) -> String {
        response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase()
    }

    /// Turn a non-200 response into [`ProviderError::Api`] carrying the
    /// provider's own message when it sent one.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ProviderError> {
        let status = response.status();
        if status != StatusCode::OK {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl GenerationBackend for OpenAiCompatBackend {
    async fn generate(
        &self,
        config: &ProviderConfig,
        request: &GenerationRequest,
    ) -> Result<Vec<MediaArtifact>, BackendError> {
        let result = match request.kind {
            TaskKind::Image => {
                self.generate_images(config, &request.prompt, request.count)
                    .await
            }
            TaskKind::Video => self.generate_video(config, request).await.map(|v| vec![v]),
        };
        result.map_err(|e| {
            tracing::warn!(config = %config.name, kind = request.kind.as_str(), error = %e, "Generation failed");
            BackendError::from(e)
        })
    }
}
