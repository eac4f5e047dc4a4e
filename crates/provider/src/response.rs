//! Parsing helpers for provider responses.
//!
//! Everything here is pure so the quirks of the various OpenAI-compatible
//! gateways can be unit tested without a server.

use std::sync::LazyLock;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use regex::Regex;
use serde_json::Value;

use crate::error::ProviderError;

/// Videos smaller than this are treated as "not ready yet".
pub const MIN_VIDEO_BYTES: usize = 1000;

static VIDEO_FILE_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^\s<>")\]\\]+\.(?:mp4|webm|mov|avi)"#).expect("valid regex")
});

static ANY_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>")\]\\]+"#).expect("valid regex"));

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Human-readable text for an `error` value: its `message` when present.
pub fn describe_error(error: &Value) -> String {
    if let Some(message) = error.get("message").and_then(Value::as_str) {
        return message.to_string();
    }
    match error {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Message to report for a non-200 response body.
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| json.get("error").map(describe_error))
        .unwrap_or_else(|| body.to_string())
}

/// Some gateways answer 200 with an `error` object.
pub fn embedded_error(json: &Value) -> Option<String> {
    json.get("error")
        .filter(|e| !e.is_null())
        .map(describe_error)
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

/// Image data as returned by `/v1/images/generations`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImagePayload {
    Base64(Vec<String>),
    Urls(Vec<String>),
}

/// Classify the `data` array of an image response.
///
/// Some gateways put a URL in the `b64_json` field; those are treated as
/// URL responses.
pub fn parse_image_payload(json: &Value) -> Result<ImagePayload, ProviderError> {
    let items = json
        .get("data")
        .and_then(Value::as_array)
        .filter(|items| !items.is_empty())
        .ok_or_else(|| ProviderError::Format("No image data in response".to_string()))?;

    let field = |item: &Value, key: &str| -> Option<String> {
        item.get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let first_b64 = field(&items[0], "b64_json");
    let first_url = field(&items[0], "url");

    let collect = |keys: &[&str]| -> Result<Vec<String>, ProviderError> {
        items
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                keys.iter()
                    .find_map(|key| field(item, key))
                    .ok_or_else(|| {
                        ProviderError::Format(format!("Image {} has no {}", idx + 1, keys[0]))
                    })
            })
            .collect()
    };

    match (first_b64, first_url) {
        (Some(b64), _) if b64.starts_with("http") => {
            tracing::info!("b64_json field contains URL, treating as url response");
            collect(&["b64_json", "url"]).map(ImagePayload::Urls)
        }
        (Some(_), _) => collect(&["b64_json"]).map(ImagePayload::Base64),
        (None, Some(_)) => collect(&["url"]).map(ImagePayload::Urls),
        (None, None) => Err(ProviderError::Format("Unknown response format".to_string())),
    }
}

/// Decode a `b64_json` value, repairing missing padding.
pub fn decode_b64_image(data: &str) -> Result<Vec<u8>, ProviderError> {
    let mut padded = data.trim().to_string();
    let missing = padded.len() % 4;
    if missing != 0 {
        padded.extend(std::iter::repeat('=').take(4 - missing));
    }
    Ok(BASE64.decode(padded)?)
}

/// Encode an artifact as a `data:` URL for image-to-video requests.
pub fn data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", BASE64.encode(bytes))
}

fn url_path(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}

/// File extension for a downloaded image.
pub fn image_extension(content_type: &str, url: &str) -> &'static str {
    let path = url_path(url);
    if content_type.contains("jpeg") || content_type.contains("jpg") || path.ends_with(".jpg") {
        "jpg"
    } else if content_type.contains("png") || path.ends_with(".png") {
        "png"
    } else {
        "jpg"
    }
}

/// File extension for a downloaded video.
pub fn video_extension(content_type: &str, url: &str) -> &'static str {
    let path = url_path(url);
    if content_type.contains("mp4") || path.ends_with(".mp4") {
        "mp4"
    } else if content_type.contains("webm") || path.ends_with(".webm") {
        "webm"
    } else {
        "mp4"
    }
}

// ---------------------------------------------------------------------------
// Video (chat completions)
// ---------------------------------------------------------------------------

/// Concatenate the `delta.content` pieces of an SSE body.
///
/// Unparseable chunks are skipped; a chunk carrying an `error` aborts.
pub fn assemble_sse_content(body: &str) -> Result<String, ProviderError> {
    let mut content = String::new();
    for line in body.lines().map(str::trim) {
        let Some(chunk) = line.strip_prefix("data:").map(str::trim) else {
            continue;
        };
        if chunk.is_empty() || chunk == "[DONE]" {
            continue;
        }
        let json: Value = match serde_json::from_str(chunk) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to parse SSE chunk");
                continue;
            }
        };
        if let Some(message) = embedded_error(&json) {
            return Err(ProviderError::Provider(message));
        }
        if let Some(piece) = json
            .pointer("/choices/0/delta/content")
            .and_then(Value::as_str)
        {
            content.push_str(piece);
        }
    }
    Ok(content)
}

/// First URL in free text, preferring ones that look like video files.
pub fn extract_video_url(content: &str) -> Option<String> {
    VIDEO_FILE_URL_RE
        .find(content)
        .or_else(|| ANY_URL_RE.find(content))
        .map(|m| m.as_str().to_string())
}

/// Locate the video URL in a chat completion body (JSON or SSE).
pub fn parse_video_response(body: &str) -> Result<String, ProviderError> {
    let body = body.trim();
    if body.is_empty() {
        return Err(ProviderError::Format(
            "API returned empty response body".to_string(),
        ));
    }

    let (direct_url, content) = if body.starts_with("data:") {
        tracing::info!("Video API returned SSE stream, parsing chunks");
        (None, assemble_sse_content(body)?)
    } else {
        let json: Value = serde_json::from_str(body)
            .map_err(|e| ProviderError::Format(format!("Invalid JSON in video response: {e}")))?;
        if let Some(message) = embedded_error(&json) {
            return Err(ProviderError::Provider(message));
        }
        let message = json.pointer("/choices/0/message");
        let url = message
            .and_then(|m| m.get("url"))
            .and_then(Value::as_str)
            .map(str::to_string);
        let content = message
            .and_then(|m| m.get("content"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        (url, content)
    };

    if let Some(url) = direct_url {
        return Ok(url);
    }
    if content.is_empty() {
        return Err(ProviderError::Format(
            "No content in video API response".to_string(),
        ));
    }
    extract_video_url(&content).ok_or_else(|| {
        let preview: String = content.chars().take(200).collect();
        ProviderError::Format(format!("No video URL found in response. Content: {preview}"))
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
