use lumen_core::backend::BackendError;

/// Errors from the provider HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned a non-200 status code.
    #[error("API error (HTTP {status}): {message}")]
    Api {
        status: u16,
        message: String,
    },

    /// The provider returned 200 with an `error` object in the body.
    #[error("API error: {0}")]
    Provider(String),

    /// The body did not have the expected shape.
    #[error("Unexpected response: {0}")]
    Format(String),

    /// `b64_json` payload could not be decoded.
    #[error("Invalid base64 image data: {0}")]
    Decode(#[from] base64::DecodeError),

    /// The video never became downloadable.
    #[error("Download failed: {0}")]
    Download(String),
}

impl ProviderError {
    /// Shape problems that justify retrying with `response_format = "url"`.
    pub fn is_format_error(&self) -> bool {
        matches!(self, ProviderError::Format(_) | ProviderError::Decode(_))
    }
}

impl From<ProviderError> for BackendError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Request(e) => BackendError::Request(e.to_string()),
            ProviderError::Api { status, message } => BackendError::Api { status, message },
            ProviderError::Provider(msg) => BackendError::Provider(msg),
            ProviderError::Format(msg) => BackendError::InvalidResponse(msg),
            ProviderError::Decode(e) => {
                BackendError::InvalidResponse(format!("invalid base64 image data: {e}"))
            }
            ProviderError::Download(msg) => BackendError::Download(msg),
        }
    }
}
