use std::time::Duration;

use coverage_core::error::BackendError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OpenAiError {
    #[error("API key not found: set {0} or pass one explicitly")]
    MissingApiKey(&'static str),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("API returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("API returned no message content")]
    EmptyResponse,
}

/// Maps a failed HTTP status to the backend failure taxonomy.
#[must_use]
pub fn classify_status(status: u16, message: String) -> BackendError {
    match status {
        429 => BackendError::RateLimited(message),
        401 | 403 => BackendError::AuthFailed(message),
        400 | 404 | 409 | 413 | 422 => BackendError::MalformedRequest(message),
        502..=504 => BackendError::ConnectionFailed(message),
        _ => BackendError::Other(format!("status {status}: {message}")),
    }
}

impl From<OpenAiError> for BackendError {
    fn from(err: OpenAiError) -> Self {
        match err {
            OpenAiError::MissingApiKey(_) => Self::AuthFailed(err.to_string()),
            OpenAiError::InvalidConfig(msg) => Self::MalformedRequest(msg),
            OpenAiError::Http(ref e) if e.is_timeout() || e.is_connect() || e.is_request() => {
                Self::ConnectionFailed(err.to_string())
            }
            OpenAiError::Timeout(_) => Self::ConnectionFailed(err.to_string()),
            OpenAiError::Status { status, message } => classify_status(status, message),
            OpenAiError::Http(_) | OpenAiError::EmptyResponse => Self::Other(err.to_string()),
        }
    }
}
