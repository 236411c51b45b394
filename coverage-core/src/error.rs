//! Error taxonomy shared by the invoker and the extraction pipeline.

use thiserror::Error;

use crate::extraction::AttemptRecord;

/// Failure reported by a completion backend for a single call.
///
/// Only [`BackendError::RateLimited`] and [`BackendError::ConnectionFailed`] are
/// considered transient; every other kind is surfaced to the caller on first sight.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The backend refused the call because of rate limiting.
    #[error("Rate limited by backend: {0}")]
    RateLimited(String),

    /// The backend could not be reached (connect failure, timeout, gateway error).
    #[error("Connection to backend failed: {0}")]
    ConnectionFailed(String),

    /// Credentials were missing or rejected.
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// The backend rejected the request as invalid.
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// The backend asked for a capability that does not exist.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Any other backend failure.
    #[error("Backend error: {0}")]
    Other(String),
}

impl BackendError {
    /// Returns `true` when the failure is transient and the call may be retried.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited(_) | Self::ConnectionFailed(_))
    }
}

/// Errors surfaced by the structured-report capability.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Invalid configuration or input shape. Never retried.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The backend call failed on every permitted attempt, or failed with a
    /// non-retryable kind.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Text came back but no structured document could be recovered from it.
    #[error("Could not recover structured JSON: {message}")]
    Parse {
        /// Description of the last parse failure.
        message: String,
        /// The raw text of the first backend answer.
        raw_text: String,
        /// One record per extraction attempt, in order.
        history: Vec<AttemptRecord>,
    },
}

impl ReportError {
    /// Builds a [`ReportError::Config`] from any displayable message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Returns the backend failure if this error wraps one.
    #[must_use]
    pub const fn as_backend(&self) -> Option<&BackendError> {
        match self {
            Self::Backend(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_rate_limit_and_connection_failures_retry() {
        assert!(BackendError::RateLimited("429".into()).is_retryable());
        assert!(BackendError::ConnectionFailed("reset".into()).is_retryable());
        assert!(!BackendError::AuthFailed("bad key".into()).is_retryable());
        assert!(!BackendError::MalformedRequest("400".into()).is_retryable());
        assert!(!BackendError::UnknownTool("dance".into()).is_retryable());
        assert!(!BackendError::Other("500".into()).is_retryable());
    }

    #[test]
    fn test_backend_error_display_is_transparent() {
        let err = ReportError::from(BackendError::AuthFailed("invalid api key".into()));
        assert_eq!(err.to_string(), "Authentication failed: invalid api key");
        assert!(err.as_backend().is_some());
    }
}
