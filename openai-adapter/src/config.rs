//! Resolution of credentials and endpoint settings.

use std::fmt;
use std::time::Duration;

use crate::error::OpenAiError;

/// Environment variable holding the API key.
pub const API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";

/// Environment variable overriding the API base URL.
pub const BASE_URL_ENV_VAR: &str = "OPENAI_BASE_URL";

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Per-request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Connection settings for an OpenAI-compatible endpoint.
#[derive(Clone)]
pub struct OpenAiConfig {
    api_key: String,
    /// Base URL, without the trailing `/chat/completions`.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl OpenAiConfig {
    /// Creates a config for the default endpoint.
    ///
    /// # Errors
    ///
    /// Returns `OpenAiError::MissingApiKey` if `api_key` is blank.
    pub fn new(api_key: impl Into<String>) -> Result<Self, OpenAiError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(OpenAiError::MissingApiKey(API_KEY_ENV_VAR));
        }
        Ok(Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Builds a config from `OPENAI_API_KEY` and `OPENAI_BASE_URL`.
    ///
    /// # Errors
    ///
    /// Returns `OpenAiError::MissingApiKey` when no key is set.
    pub fn from_env() -> Result<Self, OpenAiError> {
        let config = Self::new(resolve_api_key(None)?)?;
        match std::env::var(BASE_URL_ENV_VAR) {
            Ok(url) if !url.trim().is_empty() => Ok(config.with_base_url(url)),
            _ => Ok(config),
        }
    }

    /// Points the client at another OpenAI-compatible endpoint.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the per-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Full URL of the chat completions endpoint.
    #[must_use]
    pub fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Locates the API key.
///
/// Resolution order:
/// 1. `explicit` if provided and non-blank.
/// 2. The `OPENAI_API_KEY` environment variable.
///
/// # Errors
///
/// Returns `OpenAiError::MissingApiKey` when neither yields a key.
pub fn resolve_api_key(explicit: Option<String>) -> Result<String, OpenAiError> {
    if let Some(key) = explicit.filter(|k| !k.trim().is_empty()) {
        return Ok(key);
    }

    std::env::var(API_KEY_ENV_VAR)
        .ok()
        .filter(|k| !k.trim().is_empty())
        .ok_or(OpenAiError::MissingApiKey(API_KEY_ENV_VAR))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_key() {
        let config = OpenAiConfig::new("sk-secret").unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_chat_completions_url_trims_slash() {
        let config = OpenAiConfig::new("k").unwrap().with_base_url("http://localhost:8080/v1/");
        assert_eq!(config.chat_completions_url(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn test_explicit_key_wins() {
        assert_eq!(resolve_api_key(Some("sk-explicit".into())).unwrap(), "sk-explicit");
    }

    #[test]
    fn test_blank_key_is_rejected() {
        assert!(matches!(OpenAiConfig::new("  "), Err(OpenAiError::MissingApiKey(_))));
    }
}
