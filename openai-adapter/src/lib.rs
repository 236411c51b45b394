//! OpenAI-compatible chat completions backend for `coverage-core`.
//!
//! This crate resolves credentials, maps core prompts onto the chat
//! completions wire format, and classifies HTTP failures into the core
//! [`BackendError`] taxonomy so the retrying invoker can decide what to retry.

/// Credential and endpoint resolution.
pub mod config;
/// Error types returned by adapter operations.
pub mod error;
/// HTTP transport with a per-request timeout.
pub mod http;
/// Conversion between core requests and wire types.
pub mod request;
/// Wire types for the chat completions endpoint.
pub mod types;

use async_trait::async_trait;
use coverage_core::backend::{CompletionBackend, CompletionRequest, CompletionResult};
use coverage_core::error::BackendError;
use tracing::debug;

pub use config::{resolve_api_key, OpenAiConfig, API_KEY_ENV_VAR, BASE_URL_ENV_VAR, DEFAULT_BASE_URL};
pub use error::{classify_status, OpenAiError};

/// High-level client for an OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiClient {
    /// Creates a client from resolved settings.
    ///
    /// # Errors
    ///
    /// Returns `OpenAiError::InvalidConfig` if the base URL is not an
    /// `http://` or `https://` URL, and `OpenAiError::Http` if the HTTP
    /// client cannot be built.
    pub fn new(config: OpenAiConfig) -> Result<Self, OpenAiError> {
        if !(config.base_url.starts_with("http://") || config.base_url.starts_with("https://")) {
            return Err(OpenAiError::InvalidConfig(format!(
                "base URL must start with http:// or https://, got {:?}",
                config.base_url
            )));
        }
        let http = reqwest::Client::builder()
            .user_agent(concat!("coverage-optimizer/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, config })
    }

    /// Creates a client from `OPENAI_API_KEY` and `OPENAI_BASE_URL`.
    ///
    /// # Errors
    ///
    /// Returns `OpenAiError::MissingApiKey` when no key is set and
    /// `OpenAiError::InvalidConfig` when `OPENAI_BASE_URL` is not an HTTP URL.
    pub fn from_env() -> Result<Self, OpenAiError> {
        Self::new(OpenAiConfig::from_env()?)
    }

    /// The settings this client sends with.
    #[must_use]
    pub const fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    /// Sends one chat completion call and returns the first choice's text.
    ///
    /// # Errors
    ///
    /// Returns `OpenAiError` if the request fails, times out, returns a
    /// non-success status, or carries no message content.
    pub async fn chat(&self, request: &CompletionRequest) -> Result<CompletionResult, OpenAiError> {
        let body = request::build_chat_request(request);
        debug!(model = %body.model, messages = body.messages.len(), "sending chat completion");
        let response = http::send_chat(&self.http, &self.config, &body).await?;
        request::into_completion_result(response)
    }
}

#[async_trait]
impl CompletionBackend for OpenAiClient {
    async fn create_completion(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResult, BackendError> {
        self.chat(request).await.map_err(BackendError::from)
    }
}
