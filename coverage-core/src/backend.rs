//! The seam between the core and a hosted text-generation service.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BackendError;
use crate::prompt::Prompt;

/// Model used when the caller does not choose one.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Sampling settings for a single completion call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionSettings {
    /// Backend model identifier.
    pub model: String,
    /// Sampling temperature (default: 0.1).
    pub temperature: f32,
    /// Upper bound on generated tokens (default: 1200).
    pub max_tokens: u32,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.1,
            max_tokens: 1200,
        }
    }
}

impl CompletionSettings {
    /// Set the model identifier.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the sampling temperature.
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the token limit.
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Settings for the JSON-only reformat call: same model, deterministic, shorter.
    #[must_use]
    pub fn for_reformat(&self) -> Self {
        Self {
            model: self.model.clone(),
            temperature: 0.0,
            max_tokens: 800,
        }
    }
}

/// A prompt together with the settings it should be sampled with.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Messages to send.
    pub prompt: Prompt,
    /// Sampling settings.
    pub settings: CompletionSettings,
}

impl CompletionRequest {
    /// Creates a request from a prompt and settings.
    #[must_use]
    pub const fn new(prompt: Prompt, settings: CompletionSettings) -> Self {
        Self { prompt, settings }
    }
}

/// Token accounting reported by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens consumed by the prompt.
    pub prompt_tokens: u32,
    /// Tokens generated in the answer.
    pub completion_tokens: u32,
}

/// Raw answer of one backend call. Opaque until parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionResult {
    /// The text the model produced.
    pub text: String,
    /// Model identifier echoed by the backend, if any.
    pub model: Option<String>,
    /// Token usage, if the backend reports it.
    pub usage: Option<TokenUsage>,
}

impl CompletionResult {
    /// Wraps plain text with no metadata.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: None,
            usage: None,
        }
    }
}

/// A chat/completion service.
///
/// Implementations perform exactly one network call per invocation and classify
/// failures into [`BackendError`]; retrying is the caller's job.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Sends the request and returns the model's raw text.
    async fn create_completion(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResult, BackendError>;
}

#[async_trait]
impl<T> CompletionBackend for Arc<T>
where
    T: CompletionBackend + ?Sized,
{
    async fn create_completion(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResult, BackendError> {
        (**self).create_completion(request).await
    }
}
