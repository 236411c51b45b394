//! Configuration for extraction retry and re-prompt behavior.

use crate::backend::CompletionSettings;
use crate::retry::RetryPolicy;

/// How the object/array span is located inside surrounding prose.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SpanStrategy {
    /// Leftmost opener through rightmost closer. Can over-capture when the prose
    /// around the document contains unrelated braces.
    #[default]
    Greedy,
    /// String-aware bracket matching from the leftmost opener; falls back to
    /// [`SpanStrategy::Greedy`] when the brackets never balance.
    Balanced,
}

/// Configuration for the structured-report pipeline.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Retry policy applied to every backend call, including the re-prompt.
    pub retry: RetryPolicy,
    /// Whether to ask the backend once more for JSON-only output when the first
    /// answer cannot be parsed (default: true).
    pub reprompt_on_failure: bool,
    /// Whether known keys must hold arrays after default-filling (default: false).
    pub strict_shape: bool,
    /// Span location strategy (default: greedy).
    pub span_strategy: SpanStrategy,
    /// Settings for the reformat call. `None` derives them from the original request.
    pub reformat_settings: Option<CompletionSettings>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            reprompt_on_failure: true,
            strict_shape: false,
            span_strategy: SpanStrategy::Greedy,
            reformat_settings: None,
        }
    }
}

impl ExtractionConfig {
    /// Set the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the maximum number of backend attempts per call.
    #[must_use]
    pub const fn with_max_attempts(mut self, max: usize) -> Self {
        self.retry.max_attempts = max;
        self
    }

    /// Enable or disable the reformat re-prompt.
    #[must_use]
    pub const fn with_reprompt(mut self, enabled: bool) -> Self {
        self.reprompt_on_failure = enabled;
        self
    }

    /// Enable or disable strict shape validation.
    #[must_use]
    pub const fn with_strict_shape(mut self, strict: bool) -> Self {
        self.strict_shape = strict;
        self
    }

    /// Set the span location strategy.
    #[must_use]
    pub const fn with_span_strategy(mut self, strategy: SpanStrategy) -> Self {
        self.span_strategy = strategy;
        self
    }

    /// Override the settings used for the reformat call.
    #[must_use]
    pub fn with_reformat_settings(mut self, settings: CompletionSettings) -> Self {
        self.reformat_settings = Some(settings);
        self
    }
}
