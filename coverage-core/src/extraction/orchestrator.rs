//! Orchestration of backend calls, extraction and the one-shot reformat re-prompt.

use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::config::ExtractionConfig;
use super::error::{AttemptRecord, AttemptStage};
use super::feedback::build_reformat_request;
use super::metrics::{ExtractionMetrics, chars_to_tokens};
use super::parse::{ParsedReport, try_parse_report};
use crate::backend::{CompletionBackend, CompletionRequest, CompletionResult};
use crate::error::ReportError;
use crate::prompt::Prompt;
use crate::report::{ReportSchema, StructuredReport};
use crate::retry::invoke;

/// Runs one structured-report request against a backend.
///
/// The orchestrator calls the backend through the retrying invoker, recovers a JSON
/// object from the answer, and, if that fails, asks the backend exactly once more for
/// a JSON-only reformat before giving up with [`ReportError::Parse`].
pub struct ExtractionOrchestrator {
    schema: ReportSchema,
    config: ExtractionConfig,
}

impl ExtractionOrchestrator {
    /// Creates a new orchestrator with the given schema and default configuration.
    #[must_use]
    pub fn new(schema: ReportSchema) -> Self {
        Self {
            schema,
            config: ExtractionConfig::default(),
        }
    }

    /// Creates a new orchestrator with the given schema and configuration.
    #[must_use]
    pub const fn with_config(schema: ReportSchema, config: ExtractionConfig) -> Self {
        Self { schema, config }
    }

    /// Sets the maximum number of backend attempts per call (fluent builder pattern).
    #[must_use]
    pub const fn max_attempts(mut self, max: usize) -> Self {
        self.config.retry.max_attempts = max;
        self
    }

    /// The key set reports are filled against.
    #[must_use]
    pub const fn schema(&self) -> &ReportSchema {
        &self.schema
    }

    /// Runs the request and returns the default-filled report with its metrics.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Config` if the retry policy is invalid.
    /// Returns `ReportError::Backend` if a backend call fails permanently.
    /// Returns `ReportError::Parse` if neither the answer nor the reformatted answer
    /// yields a JSON object.
    pub async fn run<B>(
        &self,
        backend: &B,
        request: &CompletionRequest,
    ) -> Result<(StructuredReport, ExtractionMetrics), ReportError>
    where
        B: CompletionBackend + ?Sized,
    {
        self.config.retry.validate()?;

        let start = Instant::now();
        let mut tally = Tally::default();
        let mut history: Vec<AttemptRecord> = Vec::new();

        let first = self.call(backend, request, &mut tally).await?;
        let failure = match try_parse_report(&first.text, &self.schema, &self.config) {
            Ok(parsed) => return Ok(self.finish(parsed, tally, false, start)),
            Err(failure) => failure,
        };

        warn!(error = %failure, raw_len = first.text.len(), "could not extract JSON from answer");
        let parse_error = failure.to_string();
        history.push(AttemptRecord {
            stage: AttemptStage::Initial,
            raw_text: first.text.clone(),
            failure,
            elapsed: start.elapsed(),
        });

        if !self.config.reprompt_on_failure {
            return Err(Self::parse_error(first.text, history));
        }

        info!("asking backend to reformat its answer as JSON");
        let follow = build_reformat_request(
            request,
            &first.text,
            &parse_error,
            &self.schema,
            self.config.reformat_settings.as_ref(),
        );
        let second = self.call(backend, &follow, &mut tally).await?;

        match try_parse_report(&second.text, &self.schema, &self.config) {
            Ok(parsed) => Ok(self.finish(parsed, tally, true, start)),
            Err(failure) => {
                warn!(error = %failure, "reformatted answer is still not JSON");
                history.push(AttemptRecord {
                    stage: AttemptStage::Reformat,
                    raw_text: second.text,
                    failure,
                    elapsed: start.elapsed(),
                });
                Err(Self::parse_error(first.text, history))
            }
        }
    }

    /// Convenience method that runs the request and deserializes to a typed value.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Parse` if deserialization to `T` fails after a report was
    /// recovered, in addition to the errors of [`Self::run`].
    pub async fn run_typed<T, B>(
        &self,
        backend: &B,
        request: &CompletionRequest,
    ) -> Result<(T, ExtractionMetrics), ReportError>
    where
        T: serde::de::DeserializeOwned,
        B: CompletionBackend + ?Sized,
    {
        let (report, metrics) = self.run(backend, request).await?;
        let typed = report.deserialize_into()?;
        Ok((typed, metrics))
    }

    async fn call<B>(
        &self,
        backend: &B,
        request: &CompletionRequest,
        tally: &mut Tally,
    ) -> Result<CompletionResult, ReportError>
    where
        B: CompletionBackend + ?Sized,
    {
        tally.requests += 1;
        tally.input_chars += request.prompt.char_count();
        let result = invoke(backend, request, &self.config.retry).await?;
        tally.output_chars += result.text.chars().count();
        debug!(request = tally.requests, output_len = result.text.len(), "backend answered");
        Ok(result)
    }

    fn finish(
        &self,
        parsed: ParsedReport,
        tally: Tally,
        reprompted: bool,
        start: Instant,
    ) -> (StructuredReport, ExtractionMetrics) {
        let metrics = ExtractionMetrics {
            backend_requests: tally.requests,
            reprompted,
            repaired: parsed.repaired,
            wall_time: start.elapsed(),
            estimated_input_tokens: chars_to_tokens(tally.input_chars),
            estimated_output_tokens: chars_to_tokens(tally.output_chars),
        };
        debug!(
            keys = self.schema.keys().len(),
            requests = metrics.backend_requests,
            repaired = metrics.repaired,
            "structured report recovered"
        );
        (parsed.report, metrics)
    }

    fn parse_error(raw_text: String, history: Vec<AttemptRecord>) -> ReportError {
        let message = history
            .last()
            .map_or_else(|| "no attempts recorded".to_string(), |r| r.failure.to_string());
        ReportError::Parse {
            message,
            raw_text,
            history,
        }
    }
}

#[derive(Debug, Default)]
struct Tally {
    requests: usize,
    input_chars: usize,
    output_chars: usize,
}

/// Sends `request` and returns a default-filled report for `schema`.
///
/// Thin wrapper over [`ExtractionOrchestrator::run`] for callers that already hold a
/// finished prompt.
pub async fn get_structured_report<B>(
    backend: &B,
    prompt: Prompt,
    schema: ReportSchema,
    settings: crate::backend::CompletionSettings,
    config: ExtractionConfig,
) -> Result<(StructuredReport, ExtractionMetrics), ReportError>
where
    B: CompletionBackend + ?Sized,
{
    let request = CompletionRequest::new(prompt, settings);
    ExtractionOrchestrator::with_config(schema, config)
        .run(backend, &request)
        .await
}
