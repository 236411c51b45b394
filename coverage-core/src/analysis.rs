//! Artifact analysis: turning stories and context into a report request.

use serde::{Deserialize, Serialize};

use crate::backend::{CompletionBackend, CompletionRequest, CompletionSettings};
use crate::capability::ReportKind;
use crate::error::ReportError;
use crate::extraction::{ExtractionConfig, ExtractionMetrics, ExtractionOrchestrator};
use crate::prompt::Prompt;
use crate::report::StructuredReport;

/// The text a user submits for analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifacts {
    /// User stories and requirements.
    #[serde(default)]
    pub user_stories: String,
    /// Logs, past defects and other context.
    #[serde(default)]
    pub context: String,
}

impl Artifacts {
    /// Creates artifacts from stories and context.
    pub fn new(user_stories: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            user_stories: user_stories.into(),
            context: context.into(),
        }
    }

    /// Returns `true` when both sections are blank.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.user_stories.trim().is_empty() && self.context.trim().is_empty()
    }

    /// Appends a block of text to the context section.
    pub fn append_context(&mut self, label: &str, text: &str) {
        if !self.context.is_empty() {
            self.context.push_str("\n\n");
        }
        self.context.push_str("--- ");
        self.context.push_str(label);
        self.context.push_str(" ---\n");
        self.context.push_str(text.trim());
    }

    /// Builds the analysis prompt for `kind`.
    pub fn to_prompt(&self, kind: ReportKind) -> Result<Prompt, ReportError> {
        if self.is_empty() {
            return Err(ReportError::config(
                "provide user stories, requirements, or defects to analyze",
            ));
        }

        Ok(Prompt::new(kind.system_prompt()).with_user(format!(
            "INPUT DATA:\n\
             User stories / requirements:\n{}\n\n\
             Context (logs, past defects):\n{}\n\n\
             If some sections are empty, still produce reasonable defaults and assumptions. \
             Keep each item concise (title + 1-2 sentence description).",
            self.user_stories.trim(),
            self.context.trim(),
        )))
    }
}

/// Analyzes `artifacts` and returns a default-filled report of the given kind.
pub async fn analyze<B>(
    backend: &B,
    artifacts: &Artifacts,
    kind: ReportKind,
    settings: CompletionSettings,
    config: ExtractionConfig,
) -> Result<(StructuredReport, ExtractionMetrics), ReportError>
where
    B: CompletionBackend + ?Sized,
{
    let request = CompletionRequest::new(artifacts.to_prompt(kind)?, settings);
    ExtractionOrchestrator::with_config(kind.schema(), config)
        .run(backend, &request)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_artifacts_are_rejected() {
        let err = Artifacts::new("  ", "\n").to_prompt(ReportKind::Coverage).unwrap_err();
        assert!(matches!(err, ReportError::Config(_)));
    }

    #[test]
    fn test_prompt_carries_both_sections() {
        let prompt = Artifacts::new("As a user I can log in", "")
            .to_prompt(ReportKind::TestPlan)
            .unwrap();

        assert_eq!(prompt.system(), ReportKind::TestPlan.system_prompt());
        let user = prompt.messages()[1].content();
        assert!(user.starts_with("INPUT DATA:"));
        assert!(user.contains("User stories / requirements:\nAs a user I can log in"));
        assert!(user.contains("Context (logs, past defects):\n\n"));
    }

    #[test]
    fn test_append_context_labels_blocks() {
        let mut artifacts = Artifacts::new("story", "existing");
        artifacts.append_context("defects.log", "  NPE in checkout \n");
        assert_eq!(artifacts.context, "existing\n\n--- defects.log ---\nNPE in checkout");
    }
}
