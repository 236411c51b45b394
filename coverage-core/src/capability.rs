//! The closed set of report kinds and the label router that picks one.
//!
//! Every kind knows its own system framing and key set, so dispatch is an
//! exhaustive `match` rather than a lookup by name.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::backend::{CompletionBackend, CompletionRequest, CompletionSettings};
use crate::error::{BackendError, ReportError};
use crate::prompt::Prompt;
use crate::report::ReportSchema;
use crate::retry::{RetryPolicy, invoke};

const COVERAGE_SYSTEM: &str = "You are an expert test strategist for enterprise software. \
Given user stories, requirements, logs, and defect history, produce a structured JSON report with: \
1) risk_scores: an array of objects {area, score(0-100), rationale} \
2) missing_coverage: array of short descriptions of uncovered areas \
3) most_impactful_tests: array of objects {id, title, description, impact} \
4) prioritized_plan: array of objects {id, priority(P1/P2/P3), estimated_hours, reason} \
Output ONLY valid JSON (no extra commentary) using these exact keys.";

const TEST_PLAN_SYSTEM: &str = "You are a senior QA engineer. \
Given user stories, requirements, logs, and defect history, produce a JSON test plan with: \
1) plan: an array of test cases {id, title, steps (array of strings), expected_result, priority(P1/P2/P3)} \
2) missing_coverage: array of short descriptions of behaviour the inputs leave untested \
Output ONLY valid JSON (no extra commentary) using these exact keys.";

const ROUTER_SYSTEM: &str = "You route testing requests. Reply with exactly one label and nothing else.";

/// A kind of structured report the backend can be asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    /// Risk scores, coverage gaps, impactful tests and a prioritized plan.
    Coverage,
    /// A concrete list of test cases with steps.
    TestPlan,
}

impl ReportKind {
    /// Every kind, in routing order.
    pub const ALL: [Self; 2] = [Self::Coverage, Self::TestPlan];

    /// The label used by the router and on the command line.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Coverage => "coverage",
            Self::TestPlan => "test_plan",
        }
    }

    /// One-line description shown to the router.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Coverage => "risk assessment, coverage gaps and test prioritisation",
            Self::TestPlan => "a step-by-step list of concrete test cases",
        }
    }

    /// System framing for the analysis prompt.
    #[must_use]
    pub const fn system_prompt(self) -> &'static str {
        match self {
            Self::Coverage => COVERAGE_SYSTEM,
            Self::TestPlan => TEST_PLAN_SYSTEM,
        }
    }

    /// Top-level keys every report of this kind carries.
    #[must_use]
    pub fn schema(self) -> ReportSchema {
        match self {
            Self::Coverage => ReportSchema::new([
                "risk_scores",
                "missing_coverage",
                "most_impactful_tests",
                "prioritized_plan",
            ]),
            Self::TestPlan => ReportSchema::new(["plan", "missing_coverage"]),
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ReportKind {
    type Err = BackendError;

    /// Parses a label, tolerating case, surrounding punctuation and `-` for `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .trim()
            .trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '_' && c != '-')
            .to_ascii_lowercase()
            .replace('-', "_");

        Self::ALL
            .into_iter()
            .find(|kind| kind.label() == normalized)
            .ok_or_else(|| BackendError::UnknownTool(s.trim().to_string()))
    }
}

/// Asks the backend which report kind fits `text`.
///
/// An answer that is not one of the known labels fails with
/// [`BackendError::UnknownTool`].
pub async fn route<B>(
    backend: &B,
    text: &str,
    settings: &CompletionSettings,
    policy: &RetryPolicy,
) -> Result<ReportKind, ReportError>
where
    B: CompletionBackend + ?Sized,
{
    let request = CompletionRequest::new(router_prompt(text), settings.clone().with_temperature(0.0));
    let answer = invoke(backend, &request, policy).await?;
    let kind = answer.text.parse::<ReportKind>()?;
    info!(kind = %kind, "routed request");
    Ok(kind)
}

fn router_prompt(text: &str) -> Prompt {
    let mut options = String::new();
    for kind in ReportKind::ALL {
        options.push_str("- ");
        options.push_str(kind.label());
        options.push_str(": ");
        options.push_str(kind.description());
        options.push('\n');
    }

    Prompt::new(ROUTER_SYSTEM).with_user(format!(
        "Available labels:\n{options}\nRequest:\n{text}\n\nLabel:"
    ))
}
