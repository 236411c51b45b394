//! Keyword-driven enrichment of parsed reports.
//!
//! Records whose step text mentions a known domain keyword pick up the
//! matching rule's coverage gaps and rationale. Running the pass twice leaves
//! the report unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ReportError;
use crate::report::StructuredReport;

const MISSING_COVERAGE: &str = "missing_coverage";

/// One keyword rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentRule {
    /// Lowercase substrings that trigger the rule.
    pub keywords: Vec<String>,
    /// Coverage gaps added to matching records.
    #[serde(default)]
    pub gaps: Vec<String>,
    /// Rationale lines added to matching records.
    #[serde(default)]
    pub rationale: Vec<String>,
}

impl EnrichmentRule {
    fn new(keywords: &[&str], gaps: &[&str], rationale: &[&str]) -> Self {
        let owned = |items: &[&str]| items.iter().map(ToString::to_string).collect();
        Self {
            keywords: owned(keywords),
            gaps: owned(gaps),
            rationale: owned(rationale),
        }
    }

    fn matches(&self, text: &str) -> bool {
        self.keywords
            .iter()
            .any(|keyword| text.contains(&keyword.to_lowercase()))
    }
}

/// The editable keyword table and the report arrays it applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentTable {
    /// Rules, applied in order.
    pub rules: Vec<EnrichmentRule>,
    /// Report keys holding record arrays to enrich.
    #[serde(default = "default_item_keys")]
    pub item_keys: Vec<String>,
}

fn default_item_keys() -> Vec<String> {
    ["plan", "most_impactful_tests", "prioritized_plan"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for EnrichmentTable {
    fn default() -> Self {
        Self {
            rules: vec![
                EnrichmentRule::new(
                    &["login", "log in", "sign in", "auth", "password"],
                    &[
                        "Account lockout after repeated failed logins",
                        "Session expiry and re-authentication",
                    ],
                    &["Authentication defects block every downstream feature"],
                ),
                EnrichmentRule::new(
                    &["payment", "checkout", "refund", "credit card"],
                    &[
                        "Declined and partially captured payments",
                        "Duplicate submission of the same payment",
                    ],
                    &["Payment defects cause direct revenue loss"],
                ),
                EnrichmentRule::new(
                    &["upload", "attachment"],
                    &[
                        "Oversized and malformed file uploads",
                        "Interrupted upload recovery",
                    ],
                    &["Upload paths accept untrusted input"],
                ),
                EnrichmentRule::new(
                    &["search", "filter"],
                    &[
                        "Empty and special-character search queries",
                        "Pagination of large result sets",
                    ],
                    &["Search is a high-traffic entry point"],
                ),
                EnrichmentRule::new(
                    &["api", "endpoint"],
                    &[
                        "Error responses for invalid payloads",
                        "Timeouts from dependent services",
                    ],
                    &["API contracts are shared with other clients"],
                ),
                EnrichmentRule::new(
                    &["performance", "latency", "load time", "slow"],
                    &["Response time under peak load"],
                    &["Performance regressions are rarely caught by functional tests"],
                ),
            ],
            item_keys: default_item_keys(),
        }
    }
}

impl EnrichmentTable {
    /// Parses a table from JSON.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Config` if the document is malformed or a rule has no keywords.
    pub fn from_json(json: &str) -> Result<Self, ReportError> {
        let table: Self = serde_json::from_str(json)
            .map_err(|e| ReportError::config(format!("invalid enrichment table: {e}")))?;

        if let Some(index) = table.rules.iter().position(|rule| rule.keywords.is_empty()) {
            return Err(ReportError::config(format!(
                "enrichment rule {index} has no keywords"
            )));
        }
        Ok(table)
    }
}

/// Applies `table` to `report` and returns how many records matched a rule.
pub fn enrich(report: &mut StructuredReport, table: &EnrichmentTable) -> usize {
    let mut touched = 0;
    let mut report_gaps: Vec<String> = Vec::new();

    for key in &table.item_keys {
        let Some(Value::Array(items)) = report.fields_mut().get_mut(key) else {
            continue;
        };

        for record in items.iter_mut().filter_map(Value::as_object_mut) {
            let text = step_text(record);
            let lowered = text.to_lowercase();
            let matched: Vec<&EnrichmentRule> =
                table.rules.iter().filter(|rule| rule.matches(&lowered)).collect();
            if matched.is_empty() {
                continue;
            }

            let mut gaps = string_list(record.get("coverage_gaps"));
            let mut rationale = string_list(record.get("rationale"));
            for rule in &matched {
                extend_unique(&mut gaps, &rule.gaps);
                extend_unique(&mut rationale, &rule.rationale);
            }
            extend_unique(&mut report_gaps, &gaps);

            record.insert("coverage_notes".into(), Value::String(render_notes(&text, &gaps, &rationale)));
            record.insert("coverage_gaps".into(), to_array(&gaps));
            record.insert("rationale".into(), to_array(&rationale));
            touched += 1;
            debug!(key = %key, rules = matched.len(), "enriched record");
        }
    }

    if !report_gaps.is_empty() {
        let fields = report.fields_mut();
        let mut missing = string_list(fields.get(MISSING_COVERAGE));
        extend_unique(&mut missing, &report_gaps);
        fields.insert(MISSING_COVERAGE.into(), to_array(&missing));
    }

    touched
}

/// The text a record's keywords are matched against: `steps`, else `description`, else `title`.
fn step_text(record: &Map<String, Value>) -> String {
    let steps = string_list(record.get("steps"));
    if !steps.is_empty() {
        return steps.join("\n");
    }
    ["description", "title"]
        .into_iter()
        .find_map(|key| record.get(key).and_then(Value::as_str))
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Reads a string or array of strings; anything else is empty.
fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

fn extend_unique(target: &mut Vec<String>, extra: &[String]) {
    for item in extra {
        if !target.contains(item) {
            target.push(item.clone());
        }
    }
}

fn to_array(items: &[String]) -> Value {
    Value::Array(items.iter().cloned().map(Value::String).collect())
}

fn render_notes(current: &str, gaps: &[String], rationale: &[String]) -> String {
    let bullets = |items: &[String]| {
        items
            .iter()
            .map(|item| format!("- {item}"))
            .collect::<Vec<_>>()
            .join("\n")
    };
    let current = if current.is_empty() { "(not described)" } else { current };
    format!(
        "Current coverage:\n{current}\n\nGaps:\n{}\n\nRationale:\n{}",
        bullets(gaps),
        bullets(rationale)
    )
}
