//! Follow-up prompt builders for the one-shot reformat request.

use crate::backend::{CompletionRequest, CompletionSettings};
use crate::prompt::Prompt;
use crate::report::ReportSchema;

/// Builds the follow-up request sent when the first answer could not be parsed.
///
/// Includes:
/// - The original system framing
/// - The parse failure
/// - The exact key list and the expected schema
/// - The original answer verbatim, so the model can reuse its analysis
///
/// # Examples
///
/// ```
/// use coverage_core::backend::{CompletionRequest, CompletionSettings};
/// use coverage_core::extraction::build_reformat_request;
/// use coverage_core::prompt::Prompt;
/// use coverage_core::report::ReportSchema;
///
/// let original = CompletionRequest::new(Prompt::new("You are a tester."), CompletionSettings::default());
/// let schema = ReportSchema::new(["plan"]);
///
/// let follow = build_reformat_request(&original, "Sure! Plan: ...", "invalid JSON", &schema, None);
/// let user = follow.prompt.messages()[1].content();
/// assert!(user.contains("only the keys: plan"));
/// assert!(user.contains("Original output:\nSure! Plan: ..."));
/// ```
#[must_use]
pub fn build_reformat_request(
    original: &CompletionRequest,
    raw_text: &str,
    parse_error: &str,
    schema: &ReportSchema,
    settings: Option<&CompletionSettings>,
) -> CompletionRequest {
    let mut instruction = format!(
        "The previous output was not strict JSON ({parse_error}). \
         Please reformat your answer to be valid JSON with only the keys: {}. \
         Use the original analysis to populate them. \
         Respond with the JSON document only, without commentary or code fences.",
        schema.keys().join(", ")
    );

    instruction.push_str("\n\nExpected schema:\n");
    let schema_value = schema.json_schema();
    let schema_str =
        serde_json::to_string_pretty(&schema_value).unwrap_or_else(|_| schema_value.to_string());
    instruction.push_str(&schema_str);

    instruction.push_str("\n\nOriginal output:\n");
    instruction.push_str(raw_text);

    let prompt = Prompt::new(original.prompt.system()).with_user(instruction);
    let settings = settings
        .cloned()
        .unwrap_or_else(|| original.settings.for_reformat());

    CompletionRequest::new(prompt, settings)
}
