//! Strict parsing with one repair pass, followed by default-filling.

use std::borrow::Cow;

use serde_json::Value;
use tracing::{debug, warn};

use super::config::ExtractionConfig;
use super::error::{AttemptRecord, AttemptStage, ParseFailure};
use super::repair::remove_trailing_commas;
use super::slice::extract_with;
use crate::error::ReportError;
use crate::report::{ReportSchema, StructuredReport};

/// A report recovered from raw text.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReport {
    /// The default-filled report.
    pub report: StructuredReport,
    /// Whether the trailing-comma repair pass was needed.
    pub repaired: bool,
}

/// Parses `slice` as JSON, retrying once after removing trailing commas.
///
/// Returns the value and whether the repair pass was needed.
pub fn parse_json(slice: &str) -> Result<(Value, bool), ParseFailure> {
    let first = match serde_json::from_str::<Value>(slice) {
        Ok(value) => return Ok((value, false)),
        Err(e) => e,
    };

    match remove_trailing_commas(slice) {
        Cow::Borrowed(_) => Err(ParseFailure::Syntax(first.to_string())),
        Cow::Owned(fixed) => match serde_json::from_str::<Value>(&fixed) {
            Ok(value) => {
                warn!(error = %first, "parsed model output after removing trailing commas");
                Ok((value, true))
            }
            Err(e) => Err(ParseFailure::Syntax(e.to_string())),
        },
    }
}

/// Extracts, parses and default-fills a report from raw model text.
///
/// This is the pure half of the pipeline; it never calls a backend.
pub fn parse_report(
    raw_text: &str,
    schema: &ReportSchema,
    config: &ExtractionConfig,
) -> Result<ParsedReport, ReportError> {
    try_parse_report(raw_text, schema, config).map_err(|failure| ReportError::Parse {
        message: failure.to_string(),
        raw_text: raw_text.to_string(),
        history: vec![AttemptRecord {
            stage: AttemptStage::Initial,
            raw_text: raw_text.to_string(),
            failure,
            elapsed: std::time::Duration::ZERO,
        }],
    })
}

pub(crate) fn try_parse_report(
    raw_text: &str,
    schema: &ReportSchema,
    config: &ExtractionConfig,
) -> Result<ParsedReport, ParseFailure> {
    let slice = extract_with(raw_text, config.span_strategy).ok_or(ParseFailure::Empty)?;
    debug!(slice_len = slice.len(), raw_len = raw_text.len(), "extracted candidate slice");

    let (value, repaired) = parse_json(slice)?;

    let mut fields = match value {
        Value::Object(map) => map,
        other => return Err(ParseFailure::NotAnObject(kind_name(&other))),
    };

    let inserted = schema.fill_defaults(&mut fields);
    if !inserted.is_empty() {
        debug!(keys = ?inserted, "filled missing report keys with empty arrays");
    }

    if config.strict_shape {
        let violations = schema.validate(&Value::Object(fields.clone()));
        if !violations.is_empty() {
            return Err(ParseFailure::Shape(violations));
        }
    }

    Ok(ParsedReport {
        report: StructuredReport::from_fields(fields, schema),
        repaired,
    })
}

const fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
