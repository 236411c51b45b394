//! Parse failure kinds and per-attempt history.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Why a candidate slice could not become a report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseFailure {
    /// The backend answered with nothing but whitespace.
    #[error("response was empty")]
    Empty,

    /// The slice is not valid JSON, even after trailing-comma repair.
    #[error("invalid JSON: {0}")]
    Syntax(String),

    /// The slice parsed, but its top level is not an object.
    #[error("expected a JSON object at the top level, found {0}")]
    NotAnObject(&'static str),

    /// Strict shape validation rejected the default-filled report.
    #[error("report shape violations: {}", .0.join("; "))]
    Shape(Vec<String>),
}

/// Which backend answer an attempt worked on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptStage {
    /// The answer to the caller's own prompt.
    Initial,
    /// The answer to the JSON-only reformat prompt.
    Reformat,
}

impl fmt::Display for AttemptStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initial => f.write_str("initial"),
            Self::Reformat => f.write_str("reformat"),
        }
    }
}

/// Record of a single failed extraction attempt.
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    /// Which answer was being parsed.
    pub stage: AttemptStage,
    /// Raw backend text for this attempt.
    pub raw_text: String,
    /// The parse failure.
    pub failure: ParseFailure,
    /// Elapsed time since the pipeline started.
    pub elapsed: Duration,
}
