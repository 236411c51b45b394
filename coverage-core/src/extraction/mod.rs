//! Recovery of structured JSON from free-text model answers.
//!
//! This module provides the pipeline that sits behind the structured-report capability:
//!
//! - [`extract`] - Pick the candidate JSON slice out of raw text
//! - [`parse_json`] - Strict parse with a single trailing-comma repair pass
//! - [`parse_report`] - Extract, parse and default-fill in one step
//! - [`ExtractionOrchestrator`] - Backend call, one reformat re-prompt, metrics
//! - [`ExtractionConfig`] - Retry and re-prompt configuration
//! - [`build_reformat_request`] - Follow-up request demanding JSON-only output

pub mod config;
pub mod error;
pub mod feedback;
pub mod metrics;
pub mod orchestrator;
pub mod parse;
pub mod repair;
pub mod slice;

pub use config::{ExtractionConfig, SpanStrategy};
pub use error::{AttemptRecord, AttemptStage, ParseFailure};
pub use feedback::build_reformat_request;
pub use metrics::ExtractionMetrics;
pub use orchestrator::{ExtractionOrchestrator, get_structured_report};
pub use parse::{ParsedReport, parse_json, parse_report};
pub use repair::remove_trailing_commas;
pub use slice::{extract, extract_with};
