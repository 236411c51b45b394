//! Core library for turning free-text model answers into structured coverage reports.
//!
//! The crate is built around two responsibilities:
//!
//! - [`retry::invoke`] issues one logical completion request against a
//!   [`backend::CompletionBackend`], retrying rate-limit and connectivity failures with
//!   exponential backoff.
//! - [`extraction::ExtractionOrchestrator`] recovers a JSON object from the raw text,
//!   repairs trailing commas, re-prompts the backend once when nothing usable comes back,
//!   and fills defaults for every key of the [`report::ReportSchema`].
//!
//! Everything else (report kinds, conversation history, artifact prompts, keyword
//! enrichment) is layered on top of those two pieces.

pub mod analysis;
pub mod backend;
pub mod capability;
pub mod conversation;
pub mod enrichment;
pub mod error;
pub mod extraction;
pub mod prompt;
pub mod report;
pub mod retry;

/// Common traits and types for ergonomic usage of the coverage core.
pub mod prelude {
    pub use crate::analysis::{analyze, Artifacts};
    pub use crate::backend::{CompletionBackend, CompletionRequest, CompletionResult, CompletionSettings};
    pub use crate::capability::{route, ReportKind};
    pub use crate::conversation::{chat_turn, ChatOptions, Conversation};
    pub use crate::enrichment::{enrich, EnrichmentTable};
    pub use crate::error::{BackendError, ReportError};
    pub use crate::extraction::{
        get_structured_report, ExtractionConfig, ExtractionMetrics, ExtractionOrchestrator,
    };
    pub use crate::prompt::{Message, Prompt, Role};
    pub use crate::report::{ReportSchema, StructuredReport};
    pub use crate::retry::{invoke, RetryPolicy};
}
