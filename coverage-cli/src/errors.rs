use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the command-line front end.
#[derive(Debug, Error)]
pub enum CliError {
    /// Error from the report pipeline.
    #[error(transparent)]
    Report(#[from] coverage_core::error::ReportError),

    /// Error from the OpenAI adapter.
    #[error("OpenAI adapter error: {0}")]
    Adapter(#[from] openai_adapter::OpenAiError),

    /// File could not be read or written.
    #[error("IO error on {}: {source}", path.display())]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// History or report file holds invalid JSON.
    #[error("Invalid JSON in {}: {source}", path.display())]
    Json {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },

    /// A `--url` artifact could not be fetched.
    #[error("Failed to fetch {url}: {source}")]
    Fetch {
        /// URL requested.
        url: String,
        /// Underlying error.
        source: reqwest::Error,
    },

    /// Invalid combination of inputs.
    #[error("Invalid input: {0}")]
    Input(String),
}

impl CliError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
