#![deny(missing_docs)]
//! Command-line front end for the coverage optimizer.
//!
//! Loads artifacts from flags, files, stdin and URLs, runs the core pipeline
//! against an OpenAI-compatible backend, and persists chat history as JSON.

/// Subcommand arguments and runners.
pub mod commands;
/// Error types for the command-line front end.
pub mod errors;
/// Chat history persistence.
pub mod history;
/// Artifact loading.
pub mod ingest;

pub use commands::{backend_from_env, run_analyze, run_chat, run_route, AnalyzeArgs, ChatArgs, RouteArgs};
pub use errors::CliError;
