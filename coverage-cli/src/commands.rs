//! The `analyze`, `chat` and `route` subcommands.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, ValueEnum};
use coverage_core::backend::DEFAULT_MODEL;
use coverage_core::prelude::*;
use openai_adapter::OpenAiClient;
use tracing::info;

use crate::errors::CliError;
use crate::history::HistoryStore;
use crate::ingest::{fetch_url, read_source};

const DEFAULT_CHAT_SYSTEM: &str = "You are a pragmatic QA lead. \
Help the user plan, prioritise and review software tests. Keep answers short and concrete.";

/// Report kind selection on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    /// Risk scores, gaps, impactful tests and a prioritized plan.
    Coverage,
    /// Concrete test cases with steps.
    TestPlan,
    /// Let the model pick.
    Auto,
}

/// Model and retry settings shared by every subcommand.
#[derive(Debug, Clone, Args)]
pub struct BackendArgs {
    /// Model identifier.
    #[arg(long, env = "OT_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Attempts per backend call, including the first.
    #[arg(long, default_value_t = 4)]
    pub max_attempts: usize,

    /// Backoff before the first retry, doubled after each retry.
    #[arg(long, default_value_t = 2000)]
    pub initial_delay_ms: u64,
}

impl BackendArgs {
    fn settings(&self) -> CompletionSettings {
        CompletionSettings::default().with_model(self.model.clone())
    }

    fn retry(&self) -> Result<RetryPolicy, CliError> {
        Ok(RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.initial_delay_ms),
        )?)
    }
}

/// Arguments of `analyze`.
#[derive(Debug, Clone, Args)]
pub struct AnalyzeArgs {
    /// User stories or requirements, inline.
    #[arg(long, conflicts_with = "stories_file")]
    pub stories: Option<String>,

    /// File with user stories (`-` for stdin).
    #[arg(long)]
    pub stories_file: Option<PathBuf>,

    /// Logs or past defects, inline.
    #[arg(long, conflicts_with = "context_file")]
    pub context: Option<String>,

    /// File with logs or past defects (`-` for stdin).
    #[arg(long)]
    pub context_file: Option<PathBuf>,

    /// Page to fetch and add to the context. Repeatable.
    #[arg(long = "url")]
    pub urls: Vec<String>,

    /// Report kind to produce.
    #[arg(long, value_enum, default_value_t = KindArg::Coverage)]
    pub kind: KindArg,

    /// Model and retry settings.
    #[command(flatten)]
    pub backend: BackendArgs,

    /// Fail instead of asking the model to reformat a non-JSON answer.
    #[arg(long)]
    pub no_reprompt: bool,

    /// Reject reports whose known keys are not arrays.
    #[arg(long)]
    pub strict: bool,

    /// Add keyword-driven coverage gaps to matching records.
    #[arg(long)]
    pub enrich: bool,

    /// JSON enrichment table replacing the built-in one (implies `--enrich`).
    #[arg(long)]
    pub enrichment_table: Option<PathBuf>,

    /// Write the report here instead of stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

/// Arguments of `chat`.
#[derive(Debug, Clone, Args)]
pub struct ChatArgs {
    /// Conversation file; created on first use.
    #[arg(long)]
    pub history: PathBuf,

    /// The new user message.
    #[arg(long, short)]
    pub message: String,

    /// System framing for the assistant.
    #[arg(long, default_value = DEFAULT_CHAT_SYSTEM)]
    pub system: String,

    /// Past turns to send with the message (default: all).
    #[arg(long)]
    pub max_turns: Option<usize>,

    /// Model and retry settings.
    #[command(flatten)]
    pub backend: BackendArgs,
}

/// Arguments of `route`.
#[derive(Debug, Clone, Args)]
pub struct RouteArgs {
    /// The request to classify.
    #[arg(long)]
    pub text: String,

    /// Model and retry settings.
    #[command(flatten)]
    pub backend: BackendArgs,
}

/// Runs `analyze` and writes the pretty-printed report.
///
/// # Errors
/// Returns an error if inputs cannot be loaded, the pipeline fails, or the output cannot be written.
pub async fn run_analyze<B>(backend: &B, args: &AnalyzeArgs) -> Result<(), CliError>
where
    B: CompletionBackend + ?Sized,
{
    let report = build_report(backend, args).await?;
    let json = serde_json::to_string_pretty(&report).map_err(|e| CliError::Input(e.to_string()))?;

    match &args.output {
        Some(path) => {
            tokio::fs::write(path, json + "\n")
                .await
                .map_err(|e| CliError::io(path, e))?;
            info!(path = %path.display(), "report written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Loads the artifacts, runs the pipeline and applies enrichment.
///
/// # Errors
/// Returns an error if inputs cannot be loaded or the pipeline fails.
pub async fn build_report<B>(backend: &B, args: &AnalyzeArgs) -> Result<StructuredReport, CliError>
where
    B: CompletionBackend + ?Sized,
{
    let artifacts = load_artifacts(args).await?;
    let retry = args.backend.retry()?;
    let settings = args.backend.settings();

    let kind = match args.kind {
        KindArg::Coverage => ReportKind::Coverage,
        KindArg::TestPlan => ReportKind::TestPlan,
        KindArg::Auto => {
            let text = format!("{}\n\n{}", artifacts.user_stories, artifacts.context);
            route(backend, text.trim(), &settings, &retry).await?
        }
    };

    let config = ExtractionConfig::default()
        .with_retry(retry)
        .with_reprompt(!args.no_reprompt)
        .with_strict_shape(args.strict);

    info!(kind = %kind, model = %settings.model, "analyzing artifacts");
    let (mut report, metrics) = analyze(backend, &artifacts, kind, settings, config).await?;
    info!(
        requests = metrics.backend_requests,
        reprompted = metrics.reprompted,
        repaired = metrics.repaired,
        elapsed_ms = metrics.wall_time.as_millis(),
        input_tokens = metrics.estimated_input_tokens,
        output_tokens = metrics.estimated_output_tokens,
        "report ready"
    );

    if let Some(table) = enrichment_table(args).await? {
        let touched = enrich(&mut report, &table);
        info!(records = touched, "enrichment applied");
    }
    Ok(report)
}

async fn load_artifacts(args: &AnalyzeArgs) -> Result<Artifacts, CliError> {
    if is_stdin(args.stories_file.as_deref()) && is_stdin(args.context_file.as_deref()) {
        return Err(CliError::Input(
            "only one of --stories-file and --context-file can read stdin".into(),
        ));
    }

    let user_stories = inline_or_file(args.stories.as_deref(), args.stories_file.as_deref()).await?;
    let context = inline_or_file(args.context.as_deref(), args.context_file.as_deref()).await?;
    let mut artifacts = Artifacts::new(user_stories, context);

    for url in &args.urls {
        let text = fetch_url(url).await?;
        artifacts.append_context(url, &text);
    }
    Ok(artifacts)
}

fn is_stdin(path: Option<&Path>) -> bool {
    path.is_some_and(|p| p.as_os_str() == "-")
}

async fn inline_or_file(inline: Option<&str>, file: Option<&Path>) -> Result<String, CliError> {
    match (inline, file) {
        (Some(text), _) => Ok(text.to_string()),
        (None, Some(path)) => read_source(path).await,
        (None, None) => Ok(String::new()),
    }
}

async fn enrichment_table(args: &AnalyzeArgs) -> Result<Option<EnrichmentTable>, CliError> {
    match &args.enrichment_table {
        Some(path) => {
            let json = read_source(path).await?;
            Ok(Some(EnrichmentTable::from_json(&json)?))
        }
        None if args.enrich => Ok(Some(EnrichmentTable::default())),
        None => Ok(None),
    }
}

/// Runs one chat turn against the history file and returns the reply.
///
/// The history file is only rewritten when the turn succeeds.
///
/// # Errors
/// Returns an error if the history cannot be loaded or saved, or the backend call fails.
pub async fn run_chat<B>(backend: &B, args: &ChatArgs) -> Result<String, CliError>
where
    B: CompletionBackend + ?Sized,
{
    let store = HistoryStore::new(&args.history);
    let conversation = store.load().await?;
    let options = ChatOptions {
        settings: args.backend.settings(),
        retry: args.backend.retry()?,
        max_turns: args.max_turns,
    };

    info!(turns = conversation.len(), "sending chat turn");
    let (conversation, reply) =
        chat_turn(backend, conversation, &args.system, &args.message, &options).await?;
    store.save(&conversation).await?;
    Ok(reply)
}

/// Asks the model which report kind fits the text.
///
/// # Errors
/// Returns an error if the backend fails or answers with an unknown label.
pub async fn run_route<B>(backend: &B, args: &RouteArgs) -> Result<ReportKind, CliError>
where
    B: CompletionBackend + ?Sized,
{
    let settings = args.backend.settings();
    Ok(route(backend, &args.text, &settings, &args.backend.retry()?).await?)
}

/// Builds the OpenAI backend from `OPENAI_API_KEY` and `OPENAI_BASE_URL`.
///
/// # Errors
/// Returns `CliError::Adapter` when the key is missing or the base URL is not an HTTP URL.
pub fn backend_from_env() -> Result<OpenAiClient, CliError> {
    Ok(OpenAiClient::from_env()?)
}
