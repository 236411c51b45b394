//! The `coverage-optimizer` binary.

use anyhow::Context;
use clap::{Parser, Subcommand};
use coverage_cli::{backend_from_env, run_analyze, run_chat, run_route, AnalyzeArgs, ChatArgs, RouteArgs};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Turn stories and defect history into a structured coverage report
    Analyze(AnalyzeArgs),
    /// Send one message in a persistent QA conversation
    Chat(ChatArgs),
    /// Ask the model which report kind fits a request
    Route(RouteArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so reports on stdout stay pipeable.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let backend = backend_from_env().context("failed to configure the OpenAI client")?;

    match cli.command {
        Commands::Analyze(args) => run_analyze(&backend, &args).await?,
        Commands::Chat(args) => {
            let reply = run_chat(&backend, &args)
                .await
                .with_context(|| format!("chat turn failed; {} left unchanged", args.history.display()))?;
            println!("{reply}");
        }
        Commands::Route(args) => println!("{}", run_route(&backend, &args).await?),
    }

    Ok(())
}
