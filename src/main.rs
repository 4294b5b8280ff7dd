//! maestro - sequential LLM workflow orchestrator
//!
//! Runs a fixed, ordered pipeline of model-backed processes: each process
//! formats a prompt from the outputs of its predecessors plus the user's
//! input and sends it to Gemini, with manual approval gates and an
//! explicit JSON export of the run.

mod cli;
mod config;
mod llm;
mod workflow;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    let _ = dotenvy::dotenv();

    // Logs go to stderr so process outputs stay clean on stdout
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            pipeline,
            input,
            model,
            yes,
            export,
        } => {
            let config = Config {
                model_override: model,
                auto_approve: yes,
                export_dir: export,
            };
            workflow::cli::handle_run_command(&config, pipeline.as_deref(), &input).await
        }
        Commands::List => workflow::cli::handle_list_command(),
        Commands::Show { pipeline } => workflow::cli::handle_show_command(pipeline.as_deref()),
    }
}
