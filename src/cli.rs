//! Command-line interface definition and argument parsing
//!
//! This module uses clap to define and parse command-line arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for maestro
#[derive(Parser, Debug)]
#[command(
    name = "maestro",
    about = "Sequential LLM workflow orchestrator with approval gates",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands for maestro
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a pipeline end to end
    Run {
        /// Name of the pipeline (the built-in code-generation pipeline
        /// when omitted)
        pipeline: Option<String>,

        /// Initial input handed to the first process
        #[arg(long, short = 'i')]
        input: String,

        /// Override the model for every process
        #[arg(long)]
        model: Option<String>,

        /// Approve every approval gate without prompting
        #[arg(long = "yes", short = 'y')]
        yes: bool,

        /// Export the finished run as JSON into this directory
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// List available pipelines
    List,

    /// Show the process sequence of a pipeline
    Show {
        /// Name of the pipeline (built-in when omitted)
        pipeline: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_command() {
        let cli = Cli::parse_from([
            "maestro", "run", "--input", "build a cli", "--yes", "--export", "out",
        ]);
        match cli.command {
            Commands::Run {
                pipeline,
                input,
                yes,
                export,
                model,
            } => {
                assert!(pipeline.is_none());
                assert_eq!(input, "build a cli");
                assert!(yes);
                assert_eq!(export, Some(PathBuf::from("out")));
                assert!(model.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn parses_named_pipeline_with_model_override() {
        let cli = Cli::parse_from([
            "maestro",
            "run",
            "review",
            "-i",
            "fn main() {}",
            "--model",
            "gemini-1.5-pro",
        ]);
        match cli.command {
            Commands::Run {
                pipeline, model, ..
            } => {
                assert_eq!(pipeline.as_deref(), Some("review"));
                assert_eq!(model.as_deref(), Some("gemini-1.5-pro"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
