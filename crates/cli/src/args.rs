//! CLI argument definitions.
//!
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// sequencer - run resumable, dependency-aware step processes.
#[derive(Debug, Parser)]
#[command(name = "sequencer")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Project root containing the `.sequencer/` directory
    #[arg(short, long, global = true, default_value = ".")]
    pub root: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List declared processes and their steps
    List,

    /// Run every step of a process, resuming from persisted state
    Run {
        /// Process name
        process: String,

        /// Exit with an error when a step fails
        #[arg(long)]
        throw: bool,
    },

    /// Run a single step of a process
    RunStep {
        /// Process name
        process: String,

        /// Step name
        step: String,

        /// Item identifier of an array step
        #[arg(long)]
        item: Option<String>,

        /// Exit with an error when the step fails
        #[arg(long)]
        throw: bool,

        /// Extra arguments passed to the step, as a JSON value
        #[arg(long, value_parser = parse_json)]
        args: Option<serde_json::Value>,
    },

    /// Show the persisted state of a process or of one step
    Status {
        /// Process name
        process: String,

        /// Only show this step
        step: Option<String>,
    },
}

fn parse_json(raw: &str) -> Result<serde_json::Value, String> {
    serde_json::from_str(raw).map_err(|e| format!("invalid JSON: {e}"))
}
