//! CLI definition and command handlers.

pub mod plan;
pub mod run;
pub mod tools;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Plan-driven agent runtime: plan, execute, and verify multi-step tasks.
#[derive(Parser)]
#[command(name = "agentry", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to agentry.toml (defaults to built-in settings plus env).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit machine-readable JSON instead of tables.
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Export spans via OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Plan, execute, and verify a task.
    Run {
        /// Natural-language task description.
        task: Option<String>,

        /// Execute a pre-authored plan file (YAML or JSON) instead of
        /// calling the planner.
        #[arg(long)]
        plan: Option<PathBuf>,

        /// Skip the verification pass.
        #[arg(long)]
        no_verify: bool,
    },

    /// Generate a plan without executing it.
    Plan {
        /// Natural-language task description.
        task: String,
    },

    /// List available tools and capabilities.
    Tools,

    /// Generate shell completions.
    Completions { shell: Shell },
}
