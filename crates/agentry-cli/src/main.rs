//! Agentry CLI entry point.
//!
//! Binary name: `agentry`.
//!
//! Parses arguments, initializes tracing, builds the application state
//! (config, API keys, tool registry), and dispatches to the command
//! handlers.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let directives = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "info,agentry_core=debug,agentry_infra=debug",
        _ => "trace",
    };
    agentry_observe::tracing_setup::init_tracing(Some(directives), cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    // Shell completions need no app state.
    if let Commands::Completions { shell } = &cli.command {
        let mut command = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut command, "agentry", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            task,
            plan,
            no_verify,
        } => {
            cli::run::handle(&state, task.as_deref(), plan.as_deref(), no_verify, cli.json).await?;
        }
        Commands::Plan { task } => {
            cli::plan::handle(&state, &task, cli.json).await?;
        }
        Commands::Tools => {
            cli::tools::handle(&state, cli.json)?;
        }
        Commands::Completions { .. } => unreachable!("handled above"),
    }

    agentry_observe::tracing_setup::shutdown_tracing();
    Ok(())
}
