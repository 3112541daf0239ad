mod args;
mod commands;

use args::{Cli, Commands};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    // Logs go to stderr; stdout carries events and records.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::List => commands::list(&cli.root).await,
        Commands::Run { process, throw } => commands::run(&cli.root, &process, throw).await,
        Commands::RunStep {
            process,
            step,
            item,
            throw,
            args,
        } => {
            commands::run_step(
                &cli.root,
                &process,
                &step,
                item.as_deref(),
                throw,
                args.as_ref(),
            )
            .await
        }
        Commands::Status { process, step } => {
            commands::status(&cli.root, &process, step.as_deref()).await
        }
    }
}
