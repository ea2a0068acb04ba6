//! embedchat terminal host.
//!
//! Binary name: `embedchat`
//!
//! Parses CLI arguments, resolves the widget config, mounts one widget
//! instance, then dispatches to the requested command.

mod cli;

use clap::Parser;

use cli::{Cli, Commands};
use embedchat_observe::tracing_setup::{TracingOptions, init_tracing, shutdown_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(&TracingOptions {
        verbosity: cli.verbose,
        quiet: cli.quiet,
        json: cli.json,
        otel: cli.otel,
    })
    .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = run(&cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = cli::setup::resolve_config(cli).await?;
    let widget = cli::setup::mount(&config, cli).await?;

    match &cli.command {
        Commands::Chat => cli::chat::run_chat(&widget, cli.json).await?,
        Commands::Ask { question } => cli::commands::ask(&widget, question, cli.json).await?,
        Commands::Poll => cli::commands::poll(&widget, cli.json).await?,
        Commands::Handoff {
            question,
            reason,
            destination,
        } => {
            cli::commands::handoff(
                &widget,
                question.as_deref(),
                reason,
                destination.as_deref(),
                cli.json,
            )
            .await?
        }
        Commands::Forget => cli::commands::forget(&widget, cli.json).await?,
    }

    widget.teardown().await;
    Ok(())
}
