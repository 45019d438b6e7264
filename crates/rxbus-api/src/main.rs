//! rxbus CLI entry point.
//!
//! Binary name: `rxbus`
//!
//! Parses CLI arguments, sets up tracing, loads the bus configuration and
//! dispatches to the requested command.

mod cli;
mod state;

use clap::Parser;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = cli::log_filter(
        cli.verbose,
        cli.quiet,
        std::env::var_os("RUST_LOG").is_some(),
    );
    rxbus_observe::init_tracing(filter, cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let state = AppState::init(cli.config.as_deref()).await?;

    let result = match cli.command {
        Commands::Demo { demo } => cli::demo::run(&state, demo, cli.json).await,
        Commands::Config => cli::config::show_config(&state, cli.json),
    };

    rxbus_observe::shutdown_tracing();
    result
}
