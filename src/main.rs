use anyhow::{Context, Result};
use ar_cred_helper::commands::{Cli, Command, CommandContext};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    tracing::debug!(command = cli.command.name(), "starting");

    let action = match cli.command {
        Command::Get(_) => "failed to get credential",
        _ => "failed to set credential",
    };
    cli.command
        .execute(&CommandContext::default())
        .await
        .context(action)
}

/// Logs go to stderr; stdout carries the `get` response.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ar_cred_helper={default_level}")));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}
