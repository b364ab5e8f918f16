//! kiosk CLI - command-line interface for loader operations.
//!
//! The main entry point for the `kiosk` CLI binary.

use anyhow::Result;
use clap::Parser;

use kiosk_cli::{Cli, Commands};
use kiosk_core::observability::{init_logging, log_format_from_env};

fn main() -> Result<()> {
    init_logging(log_format_from_env());

    // Parse CLI arguments
    let cli = Cli::parse();
    let config = cli.config();

    // Create runtime and execute
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        match cli.command {
            Commands::Backfill(args) => kiosk_cli::commands::backfill::execute(args, &config).await,
            Commands::Load(args) => kiosk_cli::commands::load::execute(args, &config).await,
        }
    })
}
