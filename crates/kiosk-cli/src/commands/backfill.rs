//! Replay all unmanifested files under the root prefix.

use anyhow::{Context, Result};
use clap::Args;

use kiosk_loader::BackfillDriver;

use crate::Config;

/// Arguments for the `backfill` command.
#[derive(Debug, Args)]
pub struct BackfillArgs {}

/// Execute the `backfill` command.
///
/// Per-file failures are counted rather than aborting the sweep; the
/// process exits non-zero if any file failed, so the command composes in
/// scripts.
///
/// # Errors
///
/// Returns an error if the sweep cannot run at all (listing or manifest
/// fetch fails) or if any file failed to load.
pub async fn execute(_args: BackfillArgs, config: &Config) -> Result<()> {
    let loader = super::build_loader(config)?;
    loader.ensure_tables().await.context("ensure tables")?;

    let report = BackfillDriver::new(loader).run().await?;

    println!("Backfill complete:");
    println!("  archive_slim:      {} loaded, {} skipped", report.archive_loaded, report.archive_skipped);
    println!(
        "  most_popular_slim: {} loaded, {} skipped",
        report.most_popular_loaded, report.most_popular_skipped
    );
    println!("  errors:            {}", report.errors);

    if report.has_errors() {
        anyhow::bail!("backfill completed with {} error(s)", report.errors);
    }
    Ok(())
}
