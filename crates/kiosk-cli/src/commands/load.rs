//! Run the per-file load unit for one named file.

use anyhow::{Context, Result};
use clap::Args;

use kiosk_loader::{Classification, LoadOutcome, classify};

use crate::Config;

/// Arguments for the `load` command.
#[derive(Debug, Args)]
pub struct LoadArgs {
    /// Full object path of the file to load (including the root prefix).
    #[arg(long)]
    pub path: String,
}

/// Execute the `load` command.
///
/// # Errors
///
/// Returns an error if the path cannot be classified or the load unit fails.
pub async fn execute(args: LoadArgs, config: &Config) -> Result<()> {
    let loader = super::build_loader(config)?;
    loader.ensure_tables().await.context("ensure tables")?;

    let classification = classify(&config.loader.root_prefix, &args.path)?;
    let file = match classification {
        Classification::File(file) => file,
        Classification::Ignored => {
            println!("File ignored (not a recognized prefix): {}", args.path);
            return Ok(());
        }
    };

    match loader.load_file(&file).await? {
        LoadOutcome::AlreadyLoaded => {
            println!("Already loaded, nothing to do: {}", file.path);
        }
        LoadOutcome::Loaded {
            rows_staged,
            rows_merged,
        } => {
            println!("Loaded {} ({})", file.path, file.family);
            println!("  Rows staged: {rows_staged}");
            println!("  Rows merged: {rows_merged}");
        }
    }
    Ok(())
}
