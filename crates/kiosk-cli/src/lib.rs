//! # kiosk-cli
//!
//! Command-line interface for operating the kiosk loader.
//!
//! ## Commands
//!
//! - `kiosk backfill` - Replay all unmanifested files under the root prefix
//! - `kiosk load` - Run the per-file load unit for one named file
//!
//! ## Configuration
//!
//! The CLI uses environment variables or command-line flags for settings:
//!
//! - `KIOSK_BUCKET` - Storage bucket (`gs://...`, `file://...`)
//! - `KIOSK_ROOT_PREFIX` - Root prefix under the bucket
//! - `KIOSK_STAGING_DATASET` / `KIOSK_METADATA_DATASET` / `KIOSK_PROD_DATASET`
//! - `KIOSK_WAREHOUSE_DIR` - Root directory of the file-backed warehouse

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
// CLI uses print! macros intentionally
#![allow(clippy::print_stdout)]
#![allow(clippy::print_stderr)]

pub mod commands;

use clap::{Parser, Subcommand};

use kiosk_loader::LoaderConfig;

/// kiosk CLI - warehouse loader operations.
#[derive(Debug, Parser)]
#[command(name = "kiosk")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Storage bucket holding the normalized files.
    #[arg(long, env = "KIOSK_BUCKET")]
    pub bucket: String,

    /// Root prefix under the bucket.
    #[arg(long, env = "KIOSK_ROOT_PREFIX")]
    pub root_prefix: String,

    /// Dataset holding staging and temp tables.
    #[arg(long, env = "KIOSK_STAGING_DATASET")]
    pub staging_dataset: String,

    /// Dataset holding the load manifest.
    #[arg(long, env = "KIOSK_METADATA_DATASET")]
    pub metadata_dataset: String,

    /// Dataset holding the final tables.
    #[arg(long, env = "KIOSK_PROD_DATASET")]
    pub prod_dataset: String,

    /// Root directory of the file-backed warehouse.
    #[arg(long, env = "KIOSK_WAREHOUSE_DIR")]
    pub warehouse_dir: String,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Get the effective configuration.
    #[must_use]
    pub fn config(&self) -> Config {
        Config {
            loader: LoaderConfig {
                bucket: self.bucket.clone(),
                root_prefix: self.root_prefix.clone(),
                staging_dataset: self.staging_dataset.clone(),
                metadata_dataset: self.metadata_dataset.clone(),
                prod_dataset: self.prod_dataset.clone(),
            },
            warehouse_dir: self.warehouse_dir.clone(),
        }
    }
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Replay all unmanifested files under the root prefix.
    Backfill(commands::backfill::BackfillArgs),
    /// Run the per-file load unit for one named file.
    Load(commands::load::LoadArgs),
}

/// Effective CLI configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Loader settings.
    pub loader: LoaderConfig,
    /// Root directory of the file-backed warehouse.
    pub warehouse_dir: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_backfill() {
        let cli = Cli::parse_from([
            "kiosk",
            "--bucket",
            "file:///tmp/news",
            "--root-prefix",
            "nyt-ingest",
            "--staging-dataset",
            "staging",
            "--metadata-dataset",
            "metadata",
            "--prod-dataset",
            "prod",
            "--warehouse-dir",
            "/tmp/warehouse",
            "backfill",
        ]);

        assert!(matches!(cli.command, Commands::Backfill(_)));
        let config = cli.config();
        assert_eq!(config.loader.root_prefix, "nyt-ingest");
        assert_eq!(config.warehouse_dir, "/tmp/warehouse");
    }

    #[test]
    fn test_cli_parses_load_with_path() {
        let cli = Cli::parse_from([
            "kiosk",
            "--bucket",
            "gs://news-bucket",
            "--root-prefix",
            "nyt-ingest",
            "--staging-dataset",
            "staging",
            "--metadata-dataset",
            "metadata",
            "--prod-dataset",
            "prod",
            "--warehouse-dir",
            "/tmp/warehouse",
            "load",
            "--path",
            "nyt-ingest/archive_slim/2020/05.ndjson",
        ]);

        let Commands::Load(args) = cli.command else {
            panic!("expected load subcommand");
        };
        assert_eq!(args.path, "nyt-ingest/archive_slim/2020/05.ndjson");
    }
}
