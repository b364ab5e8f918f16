//! Batch replay of eligible files not yet present in the manifest.
//!
//! The driver is the batch-mode equivalent of the event dispatcher: it lists
//! everything under the root prefix, skips files the manifest already lists,
//! and runs the same per-file unit for the rest, sequentially, one unit in
//! flight at a time. Per-file failures are isolated and counted; the sweep
//! always reaches the end of the listing ("best-effort sweep", not
//! all-or-nothing).

use tracing::{error, info, warn};

use crate::error::{LoadError, Result};
use crate::family::Family;
use crate::paths::{Classification, classify};
use crate::unit::{LoadOutcome, Loader};

/// Counts reported by one backfill run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillReport {
    /// Archive files loaded by this run.
    pub archive_loaded: u64,
    /// Archive files skipped because the manifest already listed them.
    pub archive_skipped: u64,
    /// Most-popular files loaded by this run.
    pub most_popular_loaded: u64,
    /// Most-popular files skipped because the manifest already listed them.
    pub most_popular_skipped: u64,
    /// Files whose load unit failed.
    pub errors: u64,
}

impl BackfillReport {
    /// Returns true if any file failed to load.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    fn record_loaded(&mut self, family: Family) {
        match family {
            Family::Archive => self.archive_loaded += 1,
            Family::MostPopular => self.most_popular_loaded += 1,
        }
    }

    fn record_skipped(&mut self, family: Family) {
        match family {
            Family::Archive => self.archive_skipped += 1,
            Family::MostPopular => self.most_popular_skipped += 1,
        }
    }
}

impl std::fmt::Display for BackfillReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "archive_slim={} (skipped={}), most_popular_slim={} (skipped={}), errors={}",
            self.archive_loaded,
            self.archive_skipped,
            self.most_popular_loaded,
            self.most_popular_skipped,
            self.errors
        )
    }
}

/// Replays unloaded files under the configured root prefix.
#[derive(Debug, Clone)]
pub struct BackfillDriver {
    loader: Loader,
}

impl BackfillDriver {
    /// Creates a driver over the given loader.
    #[must_use]
    pub fn new(loader: Loader) -> Self {
        Self { loader }
    }

    /// Runs one backfill sweep.
    ///
    /// Only `.ndjson` objects are considered. The already-loaded path set is
    /// fetched once up front; the per-file unit re-checks the manifest as
    /// well, so a file loaded between the fetch and its turn is still
    /// skipped. A most-popular path without an extractable date is logged
    /// and skipped here (it can never load, so retrying it forever would be
    /// noise).
    ///
    /// # Errors
    ///
    /// Returns an error only if the listing or the manifest fetch fails;
    /// per-file load failures are counted in the report instead.
    pub async fn run(&self) -> Result<BackfillReport> {
        let config = self.loader.config();
        let loaded = self.loader.manifest().loaded_paths().await?;
        info!(count = loaded.len(), "fetched already-loaded paths from manifest");

        let mut objects = self.loader.storage().list(&config.list_prefix()).await?;
        objects.sort_by(|a, b| a.path.cmp(&b.path));
        info!(count = objects.len(), prefix = %config.list_prefix(), "listed objects");

        let mut report = BackfillReport::default();
        for object in objects {
            if !object.path.ends_with(".ndjson") {
                continue;
            }

            let file = match classify(&config.root_prefix, &object.path) {
                Ok(Classification::File(file)) => file,
                Ok(Classification::Ignored) => continue,
                Err(LoadError::MalformedPath(_)) => {
                    warn!(path = %object.path, "skipping (no snapshot date)");
                    continue;
                }
                Err(other) => return Err(other),
            };

            if loaded.contains(&file.path) {
                report.record_skipped(file.family);
                continue;
            }

            info!(family = %file.family, path = %file.path, "loading");
            match self.loader.load_file(&file).await {
                Ok(LoadOutcome::Loaded { .. }) => report.record_loaded(file.family),
                Ok(LoadOutcome::AlreadyLoaded) => report.record_skipped(file.family),
                Err(error) => {
                    error!(family = %file.family, path = %file.path, %error, "failed to load");
                    report.errors += 1;
                }
            }
        }

        info!(%report, "backfill complete");
        Ok(report)
    }
}
