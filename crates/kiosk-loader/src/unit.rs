//! The per-file load unit: manifest check → stage → merge → manifest → truncate.
//!
//! The unit is atomic in intent but not transactionally atomic: the
//! warehouse offers no multi-table transaction, so the pipeline runs as an
//! explicit sequential state machine ([`LoadPhase`]). Failures carry the
//! last phase completed, and the ordering of the final steps is load-bearing:
//! the manifest row is written only after the merge is durably visible.
//! Writing it earlier would let a crash mark a file loaded without its data
//! ever reaching the final table, a silent, unrecoverable loss.
//!
//! Both partial-failure windows are safe by construction: a crash after
//! merge but before the manifest write reprocesses the file on retry (the
//! merge is idempotent per natural key, so only redundant work occurs); a
//! crash after the manifest write but before truncation leaves stray staging
//! rows that the next unit for the family merges harmlessly and then sweeps.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use kiosk_core::storage::StorageBackend;
use kiosk_core::warehouse::{Row, Warehouse, WriteDisposition};

use crate::config::LoaderConfig;
use crate::error::{LoadError, Result};
use crate::family::Family;
use crate::manifest::LoadManifest;
use crate::paths::ClassifiedFile;

/// States of the per-file load unit, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LoadPhase {
    /// No durable side effect has happened yet.
    NotStarted,
    /// Promoted rows are in the staging table.
    Staged,
    /// Unmatched rows have been inserted into the final table.
    Merged,
    /// The manifest row has been appended.
    Manifested,
    /// The staging table has been truncated; the unit is complete.
    Cleaned,
}

impl LoadPhase {
    /// Returns the phase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Staged => "staged",
            Self::Merged => "merged",
            Self::Manifested => "manifested",
            Self::Cleaned => "cleaned",
        }
    }
}

impl std::fmt::Display for LoadPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of one per-file load unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The manifest already listed this file; nothing was written.
    AlreadyLoaded,
    /// The file was staged and merged.
    Loaded {
        /// Rows loaded from the file into the temp table.
        rows_staged: u64,
        /// New rows the merge inserted into the final table.
        rows_merged: u64,
    },
}

/// Runs per-file load units against one storage bucket and warehouse.
///
/// Each invocation is expected to be short-lived with no shared state
/// across invocations; the loader holds only cheap `Arc` handles.
#[derive(Clone)]
pub struct Loader {
    storage: Arc<dyn StorageBackend>,
    warehouse: Arc<dyn Warehouse>,
    manifest: LoadManifest,
    config: LoaderConfig,
}

impl Loader {
    /// Creates a loader over the given storage and warehouse handles.
    #[must_use]
    pub fn new(
        storage: Arc<dyn StorageBackend>,
        warehouse: Arc<dyn Warehouse>,
        config: LoaderConfig,
    ) -> Self {
        let manifest = LoadManifest::new(warehouse.clone(), config.manifest_table());
        Self {
            storage,
            warehouse,
            manifest,
            config,
        }
    }

    /// Returns the loader configuration.
    #[must_use]
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Returns the manifest handle.
    #[must_use]
    pub fn manifest(&self) -> &LoadManifest {
        &self.manifest
    }

    /// Returns the storage backend handle.
    #[must_use]
    pub fn storage(&self) -> &Arc<dyn StorageBackend> {
        &self.storage
    }

    /// Creates the staging and final tables for every family, plus the
    /// manifest table. Idempotent; intended for startup and local setup.
    pub async fn ensure_tables(&self) -> kiosk_core::Result<()> {
        for &family in Family::all() {
            let schema = family.final_schema();
            self.warehouse
                .ensure_table(&self.config.staging_table(family), &schema)
                .await?;
            self.warehouse
                .ensure_table(&self.config.final_table(family), &schema)
                .await?;
        }
        self.manifest.ensure_table().await
    }

    /// Runs the per-file load unit for one classified file.
    ///
    /// Consults the manifest first and returns [`LoadOutcome::AlreadyLoaded`]
    /// without any write when the file is already listed; redelivered
    /// events and backfill replays short-circuit here. Otherwise the unit
    /// runs to completion or fails with the last phase it reached; no
    /// internal retry is attempted (the invoking platform is the retry
    /// mechanism, made safe by this same manifest check).
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::MalformedPath`] if the file requires path
    /// metadata it does not carry, or [`LoadError::Unit`] when a pipeline
    /// step fails.
    pub async fn load_file(&self, file: &ClassifiedFile) -> Result<LoadOutcome> {
        let family = file.family;
        let path = file.path.as_str();

        if self.manifest.is_loaded(family, path).await? {
            info!(%family, path, "path already loaded, skipping");
            return Ok(LoadOutcome::AlreadyLoaded);
        }

        if family == Family::MostPopular && file.meta.snapshot_date.is_none() {
            return Err(LoadError::MalformedPath(path.to_string()));
        }

        let temp = self.config.temp_table(family);
        let staging = self.config.staging_table(family);
        let final_table = self.config.final_table(family);
        let load_schema = family.load_schema();

        info!(%family, path, staging = %staging, "loading file");

        // Stage: temp-table hop, then promote into staging in one pass.
        self.warehouse
            .ensure_table(&temp, &load_schema)
            .await
            .map_err(unit_error(path, LoadPhase::NotStarted))?;
        let data = self
            .storage
            .get(path)
            .await
            .map_err(unit_error(path, LoadPhase::NotStarted))?;
        let rows_staged = self
            .warehouse
            .load_ndjson(&temp, &load_schema, data, WriteDisposition::Truncate)
            .await
            .map_err(unit_error(path, LoadPhase::NotStarted))?;
        debug!(rows = rows_staged, temp = %temp, "loaded rows into temp table");

        let temp_rows = self
            .warehouse
            .scan(&temp)
            .await
            .map_err(unit_error(path, LoadPhase::NotStarted))?;
        let promoted: Vec<Row> = temp_rows
            .iter()
            .map(|row| family.promote(row, &file.meta))
            .collect::<kiosk_core::Result<_>>()
            .map_err(unit_error(path, LoadPhase::NotStarted))?;
        self.warehouse
            .append_rows(&staging, promoted)
            .await
            .map_err(unit_error(path, LoadPhase::NotStarted))?;
        debug!(rows = rows_staged, "promoted rows into staging");

        // Temp drop is best-effort: the next load overwrites it anyway.
        if let Err(error) = self.warehouse.drop_table(&temp).await {
            warn!(temp = %temp, %error, "failed to drop temp table");
        }

        // Merge: insert staging rows whose natural key is new, then record
        // the load, then truncate. The order of these three steps is the
        // subsystem's central invariant.
        let rows_merged = self
            .warehouse
            .merge_insert(&final_table, &staging, family.key_columns())
            .await
            .map_err(unit_error(path, LoadPhase::Staged))?;
        debug!(rows = rows_merged, target = %final_table, "merge completed");

        self.manifest
            .record_loaded(family, path, Utc::now())
            .await
            .map_err(unit_error(path, LoadPhase::Merged))?;

        self.warehouse
            .truncate(&staging)
            .await
            .map_err(unit_error(path, LoadPhase::Manifested))?;

        info!(
            %family,
            path,
            rows_staged,
            rows_merged,
            phase = %LoadPhase::Cleaned,
            "load unit complete"
        );
        Ok(LoadOutcome::Loaded {
            rows_staged,
            rows_merged,
        })
    }
}

impl std::fmt::Debug for Loader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loader")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn unit_error(path: &str, reached: LoadPhase) -> impl FnOnce(kiosk_core::Error) -> LoadError + '_ {
    move |source| LoadError::Unit {
        path: path.to_string(),
        reached,
        source,
    }
}
