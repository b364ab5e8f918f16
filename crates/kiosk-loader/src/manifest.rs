//! Append-only ledger of fully-loaded files.
//!
//! The manifest is the idempotency source of truth: a `(source, path)` row
//! means "this file's records have been durably merged into the final
//! table". Rows are written exactly once, strictly after the merge is
//! visible, and never updated or deleted. The membership check here is the
//! sole gate protecting against double-loading under event redelivery and
//! backfill replay.

use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use std::collections::HashSet;
use std::sync::Arc;

use kiosk_core::Result;
use kiosk_core::schema::{Column, ColumnType, TableSchema};
use kiosk_core::warehouse::{Row, TableRef, Warehouse};

use crate::family::Family;

/// Table name of the load manifest (within the metadata dataset).
pub const MANIFEST_TABLE_NAME: &str = "load_manifest";

/// Returns the manifest table schema: `(source, path, loaded_at)`.
#[must_use]
pub fn manifest_schema() -> TableSchema {
    TableSchema::new(vec![
        Column::new("source", ColumnType::String),
        Column::new("path", ColumnType::String),
        Column::new("loaded_at", ColumnType::Timestamp),
    ])
}

/// Handle over the manifest table.
#[derive(Clone)]
pub struct LoadManifest {
    warehouse: Arc<dyn Warehouse>,
    table: TableRef,
}

impl LoadManifest {
    /// Creates a manifest handle over the given table.
    #[must_use]
    pub fn new(warehouse: Arc<dyn Warehouse>, table: TableRef) -> Self {
        Self { warehouse, table }
    }

    /// Creates the manifest table if it does not exist.
    pub async fn ensure_table(&self) -> Result<()> {
        self.warehouse
            .ensure_table(&self.table, &manifest_schema())
            .await
    }

    /// Returns true if `(family, path)` has already been fully loaded.
    pub async fn is_loaded(&self, family: Family, path: &str) -> Result<bool> {
        let count = self
            .warehouse
            .count_where(
                &self.table,
                &[
                    ("source", json!(family.source_name())),
                    ("path", json!(path)),
                ],
            )
            .await?;
        Ok(count > 0)
    }

    /// Appends the manifest entry for a fully-loaded file.
    ///
    /// Must be called exactly once per successful per-file unit, only after
    /// the merge into the final table is durably visible. A manifest row
    /// without merged data is an unrecoverable false-idempotent state.
    pub async fn record_loaded(
        &self,
        family: Family,
        path: &str,
        loaded_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut row = Row::new();
        row.insert("source".into(), json!(family.source_name()));
        row.insert("path".into(), json!(path));
        row.insert("loaded_at".into(), json!(loaded_at.to_rfc3339()));
        self.warehouse.append_rows(&self.table, vec![row]).await?;
        Ok(())
    }

    /// Returns the set of all loaded paths, across both families.
    ///
    /// Used by backfill to skip manifested files without a per-file lookup.
    pub async fn loaded_paths(&self) -> Result<HashSet<String>> {
        let rows = self.warehouse.scan(&self.table).await?;
        Ok(rows
            .iter()
            .filter_map(|row| row.get("path").and_then(Value::as_str))
            .map(str::to_string)
            .collect())
    }
}

impl std::fmt::Debug for LoadManifest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadManifest")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}
