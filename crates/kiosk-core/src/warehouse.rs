//! Warehouse abstraction: typed tables, NDJSON loads, and key-deduplicating merges.
//!
//! The loader's contract with the analytical warehouse is narrow and
//! set-oriented: create a table if absent, bulk-load NDJSON against a schema,
//! scan, append, merge-insert on a natural key, truncate, drop. Backends
//! implement [`Warehouse`]; the in-memory implementation here backs tests and
//! local development, and [`crate::jsonl::JsonlWarehouse`] persists tables to
//! disk.
//!
//! Merge semantics follow SQL `MERGE ... WHEN NOT MATCHED THEN INSERT`:
//! only source rows whose natural key is absent from the target are inserted,
//! matched rows are left untouched, and a null key component never matches
//! anything. Duplicate keys within one source batch collapse to the first
//! row, so the target never holds two rows for one key.

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, RwLock};

use crate::error::{Error, Result};
use crate::schema::{TableSchema, coerce_value};

/// One warehouse row: column name → JSON value, in schema order.
pub type Row = serde_json::Map<String, Value>;

/// A dataset-qualified table name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    /// Dataset (schema/namespace) the table lives in.
    pub dataset: String,
    /// Table name within the dataset.
    pub table: String,
}

impl TableRef {
    /// Creates a new table reference.
    #[must_use]
    pub fn new(dataset: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            table: table.into(),
        }
    }

    /// Returns the `dataset.table` qualified name.
    #[must_use]
    pub fn qualified(&self) -> String {
        format!("{}.{}", self.dataset, self.table)
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.dataset, self.table)
    }
}

/// How a bulk load treats existing table contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteDisposition {
    /// Keep existing rows and append.
    Append,
    /// Replace all existing rows.
    Truncate,
}

/// Warehouse operations used by the loader.
///
/// All operations run to completion or raise; there are no partial-success
/// return values and no internal retries.
#[async_trait]
pub trait Warehouse: Send + Sync + 'static {
    /// Creates a table with the given schema if it does not already exist.
    ///
    /// An existing table is left untouched, whatever its schema.
    async fn ensure_table(&self, table: &TableRef, schema: &TableSchema) -> Result<()>;

    /// Bulk-loads newline-delimited JSON into a table.
    ///
    /// Each non-empty line must be a JSON object. Fields are projected onto
    /// the schema in column order: extra fields are ignored, missing fields
    /// become null, and values that don't fit their column type become null
    /// (safe-cast semantics). Returns the number of rows loaded.
    ///
    /// Returns `Error::NotFound` if the table does not exist and
    /// `Error::Serialization` if a line is not valid JSON.
    async fn load_ndjson(
        &self,
        table: &TableRef,
        schema: &TableSchema,
        data: Bytes,
        disposition: WriteDisposition,
    ) -> Result<u64>;

    /// Appends pre-built rows to a table. Returns the number appended.
    async fn append_rows(&self, table: &TableRef, rows: Vec<Row>) -> Result<u64>;

    /// Reads all rows of a table.
    async fn scan(&self, table: &TableRef) -> Result<Vec<Row>>;

    /// Counts rows whose named fields equal the given values.
    async fn count_where(&self, table: &TableRef, filters: &[(&str, Value)]) -> Result<u64>;

    /// Inserts every source row whose natural key is absent from the target.
    ///
    /// Matched rows are left untouched (first-write-wins). A null key
    /// component never matches, so such rows always insert. Returns the
    /// number of rows inserted.
    async fn merge_insert(
        &self,
        target: &TableRef,
        source: &TableRef,
        key_columns: &[&str],
    ) -> Result<u64>;

    /// Removes all rows from a table, keeping its schema.
    async fn truncate(&self, table: &TableRef) -> Result<()>;

    /// Drops a table. Succeeds even if the table does not exist.
    async fn drop_table(&self, table: &TableRef) -> Result<()>;
}

/// Projects a raw JSON object onto a schema, in column order.
///
/// Extra fields are dropped, missing fields become null, and each kept value
/// passes through [`coerce_value`].
#[must_use]
pub fn project_row(schema: &TableSchema, raw: &serde_json::Map<String, Value>) -> Row {
    let mut row = Row::new();
    for column in schema.columns() {
        let value = raw
            .get(&column.name)
            .map_or(Value::Null, |v| coerce_value(v, column.ty));
        row.insert(column.name.clone(), value);
    }
    row
}

/// Parses NDJSON bytes into schema-projected rows.
///
/// # Errors
///
/// Returns `Error::Serialization` if any non-empty line is not a JSON object.
pub fn parse_ndjson(schema: &TableSchema, data: &Bytes) -> Result<Vec<Row>> {
    let text = std::str::from_utf8(data).map_err(|e| Error::Serialization {
        message: format!("ndjson is not valid UTF-8: {e}"),
    })?;

    let mut rows = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(line).map_err(|e| Error::Serialization {
            message: format!("line {}: invalid JSON: {e}", idx + 1),
        })?;
        let Value::Object(raw) = value else {
            return Err(Error::Serialization {
                message: format!("line {}: expected a JSON object", idx + 1),
            });
        };
        rows.push(project_row(schema, &raw));
    }
    Ok(rows)
}

/// Builds a comparable key string from a row's key columns.
///
/// Returns `None` if any component is null or missing (a null key never
/// matches under merge semantics).
#[must_use]
pub fn row_key(row: &Row, key_columns: &[&str]) -> Option<String> {
    let mut parts = Vec::with_capacity(key_columns.len());
    for column in key_columns {
        match row.get(*column) {
            Some(value) if !value.is_null() => parts.push(value.to_string()),
            _ => return None,
        }
    }
    Some(parts.join("\u{1f}"))
}

// ============================================================================
// MemoryWarehouse
// ============================================================================

#[derive(Debug, Clone)]
struct StoredTable {
    schema: TableSchema,
    rows: Vec<Row>,
}

/// In-memory warehouse for tests and local development.
///
/// Thread-safe via `RwLock`. Tables are keyed by `dataset.table`.
#[derive(Debug, Default)]
pub struct MemoryWarehouse {
    tables: Arc<RwLock<HashMap<String, StoredTable>>>,
}

impl MemoryWarehouse {
    /// Creates a new empty warehouse.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read_lock(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, StoredTable>>> {
        self.tables.read().map_err(|_| Error::Internal {
            message: "lock poisoned".into(),
        })
    }

    fn write_lock(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, StoredTable>>> {
        self.tables.write().map_err(|_| Error::Internal {
            message: "lock poisoned".into(),
        })
    }
}

fn table_not_found(table: &TableRef) -> Error {
    Error::NotFound(format!("table not found: {table}"))
}

#[async_trait]
impl Warehouse for MemoryWarehouse {
    async fn ensure_table(&self, table: &TableRef, schema: &TableSchema) -> Result<()> {
        let mut tables = self.write_lock()?;
        tables.entry(table.qualified()).or_insert_with(|| StoredTable {
            schema: schema.clone(),
            rows: Vec::new(),
        });
        Ok(())
    }

    async fn load_ndjson(
        &self,
        table: &TableRef,
        schema: &TableSchema,
        data: Bytes,
        disposition: WriteDisposition,
    ) -> Result<u64> {
        let rows = parse_ndjson(schema, &data)?;
        let count = rows.len() as u64;

        let mut tables = self.write_lock()?;
        let stored = tables
            .get_mut(&table.qualified())
            .ok_or_else(|| table_not_found(table))?;

        if disposition == WriteDisposition::Truncate {
            stored.rows.clear();
        }
        stored.rows.extend(rows);
        Ok(count)
    }

    async fn append_rows(&self, table: &TableRef, rows: Vec<Row>) -> Result<u64> {
        let count = rows.len() as u64;
        let mut tables = self.write_lock()?;
        let stored = tables
            .get_mut(&table.qualified())
            .ok_or_else(|| table_not_found(table))?;
        stored.rows.extend(rows);
        Ok(count)
    }

    async fn scan(&self, table: &TableRef) -> Result<Vec<Row>> {
        let tables = self.read_lock()?;
        tables
            .get(&table.qualified())
            .map(|t| t.rows.clone())
            .ok_or_else(|| table_not_found(table))
    }

    async fn count_where(&self, table: &TableRef, filters: &[(&str, Value)]) -> Result<u64> {
        let tables = self.read_lock()?;
        let stored = tables
            .get(&table.qualified())
            .ok_or_else(|| table_not_found(table))?;

        let count = stored
            .rows
            .iter()
            .filter(|row| {
                filters
                    .iter()
                    .all(|(name, value)| row.get(*name) == Some(value))
            })
            .count();
        Ok(count as u64)
    }

    async fn merge_insert(
        &self,
        target: &TableRef,
        source: &TableRef,
        key_columns: &[&str],
    ) -> Result<u64> {
        let mut tables = self.write_lock()?;

        let source_rows = tables
            .get(&source.qualified())
            .ok_or_else(|| table_not_found(source))?
            .rows
            .clone();

        let stored = tables
            .get_mut(&target.qualified())
            .ok_or_else(|| table_not_found(target))?;

        let mut seen: HashSet<String> = stored
            .rows
            .iter()
            .filter_map(|row| row_key(row, key_columns))
            .collect();

        let mut inserted = 0u64;
        for row in source_rows {
            match row_key(&row, key_columns) {
                Some(key) => {
                    if seen.insert(key) {
                        stored.rows.push(row);
                        inserted += 1;
                    }
                }
                // Null keys never match; they always insert.
                None => {
                    stored.rows.push(row);
                    inserted += 1;
                }
            }
        }
        Ok(inserted)
    }

    async fn truncate(&self, table: &TableRef) -> Result<()> {
        let mut tables = self.write_lock()?;
        let stored = tables
            .get_mut(&table.qualified())
            .ok_or_else(|| table_not_found(table))?;
        stored.rows.clear();
        Ok(())
    }

    async fn drop_table(&self, table: &TableRef) -> Result<()> {
        let mut tables = self.write_lock()?;
        tables.remove(&table.qualified());
        Ok(())
    }
}
