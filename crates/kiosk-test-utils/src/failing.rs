//! Warehouse wrapper that injects failures at configurable operations.
//!
//! Used for testing crash recovery between the non-atomic steps of the
//! per-file load unit.

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use kiosk_core::schema::TableSchema;
use kiosk_core::warehouse::{
    MemoryWarehouse, Row, TableRef, Warehouse, WriteDisposition,
};
use kiosk_core::{Error, Result};

/// Warehouse operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarehouseOp {
    /// `ensure_table`
    EnsureTable,
    /// `load_ndjson`
    LoadNdjson,
    /// `append_rows`
    AppendRows,
    /// `scan`
    Scan,
    /// `count_where`
    CountWhere,
    /// `merge_insert`
    MergeInsert,
    /// `truncate`
    Truncate,
    /// `drop_table`
    DropTable,
}

impl WarehouseOp {
    /// Returns every operation that writes.
    pub const fn writes() -> &'static [Self] {
        &[
            Self::EnsureTable,
            Self::LoadNdjson,
            Self::AppendRows,
            Self::MergeInsert,
            Self::Truncate,
            Self::DropTable,
        ]
    }
}

/// Warehouse wrapper that injects failures at configured `(op, table)` pairs.
///
/// Injected failures are single-shot: the first matching call fails and
/// consumes the entry, so a retried unit proceeds normally. Modeled as a
/// crash at an arbitrary point between warehouse operations.
#[derive(Debug, Default)]
pub struct FailingWarehouse {
    inner: MemoryWarehouse,
    failures: RwLock<HashSet<(WarehouseOp, String)>>,
    fail_all_writes: AtomicBool,
}

impl FailingWarehouse {
    /// Creates a wrapper over an empty `MemoryWarehouse`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the next call of `op` against `table` (qualified name)
    /// to fail.
    pub fn fail_on(&self, op: WarehouseOp, table: &str) {
        self.failures
            .write()
            .unwrap()
            .insert((op, table.to_string()));
    }

    /// Makes every write operation fail until cleared. Reads still succeed,
    /// so manifest lookups can be exercised while proving zero writes occur.
    pub fn fail_all_writes(&self) {
        self.fail_all_writes.store(true, Ordering::SeqCst);
    }

    /// Check if a call should fail (and consume a single-shot entry if so).
    fn should_fail(&self, op: WarehouseOp, table: &TableRef) -> bool {
        if self.fail_all_writes.load(Ordering::SeqCst) && WarehouseOp::writes().contains(&op) {
            return true;
        }
        self.failures
            .write()
            .unwrap()
            .remove(&(op, table.qualified()))
    }

    fn injected(op: WarehouseOp, table: &TableRef) -> Error {
        Error::warehouse(format!("injected {op:?} failure on {table}"))
    }
}

#[async_trait]
impl Warehouse for FailingWarehouse {
    async fn ensure_table(&self, table: &TableRef, schema: &TableSchema) -> Result<()> {
        if self.should_fail(WarehouseOp::EnsureTable, table) {
            return Err(Self::injected(WarehouseOp::EnsureTable, table));
        }
        self.inner.ensure_table(table, schema).await
    }

    async fn load_ndjson(
        &self,
        table: &TableRef,
        schema: &TableSchema,
        data: Bytes,
        disposition: WriteDisposition,
    ) -> Result<u64> {
        if self.should_fail(WarehouseOp::LoadNdjson, table) {
            return Err(Self::injected(WarehouseOp::LoadNdjson, table));
        }
        self.inner.load_ndjson(table, schema, data, disposition).await
    }

    async fn append_rows(&self, table: &TableRef, rows: Vec<Row>) -> Result<u64> {
        if self.should_fail(WarehouseOp::AppendRows, table) {
            return Err(Self::injected(WarehouseOp::AppendRows, table));
        }
        self.inner.append_rows(table, rows).await
    }

    async fn scan(&self, table: &TableRef) -> Result<Vec<Row>> {
        if self.should_fail(WarehouseOp::Scan, table) {
            return Err(Self::injected(WarehouseOp::Scan, table));
        }
        self.inner.scan(table).await
    }

    async fn count_where(&self, table: &TableRef, filters: &[(&str, Value)]) -> Result<u64> {
        if self.should_fail(WarehouseOp::CountWhere, table) {
            return Err(Self::injected(WarehouseOp::CountWhere, table));
        }
        self.inner.count_where(table, filters).await
    }

    async fn merge_insert(
        &self,
        target: &TableRef,
        source: &TableRef,
        key_columns: &[&str],
    ) -> Result<u64> {
        if self.should_fail(WarehouseOp::MergeInsert, target) {
            return Err(Self::injected(WarehouseOp::MergeInsert, target));
        }
        self.inner.merge_insert(target, source, key_columns).await
    }

    async fn truncate(&self, table: &TableRef) -> Result<()> {
        if self.should_fail(WarehouseOp::Truncate, table) {
            return Err(Self::injected(WarehouseOp::Truncate, table));
        }
        self.inner.truncate(table).await
    }

    async fn drop_table(&self, table: &TableRef) -> Result<()> {
        if self.should_fail(WarehouseOp::DropTable, table) {
            return Err(Self::injected(WarehouseOp::DropTable, table));
        }
        self.inner.drop_table(table).await
    }
}
