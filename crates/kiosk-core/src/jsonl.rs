//! File-backed warehouse that persists tables as NDJSON under a root directory.
//!
//! Layout: `{root}/{dataset}/{table}.ndjson` holds the rows (one JSON object
//! per line, in schema order) and `{root}/{dataset}/{table}.schema.json` holds
//! the table schema. Suitable for local development and small deployments;
//! managed warehouse services plug in behind the same [`Warehouse`] trait.
//!
//! Operations are serialized through one async mutex, matching the loader's
//! single-unit-in-flight operating assumption.

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::schema::TableSchema;
use crate::warehouse::{Row, TableRef, Warehouse, WriteDisposition, parse_ndjson, row_key};

/// Warehouse persisting each table as an NDJSON file plus a schema sidecar.
#[derive(Debug)]
pub struct JsonlWarehouse {
    root: PathBuf,
    guard: Mutex<()>,
}

impl JsonlWarehouse {
    /// Creates a warehouse rooted at the given directory.
    ///
    /// The directory is created on first table creation; it does not need to
    /// exist yet.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            guard: Mutex::new(()),
        }
    }

    fn data_path(&self, table: &TableRef) -> PathBuf {
        self.root
            .join(&table.dataset)
            .join(format!("{}.ndjson", table.table))
    }

    fn schema_path(&self, table: &TableRef) -> PathBuf {
        self.root
            .join(&table.dataset)
            .join(format!("{}.schema.json", table.table))
    }

    async fn table_exists(&self, table: &TableRef) -> Result<bool> {
        tokio::fs::try_exists(self.schema_path(table))
            .await
            .map_err(|e| Error::warehouse_with_source(format!("stat {table}"), e))
    }

    async fn read_rows(&self, table: &TableRef) -> Result<Vec<Row>> {
        if !self.table_exists(table).await? {
            return Err(Error::NotFound(format!("table not found: {table}")));
        }

        let text = match tokio::fs::read_to_string(self.data_path(table)).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(Error::warehouse_with_source(format!("read {table}"), e)),
        };

        let mut rows = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let value: Value = serde_json::from_str(line).map_err(|e| Error::Serialization {
                message: format!("{table} line {}: {e}", idx + 1),
            })?;
            let Value::Object(row) = value else {
                return Err(Error::Serialization {
                    message: format!("{table} line {}: expected a JSON object", idx + 1),
                });
            };
            rows.push(row);
        }
        Ok(rows)
    }

    async fn write_rows(&self, table: &TableRef, rows: &[Row]) -> Result<()> {
        let mut out = String::new();
        for row in rows {
            let line = serde_json::to_string(row).map_err(|e| Error::Serialization {
                message: format!("serialize row for {table}: {e}"),
            })?;
            out.push_str(&line);
            out.push('\n');
        }
        tokio::fs::write(self.data_path(table), out)
            .await
            .map_err(|e| Error::warehouse_with_source(format!("write {table}"), e))
    }

    async fn ensure_parent(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::warehouse_with_source("create dataset directory", e))?;
        }
        Ok(())
    }
}

#[async_trait]
impl Warehouse for JsonlWarehouse {
    async fn ensure_table(&self, table: &TableRef, schema: &TableSchema) -> Result<()> {
        let _guard = self.guard.lock().await;
        if self.table_exists(table).await? {
            return Ok(());
        }

        let schema_path = self.schema_path(table);
        self.ensure_parent(&schema_path).await?;

        let schema_json = serde_json::to_vec_pretty(schema).map_err(|e| Error::Serialization {
            message: format!("serialize schema for {table}: {e}"),
        })?;
        tokio::fs::write(&schema_path, schema_json)
            .await
            .map_err(|e| Error::warehouse_with_source(format!("write schema for {table}"), e))?;
        self.write_rows(table, &[]).await
    }

    async fn load_ndjson(
        &self,
        table: &TableRef,
        schema: &TableSchema,
        data: Bytes,
        disposition: WriteDisposition,
    ) -> Result<u64> {
        let _guard = self.guard.lock().await;
        let incoming = parse_ndjson(schema, &data)?;
        let count = incoming.len() as u64;

        let mut rows = match disposition {
            WriteDisposition::Truncate => {
                if !self.table_exists(table).await? {
                    return Err(Error::NotFound(format!("table not found: {table}")));
                }
                Vec::new()
            }
            WriteDisposition::Append => self.read_rows(table).await?,
        };
        rows.extend(incoming);
        self.write_rows(table, &rows).await?;
        Ok(count)
    }

    async fn append_rows(&self, table: &TableRef, rows: Vec<Row>) -> Result<u64> {
        let _guard = self.guard.lock().await;
        let count = rows.len() as u64;
        let mut existing = self.read_rows(table).await?;
        existing.extend(rows);
        self.write_rows(table, &existing).await?;
        Ok(count)
    }

    async fn scan(&self, table: &TableRef) -> Result<Vec<Row>> {
        let _guard = self.guard.lock().await;
        self.read_rows(table).await
    }

    async fn count_where(&self, table: &TableRef, filters: &[(&str, Value)]) -> Result<u64> {
        let _guard = self.guard.lock().await;
        let rows = self.read_rows(table).await?;
        let count = rows
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
        let _guard = self.guard.lock().await;
        let source_rows = self.read_rows(source).await?;
        let mut target_rows = self.read_rows(target).await?;

        let mut seen: std::collections::HashSet<String> = target_rows
            .iter()
            .filter_map(|row| row_key(row, key_columns))
            .collect();

        let mut inserted = 0u64;
        for row in source_rows {
            match row_key(&row, key_columns) {
                Some(key) => {
                    if seen.insert(key) {
                        target_rows.push(row);
                        inserted += 1;
                    }
                }
                None => {
                    target_rows.push(row);
                    inserted += 1;
                }
            }
        }
        self.write_rows(target, &target_rows).await?;
        Ok(inserted)
    }

    async fn truncate(&self, table: &TableRef) -> Result<()> {
        let _guard = self.guard.lock().await;
        if !self.table_exists(table).await? {
            return Err(Error::NotFound(format!("table not found: {table}")));
        }
        self.write_rows(table, &[]).await
    }

    async fn drop_table(&self, table: &TableRef) -> Result<()> {
        let _guard = self.guard.lock().await;
        for path in [self.data_path(table), self.schema_path(table)] {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(Error::warehouse_with_source(format!("drop {table}"), e));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Column, ColumnType};
    use serde_json::json;

    fn schema() -> TableSchema {
        TableSchema::new(vec![
            Column::new("article_id", ColumnType::String),
            Column::new("word_count", ColumnType::Int64),
        ])
    }

    #[tokio::test]
    async fn test_roundtrip_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let table = TableRef::new("staging", "articles");

        {
            let wh = JsonlWarehouse::new(dir.path());
            wh.ensure_table(&table, &schema()).await.unwrap();
            wh.load_ndjson(
                &table,
                &schema(),
                Bytes::from("{\"article_id\": \"a1\", \"word_count\": 7}\n"),
                WriteDisposition::Truncate,
            )
            .await
            .unwrap();
        }

        // A fresh handle over the same root sees the durable rows.
        let wh = JsonlWarehouse::new(dir.path());
        let rows = wh.scan(&table).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("article_id"), Some(&json!("a1")));
    }

    #[tokio::test]
    async fn test_merge_and_truncate() {
        let dir = tempfile::tempdir().expect("tempdir");
        let wh = JsonlWarehouse::new(dir.path());
        let target = TableRef::new("prod", "articles");
        let source = TableRef::new("staging", "articles");
        wh.ensure_table(&target, &schema()).await.unwrap();
        wh.ensure_table(&source, &schema()).await.unwrap();

        let mut r1 = Row::new();
        r1.insert("article_id".into(), json!("a1"));
        r1.insert("word_count".into(), json!(1));
        let mut r2 = r1.clone();
        r2.insert("article_id".into(), json!("a2"));
        wh.append_rows(&source, vec![r1.clone(), r2]).await.unwrap();
        wh.append_rows(&target, vec![r1]).await.unwrap();

        let inserted = wh
            .merge_insert(&target, &source, &["article_id"])
            .await
            .unwrap();
        assert_eq!(inserted, 1);
        assert_eq!(wh.scan(&target).await.unwrap().len(), 2);

        wh.truncate(&source).await.unwrap();
        assert!(wh.scan(&source).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_table_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let wh = JsonlWarehouse::new(dir.path());
        let table = TableRef::new("staging", "missing");

        assert!(matches!(
            wh.scan(&table).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_drop_table_removes_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let wh = JsonlWarehouse::new(dir.path());
        let table = TableRef::new("staging", "articles_temp");
        wh.ensure_table(&table, &schema()).await.unwrap();

        wh.drop_table(&table).await.unwrap();
        wh.drop_table(&table).await.unwrap();
        assert!(wh.scan(&table).await.is_err());
    }
}
