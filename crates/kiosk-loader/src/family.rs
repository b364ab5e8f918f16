//! Record families and their per-family load descriptors.
//!
//! A family bundles everything the generic load unit needs to handle one
//! record shape: the final warehouse schema, the load-time schema variant,
//! the natural key, and the promotion transform that converts a temp-table
//! row into a final-schema row. Adding a family is a data change here; the
//! loader itself is family-agnostic.

use chrono::NaiveDate;
use serde_json::Value;

use kiosk_core::schema::{Column, ColumnType, TableSchema};
use kiosk_core::warehouse::Row;
use kiosk_core::{Error, Result};

/// A named shape of ingested record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    /// Monthly archive snapshots, one file per `YYYY/MM`.
    Archive,
    /// Daily most-viewed snapshots, one file per `YYYY-MM-DD`.
    MostPopular,
}

impl Family {
    /// Returns all families in classification priority order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Archive, Self::MostPopular]
    }

    /// Returns the manifest `source` value for this family.
    #[must_use]
    pub const fn source_name(self) -> &'static str {
        match self {
            Self::Archive => "archive_slim",
            Self::MostPopular => "most_popular_slim",
        }
    }

    /// Returns the object-path prefix identifying this family's files,
    /// relative to the root prefix.
    #[must_use]
    pub const fn path_prefix(self) -> &'static str {
        match self {
            Self::Archive => "archive_slim/",
            Self::MostPopular => "most_popular_slim/",
        }
    }

    /// Returns the table name shared by this family's staging and final
    /// tables (differentiated by dataset).
    #[must_use]
    pub const fn table_name(self) -> &'static str {
        match self {
            Self::Archive => "archive_articles",
            Self::MostPopular => "most_popular_articles",
        }
    }

    /// Returns the natural key columns that must be unique in the final table.
    #[must_use]
    pub const fn key_columns(self) -> &'static [&'static str] {
        match self {
            Self::Archive => &["article_id"],
            Self::MostPopular => &["snapshot_date", "id"],
        }
    }

    /// Returns the final warehouse schema, in column order.
    #[must_use]
    pub fn final_schema(self) -> TableSchema {
        match self {
            Self::Archive => TableSchema::new(vec![
                Column::new("article_id", ColumnType::String),
                Column::new("uri", ColumnType::String),
                Column::new("pub_date", ColumnType::Date),
                Column::new("section_name", ColumnType::String),
                Column::new("news_desk", ColumnType::String),
                Column::new("type_of_material", ColumnType::String),
                Column::new("document_type", ColumnType::String),
                Column::new("word_count", ColumnType::Int64),
                Column::new("web_url", ColumnType::String),
                Column::new("headline_main", ColumnType::String),
                Column::new("byline_original", ColumnType::String),
                Column::new("abstract", ColumnType::String),
                Column::new("snippet", ColumnType::String),
                Column::new("keywords", ColumnType::Json),
                Column::new("byline_person", ColumnType::Json),
                Column::new("multimedia_count_by_type", ColumnType::Json),
            ]),
            Self::MostPopular => TableSchema::new(vec![
                Column::new("snapshot_date", ColumnType::Date),
                Column::new("id", ColumnType::Int64),
                Column::new("uri", ColumnType::String),
                Column::new("url", ColumnType::String),
                Column::new("asset_id", ColumnType::Int64),
                Column::new("source", ColumnType::String),
                Column::new("published_date", ColumnType::String),
                Column::new("updated", ColumnType::String),
                Column::new("section", ColumnType::String),
                Column::new("subsection", ColumnType::String),
                Column::new("byline", ColumnType::String),
                Column::new("type", ColumnType::String),
                Column::new("title", ColumnType::String),
                Column::new("abstract", ColumnType::String),
                Column::new("des_facet", ColumnType::Json),
                Column::new("org_facet", ColumnType::Json),
                Column::new("per_facet", ColumnType::Json),
                Column::new("geo_facet", ColumnType::Json),
                Column::new("media_count_by_type", ColumnType::Json),
                Column::new("adx_keywords", ColumnType::String),
            ]),
        }
    }

    /// Returns the load-time schema used for the temp-table hop.
    ///
    /// Identical to the final schema except that fields requiring derivation
    /// are widened to a permissive textual type (archive `pub_date` arrives as
    /// a string timestamp) and path-derived fields are omitted entirely
    /// (most-popular `snapshot_date` does not exist in the file).
    #[must_use]
    pub fn load_schema(self) -> TableSchema {
        match self {
            Self::Archive => self.final_schema().retyped("pub_date", ColumnType::String),
            Self::MostPopular => self.final_schema().without("snapshot_date"),
        }
    }

    /// Promotes one temp-table row into a final-schema row.
    ///
    /// Archive: the publication timestamp's first 10 characters are parsed as
    /// a calendar date; a malformed date becomes null (safe-cast policy, so
    /// one bad record never rejects a file). Most-popular: the path-derived
    /// snapshot date is injected as the leading column. All other columns
    /// pass through unchanged, in final column order.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if this family requires path metadata
    /// that `meta` does not carry.
    pub fn promote(self, row: &Row, meta: &PathMeta) -> Result<Row> {
        let schema = self.final_schema();
        let mut promoted = Row::new();
        match self {
            Self::Archive => {
                for column in schema.columns() {
                    let value = if column.name == "pub_date" {
                        parse_pub_date(row.get("pub_date"))
                    } else {
                        row.get(&column.name).cloned().unwrap_or(Value::Null)
                    };
                    promoted.insert(column.name.clone(), value);
                }
            }
            Self::MostPopular => {
                let snapshot_date = meta.snapshot_date.ok_or_else(|| {
                    Error::InvalidInput("most_popular promotion requires a snapshot date".into())
                })?;
                for column in schema.columns() {
                    let value = if column.name == "snapshot_date" {
                        Value::String(snapshot_date.to_string())
                    } else {
                        row.get(&column.name).cloned().unwrap_or(Value::Null)
                    };
                    promoted.insert(column.name.clone(), value);
                }
            }
        }
        Ok(promoted)
    }
}

impl std::fmt::Display for Family {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source_name())
    }
}

/// Metadata derived from a file's object path rather than its contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PathMeta {
    /// Snapshot date embedded in most-popular paths.
    pub snapshot_date: Option<NaiveDate>,
}

/// Takes the first 10 characters of a string timestamp and parses them as a
/// calendar date (`2020-05-03T00:00:00+0000` → `2020-05-03`). Anything that
/// doesn't parse becomes null.
fn parse_pub_date(value: Option<&Value>) -> Value {
    value
        .and_then(Value::as_str)
        .map(|s| s.get(..10).unwrap_or(s))
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        .map_or(Value::Null, |d| Value::String(d.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_load_schema_widens_archive_pub_date() {
        let schema = Family::Archive.load_schema();
        assert_eq!(
            schema.column("pub_date").map(|c| c.ty),
            Some(ColumnType::String)
        );
        // Everything else matches the final schema.
        assert_eq!(
            schema.columns().len(),
            Family::Archive.final_schema().columns().len()
        );
    }

    #[test]
    fn test_load_schema_omits_most_popular_snapshot_date() {
        let schema = Family::MostPopular.load_schema();
        assert!(schema.column("snapshot_date").is_none());
        assert_eq!(
            schema.columns().len(),
            Family::MostPopular.final_schema().columns().len() - 1
        );
    }

    #[test]
    fn test_promote_archive_converts_pub_date() {
        let mut row = Row::new();
        row.insert("article_id".into(), json!("nyt://article/abc"));
        row.insert("pub_date".into(), json!("2020-05-03T00:00:00+0000"));

        let promoted = Family::Archive.promote(&row, &PathMeta::default()).unwrap();

        assert_eq!(promoted.get("pub_date"), Some(&json!("2020-05-03")));
        assert_eq!(promoted.get("article_id"), Some(&json!("nyt://article/abc")));
        // Missing columns become null, in schema order.
        assert_eq!(promoted.get("word_count"), Some(&Value::Null));
    }

    #[test]
    fn test_promote_archive_malformed_date_is_null() {
        let mut row = Row::new();
        row.insert("pub_date".into(), json!("unknown"));

        let promoted = Family::Archive.promote(&row, &PathMeta::default()).unwrap();
        assert_eq!(promoted.get("pub_date"), Some(&Value::Null));
    }

    #[test]
    fn test_promote_most_popular_injects_snapshot_date() {
        let mut row = Row::new();
        row.insert("id".into(), json!(100_000_009_750_001_i64));
        row.insert("title".into(), json!("Headline"));

        let meta = PathMeta {
            snapshot_date: NaiveDate::from_ymd_opt(2026, 2, 19),
        };
        let promoted = Family::MostPopular.promote(&row, &meta).unwrap();

        assert_eq!(promoted.get("snapshot_date"), Some(&json!("2026-02-19")));
        let names: Vec<&str> = promoted.keys().map(String::as_str).collect();
        assert_eq!(names[0], "snapshot_date");
        assert_eq!(names[1], "id");
    }

    #[test]
    fn test_promote_most_popular_requires_snapshot_date() {
        let row = Row::new();
        let result = Family::MostPopular.promote(&row, &PathMeta::default());
        assert!(result.is_err());
    }
}
