//! Column and table schema model for warehouse tables.
//!
//! A [`TableSchema`] is an ordered list of named, typed columns. Column order
//! is part of the contract: loaders emit rows in schema order, and the final
//! and staging tables for a record family share one ordering.
//!
//! Value coercion follows safe-cast semantics: a raw JSON value that does not
//! fit its column type becomes null instead of failing the row. See
//! [`coerce_value`].

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Scalar and semi-structured column types supported by the warehouse layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColumnType {
    /// UTF-8 string.
    String,
    /// 64-bit signed integer.
    Int64,
    /// 64-bit floating point.
    Float64,
    /// Boolean.
    Bool,
    /// Calendar date, serialized as `YYYY-MM-DD`.
    Date,
    /// Instant in time, serialized as RFC 3339.
    Timestamp,
    /// Arbitrary JSON (arrays, objects, nested records).
    Json,
}

/// One named, typed column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Column type.
    #[serde(rename = "type")]
    pub ty: ColumnType,
}

impl Column {
    /// Creates a new column.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Ordered list of columns describing one warehouse table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    columns: Vec<Column>,
}

impl TableSchema {
    /// Creates a schema from an ordered column list.
    #[must_use]
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Returns the columns in declaration order.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Looks up a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Returns a copy of this schema with one column's type replaced.
    ///
    /// Unknown names are ignored; the schema is returned unchanged.
    #[must_use]
    pub fn retyped(&self, name: &str, ty: ColumnType) -> Self {
        let columns = self
            .columns
            .iter()
            .map(|c| {
                if c.name == name {
                    Column::new(c.name.clone(), ty)
                } else {
                    c.clone()
                }
            })
            .collect();
        Self { columns }
    }

    /// Returns a copy of this schema with the named column removed.
    #[must_use]
    pub fn without(&self, name: &str) -> Self {
        let columns = self
            .columns
            .iter()
            .filter(|c| c.name != name)
            .cloned()
            .collect();
        Self { columns }
    }
}

/// Coerces a raw JSON value to a column type, substituting null on mismatch.
///
/// This mirrors warehouse safe-cast semantics: a value that cannot be
/// represented in the column's type yields `Value::Null` rather than an
/// error, so one malformed field never rejects a whole file.
#[must_use]
pub fn coerce_value(value: &Value, ty: ColumnType) -> Value {
    if value.is_null() {
        return Value::Null;
    }

    match ty {
        ColumnType::String => match value {
            Value::String(_) => value.clone(),
            _ => Value::Null,
        },
        ColumnType::Int64 => value.as_i64().map_or(Value::Null, Value::from),
        ColumnType::Float64 => value.as_f64().map_or(Value::Null, Value::from),
        ColumnType::Bool => value.as_bool().map_or(Value::Null, Value::from),
        ColumnType::Date => value
            .as_str()
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
            .map_or(Value::Null, |d| Value::String(d.to_string())),
        ColumnType::Timestamp => value
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map_or_else(|| Value::Null, |_| value.clone()),
        ColumnType::Json => value.clone(),
    }
}
