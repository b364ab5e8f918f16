//! # kiosk-core
//!
//! Core abstractions for the kiosk warehouse loader.
//!
//! This crate provides the foundational types and traits used across all
//! kiosk components:
//!
//! - **Storage**: Object storage abstraction for normalized snapshot files
//! - **Warehouse**: Typed tables, NDJSON loads, and deduplicating merges
//! - **Schema**: Ordered column schemas and safe-cast value coercion
//! - **Error Types**: Shared error definitions and result types
//! - **Observability**: Structured logging setup
//!
//! ## Crate Boundary
//!
//! `kiosk-core` is the **only** crate allowed to define shared primitives.
//! Loader semantics (families, manifest, dispatch) live in `kiosk-loader`;
//! this crate knows nothing about record families.
//!
//! ## Example
//!
//! ```rust
//! use kiosk_core::prelude::*;
//!
//! let table = TableRef::new("prod", "archive_articles");
//! assert_eq!(table.qualified(), "prod.archive_articles");
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod jsonl;
pub mod observability;
pub mod schema;
pub mod storage;
pub mod warehouse;

pub use error::{Error, Result};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::jsonl::JsonlWarehouse;
    pub use crate::observability::{LogFormat, init_logging};
    pub use crate::schema::{Column, ColumnType, TableSchema};
    pub use crate::storage::{MemoryBackend, ObjectStoreBackend, StorageBackend};
    pub use crate::warehouse::{MemoryWarehouse, Row, TableRef, Warehouse, WriteDisposition};
}
