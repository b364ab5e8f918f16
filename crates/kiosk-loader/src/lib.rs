//! # kiosk-loader
//!
//! Event-driven, exactly-once loader for normalized news snapshot files.
//!
//! This crate implements the loader domain over the `kiosk-core` storage and
//! warehouse abstractions:
//!
//! - **Families**: the two record shapes (`archive`, `most_popular`) with
//!   their schemas, natural keys, and path patterns
//! - **Per-File Load Unit**: manifest check → temp load → promote to staging
//!   → merge to final → manifest append → staging truncate
//! - **Event Dispatch**: storage-notification classification and handling
//! - **Backfill**: best-effort batch replay of unmanifested files
//!
//! ## Idempotency
//!
//! One normalized file is one unit of idempotency, whatever its record
//! count. The load manifest is the source of truth: the per-file unit
//! short-circuits on a manifest hit before any load work, and writes the
//! manifest row only after the deduplicating merge is durably visible.
//! Between those two points the unit is redelivery-safe because the merge
//! inserts only natural keys the final table does not yet hold.
//!
//! ## Concurrency
//!
//! Units for one family share a staging table; the design assumes at most
//! one in-flight unit per family, enforced by the invoking platform. Nothing
//! here locks, retries, or times out internally.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod backfill;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod family;
pub mod manifest;
pub mod paths;
pub mod unit;

// Re-export main types at crate root
pub use backfill::{BackfillDriver, BackfillReport};
pub use config::LoaderConfig;
pub use dispatch::{Dispatcher, EventOutcome, StorageEvent};
pub use error::{LoadError, Result};
pub use family::{Family, PathMeta};
pub use manifest::LoadManifest;
pub use paths::{Classification, ClassifiedFile, classify};
pub use unit::{LoadOutcome, LoadPhase, Loader};
