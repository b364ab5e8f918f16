//! Shared test utilities for kiosk integration tests.
//!
//! This crate provides:
//! - [`FailingWarehouse`]: warehouse wrapper with configurable failure injection
//! - NDJSON record fixtures for both families
//!
//! # Example
//!
//! ```rust,ignore
//! use kiosk_test_utils::{FailingWarehouse, WarehouseOp};
//!
//! let warehouse = FailingWarehouse::new();
//! warehouse.fail_on(WarehouseOp::Truncate, "staging.archive_articles");
//! // ... run the unit and assert on the failure path ...
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
// Test utilities use expect/unwrap for cleaner test code - panics are acceptable in tests
#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::missing_panics_doc)]

pub mod failing;
pub mod fixtures;

pub use failing::*;
pub use fixtures::*;

/// Initialize test logging (call once per test module).
pub fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("kiosk=debug".parse().expect("valid directive")),
        )
        .with_test_writer()
        .try_init();
}
