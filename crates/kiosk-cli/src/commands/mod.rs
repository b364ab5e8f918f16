//! CLI command implementations.

pub mod backfill;
pub mod load;

use std::sync::Arc;

use anyhow::{Context, Result};

use kiosk_core::jsonl::JsonlWarehouse;
use kiosk_core::storage::{ObjectStoreBackend, StorageBackend};
use kiosk_core::warehouse::Warehouse;
use kiosk_loader::Loader;

use crate::Config;

/// Builds a loader from the effective CLI configuration.
///
/// # Errors
///
/// Returns an error if the storage backend cannot be constructed.
pub fn build_loader(config: &Config) -> Result<Loader> {
    let storage: Arc<dyn StorageBackend> =
        Arc::new(ObjectStoreBackend::from_bucket(&config.loader.bucket).with_context(|| {
            format!("storage backend for bucket {}", config.loader.bucket)
        })?);
    let warehouse: Arc<dyn Warehouse> = Arc::new(JsonlWarehouse::new(&config.warehouse_dir));
    Ok(Loader::new(storage, warehouse, config.loader.clone()))
}
