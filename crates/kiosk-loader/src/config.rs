//! Loader configuration: bucket, root prefix, and the three-dataset layout.
//!
//! Tables keep the same name in the staging and prod datasets; the manifest
//! lives in a separate metadata dataset. Configuration comes from the
//! environment with no defaults; a missing variable is a startup error,
//! never a silently wrong table.

use kiosk_core::warehouse::TableRef;
use kiosk_core::{Error, Result};

use crate::family::Family;
use crate::manifest::MANIFEST_TABLE_NAME;

/// Environment variable naming the storage bucket.
pub const ENV_BUCKET: &str = "KIOSK_BUCKET";
/// Environment variable naming the root prefix under the bucket.
pub const ENV_ROOT_PREFIX: &str = "KIOSK_ROOT_PREFIX";
/// Environment variable naming the staging dataset.
pub const ENV_STAGING_DATASET: &str = "KIOSK_STAGING_DATASET";
/// Environment variable naming the metadata dataset.
pub const ENV_METADATA_DATASET: &str = "KIOSK_METADATA_DATASET";
/// Environment variable naming the prod dataset.
pub const ENV_PROD_DATASET: &str = "KIOSK_PROD_DATASET";

/// Settings shared by every loader entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Storage bucket holding the normalized files.
    pub bucket: String,
    /// Prefix under the bucket that both family sub-prefixes live under.
    pub root_prefix: String,
    /// Dataset holding staging and temp tables.
    pub staging_dataset: String,
    /// Dataset holding the load manifest.
    pub metadata_dataset: String,
    /// Dataset holding the final tables consumers read from.
    pub prod_dataset: String,
}

impl LoaderConfig {
    /// Reads the configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the first missing variable.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            bucket: required_env(ENV_BUCKET)?,
            root_prefix: required_env(ENV_ROOT_PREFIX)?,
            staging_dataset: required_env(ENV_STAGING_DATASET)?,
            metadata_dataset: required_env(ENV_METADATA_DATASET)?,
            prod_dataset: required_env(ENV_PROD_DATASET)?,
        })
    }

    /// Returns the staging table for a family.
    #[must_use]
    pub fn staging_table(&self, family: Family) -> TableRef {
        TableRef::new(&self.staging_dataset, family.table_name())
    }

    /// Returns the per-load temp table for a family.
    ///
    /// The name is fixed (`{table}_temp`): the temp table is scratch space
    /// overwritten by each load, not shared staging.
    #[must_use]
    pub fn temp_table(&self, family: Family) -> TableRef {
        TableRef::new(
            &self.staging_dataset,
            format!("{}_temp", family.table_name()),
        )
    }

    /// Returns the final table for a family.
    #[must_use]
    pub fn final_table(&self, family: Family) -> TableRef {
        TableRef::new(&self.prod_dataset, family.table_name())
    }

    /// Returns the load-manifest table.
    #[must_use]
    pub fn manifest_table(&self) -> TableRef {
        TableRef::new(&self.metadata_dataset, MANIFEST_TABLE_NAME)
    }

    /// Returns the listing prefix for backfill (`{root_prefix}/`, or empty).
    #[must_use]
    pub fn list_prefix(&self) -> String {
        if self.root_prefix.is_empty() {
            String::new()
        } else {
            format!("{}/", self.root_prefix)
        }
    }
}

fn required_env(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| Error::configuration(format!("missing {key}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LoaderConfig {
        LoaderConfig {
            bucket: "news-bucket".into(),
            root_prefix: "nyt-ingest".into(),
            staging_dataset: "staging".into(),
            metadata_dataset: "metadata".into(),
            prod_dataset: "prod".into(),
        }
    }

    #[test]
    fn test_table_layout() {
        let config = config();

        assert_eq!(
            config.staging_table(Family::Archive).qualified(),
            "staging.archive_articles"
        );
        assert_eq!(
            config.temp_table(Family::Archive).qualified(),
            "staging.archive_articles_temp"
        );
        assert_eq!(
            config.final_table(Family::MostPopular).qualified(),
            "prod.most_popular_articles"
        );
        assert_eq!(config.manifest_table().qualified(), "metadata.load_manifest");
    }

    #[test]
    fn test_list_prefix_trailing_slash() {
        assert_eq!(config().list_prefix(), "nyt-ingest/");

        let mut bare = config();
        bare.root_prefix = String::new();
        assert_eq!(bare.list_prefix(), "");
    }
}
