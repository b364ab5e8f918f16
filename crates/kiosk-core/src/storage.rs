//! Object storage abstraction for normalized snapshot files (GCS, local, memory).
//!
//! The loader reads whole NDJSON objects and lists prefixes; it never mutates
//! the files it loads, so the contract here is intentionally small. Backends:
//!
//! - [`MemoryBackend`]: in-process map, for tests
//! - [`ObjectStoreBackend`]: wraps the `object_store` crate (GCS, local
//!   filesystem, in-memory), for deployments

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::{Error, Result};

/// Metadata about a stored object.
#[derive(Debug, Clone)]
pub struct ObjectMeta {
    /// Object path (key), relative to the backend's bucket or root.
    pub path: String,
    /// Object size in bytes.
    pub size: u64,
    /// Last modification timestamp.
    pub last_modified: Option<DateTime<Utc>>,
}

/// Storage backend trait for object storage.
///
/// All backends (GCS, local, memory) implement this trait. The contract is
/// designed for cloud object storage semantics: whole-object reads, flat
/// key namespace, prefix listing.
#[async_trait]
pub trait StorageBackend: Send + Sync + 'static {
    /// Reads an entire object.
    ///
    /// Returns `Error::NotFound` if the object doesn't exist.
    async fn get(&self, path: &str) -> Result<Bytes>;

    /// Writes an object, replacing any existing contents.
    async fn put(&self, path: &str, data: Bytes) -> Result<()>;

    /// Deletes an object.
    ///
    /// Succeeds even if the object doesn't exist (idempotent).
    async fn delete(&self, path: &str) -> Result<()>;

    /// Lists objects with the given prefix.
    ///
    /// Returns an empty vec if no objects match.
    ///
    /// **Ordering**: results are returned in arbitrary order that may vary
    /// between backends and invocations. Callers requiring deterministic
    /// order should sort the results.
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>>;

    /// Gets object metadata without reading content.
    ///
    /// Returns `None` if the object doesn't exist.
    async fn head(&self, path: &str) -> Result<Option<ObjectMeta>>;
}

// ============================================================================
// MemoryBackend
// ============================================================================

/// In-memory storage backend for testing.
///
/// Thread-safe via `RwLock`. Not suitable for production.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
}

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    last_modified: DateTime<Utc>,
}

impl MemoryBackend {
    /// Creates a new empty memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn get(&self, path: &str) -> Result<Bytes> {
        let objects = self.objects.read().map_err(|_| Error::Internal {
            message: "lock poisoned".into(),
        })?;

        objects
            .get(path)
            .map(|o| o.data.clone())
            .ok_or_else(|| Error::NotFound(format!("object not found: {path}")))
    }

    async fn put(&self, path: &str, data: Bytes) -> Result<()> {
        let mut objects = self.objects.write().map_err(|_| Error::Internal {
            message: "lock poisoned".into(),
        })?;

        objects.insert(
            path.to_string(),
            StoredObject {
                data,
                last_modified: Utc::now(),
            },
        );
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.objects
            .write()
            .map_err(|_| Error::Internal {
                message: "lock poisoned".into(),
            })?
            .remove(path);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>> {
        let objects = self.objects.read().map_err(|_| Error::Internal {
            message: "lock poisoned".into(),
        })?;

        Ok(objects
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(path, obj)| ObjectMeta {
                path: path.clone(),
                size: obj.data.len() as u64,
                last_modified: Some(obj.last_modified),
            })
            .collect())
    }

    async fn head(&self, path: &str) -> Result<Option<ObjectMeta>> {
        let objects = self.objects.read().map_err(|_| Error::Internal {
            message: "lock poisoned".into(),
        })?;

        Ok(objects.get(path).map(|obj| ObjectMeta {
            path: path.to_string(),
            size: obj.data.len() as u64,
            last_modified: Some(obj.last_modified),
        }))
    }
}

// ============================================================================
// ObjectStoreBackend
// ============================================================================

/// Storage backend over the `object_store` crate.
///
/// Supports GCS buckets, local filesystem roots, and an in-memory store.
/// The backend is bound to one bucket (or root) at construction; paths are
/// relative to it.
#[derive(Debug, Clone)]
pub struct ObjectStoreBackend {
    store: Arc<dyn object_store::ObjectStore>,
}

impl ObjectStoreBackend {
    /// Creates a backend over an arbitrary `object_store` implementation.
    #[must_use]
    pub fn new(store: Arc<dyn object_store::ObjectStore>) -> Self {
        Self { store }
    }

    /// Creates a GCS-backed store for the given bucket.
    ///
    /// Credentials are resolved from the environment (service account,
    /// workload identity, or application default credentials).
    ///
    /// # Errors
    ///
    /// Returns an error if the bucket name is invalid or credentials cannot
    /// be configured.
    pub fn gcs(bucket: &str) -> Result<Self> {
        let store = object_store::gcp::GoogleCloudStorageBuilder::from_env()
            .with_bucket_name(bucket)
            .build()
            .map_err(|e| Error::storage_with_source(format!("gcs backend for {bucket}"), e))?;
        Ok(Self::new(Arc::new(store)))
    }

    /// Creates a local-filesystem store rooted at the given directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the root does not exist or is not a directory.
    pub fn local(root: &str) -> Result<Self> {
        let store = object_store::local::LocalFileSystem::new_with_prefix(root)
            .map_err(|e| Error::storage_with_source(format!("local backend at {root}"), e))?;
        Ok(Self::new(Arc::new(store)))
    }

    /// Creates an in-memory `object_store` backend.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(object_store::memory::InMemory::new()))
    }

    /// Creates a backend from a bucket URI.
    ///
    /// Accepted forms:
    /// - `gs://bucket` or a bare bucket name → GCS
    /// - `file:///path/to/root` → local filesystem
    /// - `memory://` → in-memory store
    ///
    /// # Errors
    ///
    /// Returns an error if the URI is malformed or the backend cannot be built.
    pub fn from_bucket(bucket: &str) -> Result<Self> {
        if bucket == "memory://" {
            return Ok(Self::in_memory());
        }
        if let Some(root) = bucket.strip_prefix("file://") {
            return Self::local(root);
        }
        let name = bucket.strip_prefix("gs://").unwrap_or(bucket);
        if name.is_empty() {
            return Err(Error::configuration(format!("invalid bucket: {bucket}")));
        }
        Self::gcs(name)
    }
}

fn store_path(path: &str) -> object_store::path::Path {
    object_store::path::Path::from(path)
}

#[async_trait]
impl StorageBackend for ObjectStoreBackend {
    async fn get(&self, path: &str) -> Result<Bytes> {
        let result = self.store.get(&store_path(path)).await.map_err(|e| match e {
            object_store::Error::NotFound { .. } => {
                Error::NotFound(format!("object not found: {path}"))
            }
            other => Error::storage_with_source(format!("get {path}"), other),
        })?;

        result
            .bytes()
            .await
            .map_err(|e| Error::storage_with_source(format!("read {path}"), e))
    }

    async fn put(&self, path: &str, data: Bytes) -> Result<()> {
        self.store
            .put(&store_path(path), data.into())
            .await
            .map_err(|e| Error::storage_with_source(format!("put {path}"), e))?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        match self.store.delete(&store_path(path)).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(Error::storage_with_source(format!("delete {path}"), e)),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>> {
        let prefix_path = store_path(prefix);
        let metas: Vec<object_store::ObjectMeta> = self
            .store
            .list(Some(&prefix_path))
            .try_collect()
            .await
            .map_err(|e| Error::storage_with_source(format!("list {prefix}"), e))?;

        Ok(metas
            .into_iter()
            .map(|m| ObjectMeta {
                path: m.location.to_string(),
                size: m.size,
                last_modified: Some(m.last_modified),
            })
            .collect())
    }

    async fn head(&self, path: &str) -> Result<Option<ObjectMeta>> {
        match self.store.head(&store_path(path)).await {
            Ok(m) => Ok(Some(ObjectMeta {
                path: m.location.to_string(),
                size: m.size,
                last_modified: Some(m.last_modified),
            })),
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(Error::storage_with_source(format!("head {path}"), e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_backend_roundtrip() {
        let backend = MemoryBackend::new();
        let data = Bytes::from("hello world");

        backend
            .put("test/file.ndjson", data.clone())
            .await
            .expect("put should succeed");

        let retrieved = backend
            .get("test/file.ndjson")
            .await
            .expect("get should succeed");
        assert_eq!(retrieved, data);
    }

    #[tokio::test]
    async fn test_memory_backend_get_missing() {
        let backend = MemoryBackend::new();
        let result = backend.get("nope").await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_memory_backend_delete_is_idempotent() {
        let backend = MemoryBackend::new();
        backend
            .put("del.ndjson", Bytes::from("data"))
            .await
            .unwrap();

        backend.delete("del.ndjson").await.expect("should succeed");
        backend.delete("del.ndjson").await.expect("second delete should succeed");
        assert!(backend.head("del.ndjson").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_backend_list_with_prefix() {
        let backend = MemoryBackend::new();
        backend.put("a/1.ndjson", Bytes::from("a1")).await.unwrap();
        backend.put("a/2.ndjson", Bytes::from("a2")).await.unwrap();
        backend.put("b/1.ndjson", Bytes::from("b1")).await.unwrap();

        let list_a = backend.list("a/").await.expect("should succeed");
        assert_eq!(list_a.len(), 2);

        let list_b = backend.list("b/").await.expect("should succeed");
        assert_eq!(list_b.len(), 1);
    }

    #[tokio::test]
    async fn test_memory_backend_head_has_metadata() {
        let backend = MemoryBackend::new();
        backend.put("meta.ndjson", Bytes::from("data")).await.unwrap();

        let meta = backend
            .head("meta.ndjson")
            .await
            .expect("head should succeed")
            .expect("object should exist");

        assert_eq!(meta.path, "meta.ndjson");
        assert_eq!(meta.size, 4);
        assert!(meta.last_modified.is_some());
    }

    #[tokio::test]
    async fn test_object_store_backend_roundtrip() {
        let backend = ObjectStoreBackend::in_memory();
        let data = Bytes::from(r#"{"id": 1}"#);

        backend
            .put("nyt/archive_slim/2020/05.ndjson", data.clone())
            .await
            .expect("put should succeed");

        let retrieved = backend
            .get("nyt/archive_slim/2020/05.ndjson")
            .await
            .expect("get should succeed");
        assert_eq!(retrieved, data);

        let listed = backend.list("nyt/archive_slim").await.expect("list should succeed");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].path, "nyt/archive_slim/2020/05.ndjson");
    }

    #[tokio::test]
    async fn test_object_store_backend_missing_is_not_found() {
        let backend = ObjectStoreBackend::in_memory();

        let result = backend.get("missing.ndjson").await;
        assert!(matches!(result, Err(Error::NotFound(_))));

        let head = backend.head("missing.ndjson").await.expect("head should succeed");
        assert!(head.is_none());
    }

    #[tokio::test]
    async fn test_object_store_backend_local_filesystem() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = ObjectStoreBackend::local(dir.path().to_str().expect("utf-8 path"))
            .expect("local backend");

        backend
            .put("sub/file.ndjson", Bytes::from("line"))
            .await
            .expect("put should succeed");
        let data = backend.get("sub/file.ndjson").await.expect("get should succeed");
        assert_eq!(data, Bytes::from("line"));
    }

    #[test]
    fn test_from_bucket_rejects_empty() {
        assert!(ObjectStoreBackend::from_bucket("gs://").is_err());
    }
}
