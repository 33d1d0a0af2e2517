//! Keyed durable storage for snapshots and submission records.
//!
//! This module defines the storage contract shared by the cache store and the
//! submission records store. Both are organized as independent keyed units
//! (one file per key), so concurrent operations touch disjoint storage except
//! for same-key overwrites, which are last-write-wins.
//!
//! Two backends are provided:
//! - [`FsBackend`]: one plain JSON-inspectable file per key under a root
//!   directory. Writes go through a temp file and an atomic rename, so a
//!   reader never observes a partial write.
//! - [`MemoryBackend`]: in-memory map for tests.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::error::{Error, Result};

/// Metadata about a stored object.
#[derive(Debug, Clone)]
pub struct ObjectMeta {
    /// Object key.
    pub key: String,
    /// Object size in bytes.
    pub size: u64,
    /// Last modification timestamp, when the backend can report one.
    pub last_modified: Option<DateTime<Utc>>,
}

/// Storage backend trait for keyed durable storage.
///
/// Keys are relative, `/`-separated paths. Backends reject keys that would
/// escape the storage root.
#[async_trait]
pub trait StorageBackend: Send + Sync + 'static {
    /// Reads the entire object stored under `key`.
    ///
    /// Returns `Error::NotFound` if no object exists for the key.
    async fn get(&self, key: &str) -> Result<Bytes>;

    /// Durably writes `data` under `key`, overwriting any prior object.
    ///
    /// The write is atomic: concurrent readers observe either the prior
    /// object or the complete new one, never a partial write.
    async fn put(&self, key: &str, data: Bytes) -> Result<()>;

    /// Gets object metadata without reading content.
    ///
    /// Returns `None` if no object exists for the key.
    async fn head(&self, key: &str) -> Result<Option<ObjectMeta>>;

    /// Lists the objects whose keys start with `prefix`, in ascending key
    /// order. An empty prefix lists every object.
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>>;
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::InvalidInput("storage key must not be empty".to_string()));
    }
    if key.starts_with('/') || key.split('/').any(|part| part.is_empty() || part == "." || part == "..") {
        return Err(Error::InvalidInput(format!(
            "storage key must be a relative path without traversal segments: {key}"
        )));
    }
    Ok(())
}

/// Filesystem storage backend.
///
/// Stores one file per key under a root directory. The root is created on
/// construction; creating an already-existing root is not an error.
#[derive(Debug, Clone)]
pub struct FsBackend {
    root: PathBuf,
}

/// Process-local counter used to derive unique temp file names, so two
/// concurrent writers of the same key never share a temp file.
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

impl FsBackend {
    /// Opens a filesystem backend rooted at `root`, creating the directory
    /// if it does not exist (idempotent).
    ///
    /// # Errors
    ///
    /// Returns `Error::Storage` if the root directory cannot be created.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await.map_err(|e| {
            Error::storage_with_source(format!("failed to create storage root {}", root.display()), e)
        })?;
        Ok(Self { root })
    }

    /// Returns the root directory of this backend.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl StorageBackend for FsBackend {
    async fn get(&self, key: &str) -> Result<Bytes> {
        let path = self.resolve(key)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound(key.to_string()))
            }
            Err(e) => Err(Error::storage_with_source(
                format!("failed to read {}", path.display()),
                e,
            )),
        }
    }

    async fn put(&self, key: &str, data: Bytes) -> Result<()> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                Error::storage_with_source(
                    format!("failed to create parent directory {}", parent.display()),
                    e,
                )
            })?;
        }

        // Write to a sibling temp file, then rename into place. Rename within
        // one directory is atomic, so readers never see a torn object.
        let seq = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let tmp = path.with_extension(format!("tmp.{}.{seq}", std::process::id()));
        tokio::fs::write(&tmp, &data).await.map_err(|e| {
            Error::storage_with_source(format!("failed to write {}", tmp.display()), e)
        })?;
        tokio::fs::rename(&tmp, &path).await.map_err(|e| {
            Error::storage_with_source(
                format!("failed to rename {} into place", tmp.display()),
                e,
            )
        })?;
        Ok(())
    }

    async fn head(&self, key: &str) -> Result<Option<ObjectMeta>> {
        let path = self.resolve(key)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) => {
                let last_modified = meta.modified().ok().map(DateTime::<Utc>::from);
                Ok(Some(ObjectMeta {
                    key: key.to_string(),
                    size: meta.len(),
                    last_modified,
                }))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::storage_with_source(
                format!("failed to stat {}", path.display()),
                e,
            )),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>> {
        let mut entries = Vec::new();
        let mut pending = vec![self.root.clone()];
        while let Some(dir) = pending.pop() {
            let mut reader = match tokio::fs::read_dir(&dir).await {
                Ok(reader) => reader,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(Error::storage_with_source(
                        format!("failed to list {}", dir.display()),
                        e,
                    ));
                }
            };
            while let Some(entry) = reader.next_entry().await.map_err(|e| {
                Error::storage_with_source(format!("failed to list {}", dir.display()), e)
            })? {
                let path = entry.path();
                let meta = entry.metadata().await.map_err(|e| {
                    Error::storage_with_source(format!("failed to stat {}", path.display()), e)
                })?;
                if meta.is_dir() {
                    pending.push(path);
                    continue;
                }
                let Ok(rel) = path.strip_prefix(&self.root) else {
                    continue;
                };
                let key = rel
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                // In-flight temp files are not objects.
                if key.contains(".tmp.") || !key.starts_with(prefix) {
                    continue;
                }
                let last_modified = meta.modified().ok().map(DateTime::<Utc>::from);
                entries.push(ObjectMeta {
                    key,
                    size: meta.len(),
                    last_modified,
                });
            }
        }
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }
}

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
    async fn get(&self, key: &str) -> Result<Bytes> {
        validate_key(key)?;
        let objects = self.objects.read().map_err(|_| Error::Internal {
            message: "lock poisoned".into(),
        })?;
        objects
            .get(key)
            .map(|o| o.data.clone())
            .ok_or_else(|| Error::NotFound(key.to_string()))
    }

    async fn put(&self, key: &str, data: Bytes) -> Result<()> {
        validate_key(key)?;
        let mut objects = self.objects.write().map_err(|_| Error::Internal {
            message: "lock poisoned".into(),
        })?;
        objects.insert(
            key.to_string(),
            StoredObject {
                data,
                last_modified: Utc::now(),
            },
        );
        Ok(())
    }

    async fn head(&self, key: &str) -> Result<Option<ObjectMeta>> {
        validate_key(key)?;
        let objects = self.objects.read().map_err(|_| Error::Internal {
            message: "lock poisoned".into(),
        })?;
        Ok(objects.get(key).map(|obj| ObjectMeta {
            key: key.to_string(),
            size: obj.data.len() as u64,
            last_modified: Some(obj.last_modified),
        }))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>> {
        let objects = self.objects.read().map_err(|_| Error::Internal {
            message: "lock poisoned".into(),
        })?;
        let mut entries: Vec<ObjectMeta> = objects
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, obj)| ObjectMeta {
                key: key.clone(),
                size: obj.data.len() as u64,
                last_modified: Some(obj.last_modified),
            })
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_backend_roundtrip() {
        let backend = MemoryBackend::new();
        let data = Bytes::from("hello world");

        backend
            .put("cache/frameworks.json", data.clone())
            .await
            .expect("put should succeed");

        let retrieved = backend
            .get("cache/frameworks.json")
            .await
            .expect("get should succeed");
        assert_eq!(retrieved, data);
    }

    #[tokio::test]
    async fn memory_backend_miss_is_not_found() {
        let backend = MemoryBackend::new();
        let err = backend.get("missing.json").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn memory_backend_overwrite_is_last_write_wins() {
        let backend = MemoryBackend::new();
        backend.put("k.json", Bytes::from("v1")).await.unwrap();
        backend.put("k.json", Bytes::from("v2")).await.unwrap();
        assert_eq!(backend.get("k.json").await.unwrap(), Bytes::from("v2"));
    }

    #[tokio::test]
    async fn keys_with_traversal_segments_are_rejected() {
        let backend = MemoryBackend::new();
        for key in ["", "/abs.json", "a/../b.json", "a//b.json", "./a.json"] {
            let err = backend.put(key, Bytes::from("x")).await.unwrap_err();
            assert!(
                matches!(err, Error::InvalidInput(_)),
                "key {key:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn memory_backend_list_filters_by_prefix_in_key_order() {
        let backend = MemoryBackend::new();
        backend
            .put("submission-b.json", Bytes::from("{}"))
            .await
            .unwrap();
        backend
            .put("submission-a.json", Bytes::from("{}"))
            .await
            .unwrap();
        backend.put("frameworks.json", Bytes::from("{}")).await.unwrap();

        let keys: Vec<String> = backend
            .list("submission-")
            .await
            .expect("list")
            .into_iter()
            .map(|meta| meta.key)
            .collect();
        assert_eq!(keys, vec!["submission-a.json", "submission-b.json"]);

        let all = backend.list("").await.expect("list");
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn fs_backend_roundtrip_and_head() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = FsBackend::open(dir.path()).await.expect("open");

        let start = Utc::now();
        backend
            .put("frameworks.json", Bytes::from("{\"a\":1}"))
            .await
            .expect("put should succeed");

        let data = backend.get("frameworks.json").await.expect("get");
        assert_eq!(data, Bytes::from("{\"a\":1}"));

        let meta = backend
            .head("frameworks.json")
            .await
            .expect("head")
            .expect("object should exist");
        assert_eq!(meta.size, 7);
        if let Some(modified) = meta.last_modified {
            // Filesystem timestamps can be coarse; allow a second of slack.
            assert!(modified >= start - chrono::Duration::seconds(1));
        }
    }

    #[tokio::test]
    async fn fs_backend_open_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        FsBackend::open(dir.path()).await.expect("first open");
        FsBackend::open(dir.path()).await.expect("second open");
    }

    #[tokio::test]
    async fn fs_backend_creates_parent_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = FsBackend::open(dir.path()).await.expect("open");
        backend
            .put("nested/deeper/record.json", Bytes::from("{}"))
            .await
            .expect("put should create parents");
        assert!(backend.head("nested/deeper/record.json").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn fs_backend_list_walks_nested_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = FsBackend::open(dir.path()).await.expect("open");
        backend
            .put("cache/frameworks.json", Bytes::from("{}"))
            .await
            .unwrap();
        backend
            .put("cache/nist-800-53-controls.json", Bytes::from("{}"))
            .await
            .unwrap();
        backend
            .put("records/submission-a.json", Bytes::from("{}"))
            .await
            .unwrap();

        let keys: Vec<String> = backend
            .list("cache/")
            .await
            .expect("list")
            .into_iter()
            .map(|meta| meta.key)
            .collect();
        assert_eq!(
            keys,
            vec!["cache/frameworks.json", "cache/nist-800-53-controls.json"]
        );
        assert_eq!(backend.list("").await.expect("list").len(), 3);
    }

    #[tokio::test]
    async fn fs_backend_miss_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = FsBackend::open(dir.path()).await.expect("open");
        let err = backend.get("absent.json").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(backend.head("absent.json").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn fs_backend_concurrent_same_key_writes_leave_one_complete_object() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = Arc::new(FsBackend::open(dir.path()).await.expect("open"));

        let a = {
            let backend = Arc::clone(&backend);
            tokio::spawn(async move {
                backend.put("k.json", Bytes::from(vec![b'a'; 4096])).await
            })
        };
        let b = {
            let backend = Arc::clone(&backend);
            tokio::spawn(async move {
                backend.put("k.json", Bytes::from(vec![b'b'; 4096])).await
            })
        };
        a.await.expect("join").expect("put a");
        b.await.expect("join").expect("put b");

        let data = backend.get("k.json").await.expect("get");
        assert_eq!(data.len(), 4096);
        let first = data[0];
        assert!(data.iter().all(|byte| *byte == first), "object must not interleave");
    }
}
