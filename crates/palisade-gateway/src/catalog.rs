//! Catalog retrieval: upstream source seam, snapshot cache, and fetcher.
//!
//! Catalog reads are **read-through with unconditional refresh**: every call
//! re-fetches from the source and overwrites the cached snapshot, so the
//! cache serves as a durability/audit log of the last fetch rather than a
//! latency-reduction layer. Callers needing cached-only reads must be added
//! as a distinct mode.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::Instrument;

use palisade_core::observability::gateway_span;
use palisade_core::storage::StorageBackend;
use palisade_core::{Error, Result};

/// A catalog resource addressable in the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogResource {
    /// The full list of security frameworks.
    Frameworks,
    /// The controls of one framework.
    Controls(String),
}

impl CatalogResource {
    /// Stable cache key for this resource.
    #[must_use]
    pub fn cache_key(&self) -> String {
        match self {
            Self::Frameworks => "frameworks".to_string(),
            Self::Controls(framework_id) => format!("{framework_id}-controls"),
        }
    }
}

impl std::fmt::Display for CatalogResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.cache_key())
    }
}

/// Pluggable upstream catalog source.
///
/// The placeholder dataset and a future real repository client satisfy the
/// same seam; the fetcher never knows which one it is talking to.
#[async_trait]
pub trait CatalogSource: Send + Sync + 'static {
    /// Obtains the catalog payload for one resource.
    async fn fetch(&self, resource: &CatalogResource) -> Result<Value>;
}

/// Built-in placeholder catalog.
///
/// Returns a fixed, deterministic dataset until the real repository contract
/// is integrated. Controls lookups are identifier-agnostic: any framework id
/// yields the same control set, echoed back under `framework`.
#[derive(Debug, Default, Clone)]
pub struct BuiltinCatalog;

impl BuiltinCatalog {
    /// Creates the placeholder catalog source.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CatalogSource for BuiltinCatalog {
    async fn fetch(&self, resource: &CatalogResource) -> Result<Value> {
        match resource {
            CatalogResource::Frameworks => Ok(json!({
                "frameworks": [
                    {
                        "id": "nist-800-53",
                        "name": "NIST SP 800-53 Security and Privacy Controls",
                        "version": "Rev 5",
                        "description": "Security and privacy controls for federal information systems"
                    },
                    {
                        "id": "nist-csf",
                        "name": "NIST Cybersecurity Framework",
                        "version": "2.0",
                        "description": "Framework for improving cybersecurity posture"
                    },
                    {
                        "id": "nist-800-171",
                        "name": "NIST SP 800-171 Protecting CUI",
                        "version": "Rev 2",
                        "description": "Protecting Controlled Unclassified Information"
                    }
                ]
            })),
            CatalogResource::Controls(framework_id) => Ok(json!({
                "framework": framework_id,
                "controls": [
                    {
                        "id": "AC-2",
                        "name": "Account Management",
                        "family": "Access Control",
                        "description": "Manage information system accounts"
                    },
                    {
                        "id": "SI-3",
                        "name": "Malicious Code Protection",
                        "family": "System and Information Integrity",
                        "description": "Implement malicious code protection"
                    }
                ]
            })),
        }
    }
}

/// A cached, timestamped copy of one catalog resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// When the wrapped payload was fetched.
    pub fetched_at: DateTime<Utc>,
    /// The upstream payload, opaque to the gateway.
    pub data: Value,
}

/// Key-addressed persistence of timestamped catalog snapshots.
///
/// Exactly one snapshot file exists per resource key; a new write overwrites
/// the prior snapshot. No eviction, no TTL — staleness is the scheduler's
/// concern.
#[derive(Clone)]
pub struct CatalogCache {
    store: Arc<dyn StorageBackend>,
}

impl std::fmt::Debug for CatalogCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogCache")
            .field("store", &"<StorageBackend>")
            .finish()
    }
}

impl CatalogCache {
    /// Creates a cache over the given storage backend.
    #[must_use]
    pub fn new(store: Arc<dyn StorageBackend>) -> Self {
        Self { store }
    }

    fn object_key(key: &str) -> String {
        format!("{key}.json")
    }

    /// Durably persists `snapshot` under `key`, overwriting any prior one.
    ///
    /// # Errors
    ///
    /// Returns `Error::Storage` if the write fails; the cache does not retry.
    pub async fn write(&self, key: &str, snapshot: &Snapshot) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(snapshot)?;
        self.store.put(&Self::object_key(key), Bytes::from(bytes)).await
    }

    /// Returns the last-written snapshot for `key`, or `None` when the key
    /// has never been written.
    ///
    /// # Errors
    ///
    /// Returns `Error::Storage` on read failures and `Error::Serialization`
    /// when the stored file is not a valid snapshot.
    pub async fn read(&self, key: &str) -> Result<Option<Snapshot>> {
        match self.store.get(&Self::object_key(key)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }
}

/// Cache-backed catalog fetcher.
#[derive(Clone)]
pub struct CatalogFetcher {
    source: Arc<dyn CatalogSource>,
    cache: CatalogCache,
    fetch_timeout: Duration,
}

impl std::fmt::Debug for CatalogFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogFetcher")
            .field("source", &"<CatalogSource>")
            .field("cache", &self.cache)
            .field("fetch_timeout", &self.fetch_timeout)
            .finish()
    }
}

impl CatalogFetcher {
    /// Creates a fetcher over the given source and cache backend.
    #[must_use]
    pub fn new(
        source: Arc<dyn CatalogSource>,
        store: Arc<dyn StorageBackend>,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            source,
            cache: CatalogCache::new(store),
            fetch_timeout,
        }
    }

    /// Returns the snapshot cache, for staleness checks and tests.
    #[must_use]
    pub fn cache(&self) -> &CatalogCache {
        &self.cache
    }

    /// Fetches the framework list, refreshing the `"frameworks"` snapshot.
    ///
    /// # Errors
    ///
    /// Returns `Error::Fetch` when the upstream fetch fails, times out, or
    /// the snapshot cannot be written through the cache.
    pub async fn fetch_frameworks(&self) -> Result<Value> {
        self.refresh(&CatalogResource::Frameworks).await
    }

    /// Fetches the controls of one framework, refreshing its
    /// `"<id>-controls"` snapshot.
    ///
    /// # Errors
    ///
    /// Returns `Error::Fetch` when the upstream fetch fails, times out, or
    /// the snapshot cannot be written through the cache.
    pub async fn fetch_controls(&self, framework_id: &str) -> Result<Value> {
        self.refresh(&CatalogResource::Controls(framework_id.to_string()))
            .await
    }

    async fn refresh(&self, resource: &CatalogResource) -> Result<Value> {
        let key = resource.cache_key();
        let span = gateway_span("refresh_catalog", &key);
        async {
            let data = tokio::time::timeout(self.fetch_timeout, self.source.fetch(resource))
                .await
                .map_err(|_| {
                    Error::fetch(
                        resource.to_string(),
                        format!("upstream fetch timed out after {:?}", self.fetch_timeout),
                    )
                })?
                .map_err(|err| match err {
                    fetch @ Error::Fetch { .. } => fetch,
                    other => Error::fetch(resource.to_string(), other.to_string()),
                })?;

            let snapshot = Snapshot {
                fetched_at: Utc::now(),
                data,
            };
            self.cache
                .write(&key, &snapshot)
                .await
                .map_err(|err| Error::fetch(resource.to_string(), err.to_string()))?;

            tracing::info!(key = %key, "catalog snapshot refreshed");
            Ok(snapshot.data)
        }
        .instrument(span)
        .await
    }
}
