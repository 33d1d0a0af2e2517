//! Compliance submission ingestion and persistence.
//!
//! Each submission becomes one append-only record file keyed by a
//! gateway-generated identifier. The gateway owns the record from the moment
//! the identifier is assigned; the client keeps only the returned id.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::Instrument;
use uuid::Uuid;

use palisade_core::observability::gateway_span;
use palisade_core::storage::StorageBackend;
use palisade_core::{Error, Result};

/// Caller-supplied submission payload.
///
/// Ingestion is permissive by design: beyond being a JSON object, no field
/// is required. Absent fields are propagated as absent in the stored record.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionRequest {
    /// Client-supplied report timestamp (RFC 3339); defaults to the
    /// ingestion instant when absent or unparseable.
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Report type tag (e.g. `"stig"`).
    #[serde(default)]
    pub report_type: Option<String>,
    /// Free-form system metadata; `hostname` is used for logging when
    /// present.
    #[serde(default)]
    pub system_info: Option<Value>,
    /// Ordered assessment findings, shape opaque to the gateway.
    #[serde(default)]
    pub results: Option<Vec<Value>>,
}

/// One persisted compliance-assessment report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionRecord {
    /// Gateway-generated submission identifier; immutable and unique.
    pub id: Uuid,
    /// Effective report timestamp (client-supplied or ingestion instant).
    pub timestamp: DateTime<Utc>,
    /// Report type tag, if supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_type: Option<String>,
    /// Free-form system metadata, if supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_info: Option<Value>,
    /// Ordered assessment findings, if supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<Value>>,
    /// When the gateway processed the submission.
    pub processed_at: DateTime<Utc>,
}

/// Validates, tags, and durably records inbound submissions.
#[derive(Clone)]
pub struct SubmissionIngestor {
    store: Arc<dyn StorageBackend>,
}

impl std::fmt::Debug for SubmissionIngestor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionIngestor")
            .field("store", &"<StorageBackend>")
            .finish()
    }
}

impl SubmissionIngestor {
    /// Creates an ingestor over the given records store.
    #[must_use]
    pub fn new(store: Arc<dyn StorageBackend>) -> Self {
        Self { store }
    }

    /// Storage key for one submission record.
    #[must_use]
    pub fn record_key(id: Uuid) -> String {
        format!("submission-{id}.json")
    }

    /// Ingests one submission: assigns a fresh identifier, assembles the
    /// record, persists it durably, and returns the identifier.
    ///
    /// Atomic from the caller's perspective: either the record is durably
    /// written and the identifier returned, or `Error::Persistence` is
    /// raised and no identifier escapes.
    ///
    /// # Errors
    ///
    /// Returns `Error::Persistence` when the record cannot be durably
    /// written.
    pub async fn ingest(&self, request: SubmissionRequest) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let span = gateway_span("ingest_submission", &id.to_string());
        self.ingest_as(id, request).instrument(span).await
    }

    async fn ingest_as(&self, id: Uuid, request: SubmissionRequest) -> Result<Uuid> {
        let now = Utc::now();
        let timestamp = effective_timestamp(request.timestamp.as_deref(), now);

        let hostname = request
            .system_info
            .as_ref()
            .and_then(|info| info.get("hostname"))
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        tracing::info!(
            report_type = request.report_type.as_deref().unwrap_or("unspecified"),
            hostname = hostname,
            results = request.results.as_ref().map_or(0, Vec::len),
            "received compliance submission"
        );

        let record = SubmissionRecord {
            id,
            timestamp,
            report_type: request.report_type,
            system_info: request.system_info,
            results: request.results,
            processed_at: now,
        };

        let bytes = serde_json::to_vec_pretty(&record)
            .map_err(|err| Error::persistence(format!("failed to encode record {id}: {err}")))?;
        self.store
            .put(&Self::record_key(id), bytes.into())
            .await
            .map_err(|err| Error::persistence(format!("failed to write record {id}: {err}")))?;

        Ok(id)
    }

    /// Loads one persisted record by identifier.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` when no record exists for the identifier
    /// and `Error::Serialization` when the stored file is not a valid
    /// record.
    pub async fn load(&self, id: Uuid) -> Result<SubmissionRecord> {
        let bytes = self.store.get(&Self::record_key(id)).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Enumerates the identifiers of all persisted records.
    ///
    /// Files in the store that are not submission records are skipped.
    ///
    /// # Errors
    ///
    /// Returns `Error::Storage` when the records store cannot be listed.
    pub async fn list(&self) -> Result<Vec<Uuid>> {
        let entries = self.store.list("submission-").await?;
        Ok(entries
            .into_iter()
            .filter_map(|meta| {
                meta.key
                    .strip_prefix("submission-")
                    .and_then(|rest| rest.strip_suffix(".json"))
                    .and_then(|id| id.parse().ok())
            })
            .collect())
    }
}

/// Resolves the effective report timestamp.
///
/// A missing or unparseable client timestamp falls back to the ingestion
/// instant; the rejected value is logged, never stored.
fn effective_timestamp(raw: Option<&str>, now: DateTime<Utc>) -> DateTime<Utc> {
    match raw {
        None => now,
        Some(raw) => match DateTime::parse_from_rfc3339(raw) {
            Ok(ts) => ts.with_timezone(&Utc),
            Err(err) => {
                tracing::warn!(
                    timestamp = raw,
                    error = %err,
                    "client timestamp is not RFC 3339; defaulting to ingestion time"
                );
                now
            }
        },
    }
}
