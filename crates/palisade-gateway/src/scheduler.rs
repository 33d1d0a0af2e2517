//! Unattended catalog refresh on a fixed cadence.
//!
//! The scheduler invokes `fetch_frameworks()` on a recurring interval,
//! decoupled from any request. A failed run is terminal for that run only:
//! logged, never retried before the next tick, never escalated, and the
//! previously cached snapshot stays servable.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::catalog::CatalogFetcher;

/// Recurring trigger for the catalog refresh.
#[derive(Debug, Clone)]
pub struct RefreshScheduler {
    fetcher: CatalogFetcher,
    interval: Duration,
    running: Arc<AtomicBool>,
}

impl RefreshScheduler {
    /// Creates a scheduler invoking `fetcher` every `interval`.
    #[must_use]
    pub fn new(fetcher: CatalogFetcher, interval: Duration) -> Self {
        Self {
            fetcher,
            interval,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Spawns the refresh loop onto the runtime.
    ///
    /// The loop runs until the task is aborted (process shutdown); nothing
    /// inside it can take the process down.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick of a tokio interval fires immediately; consume
            // it so the first refresh happens one full cadence after start.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                self.run_once().await;
            }
        })
    }

    /// Runs one scheduled refresh.
    ///
    /// Single-run discipline: if a previous invocation is still in flight
    /// the tick is skipped and logged. Failures are logged and swallowed.
    pub async fn run_once(&self) {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!("scheduled catalog refresh still in flight; skipping this tick");
            return;
        }

        tracing::info!("running scheduled catalog refresh");
        match self.fetcher.fetch_frameworks().await {
            Ok(_) => tracing::info!("scheduled catalog refresh completed"),
            Err(err) => {
                tracing::error!(error = %err, "scheduled catalog refresh failed");
            }
        }
        self.running.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{BuiltinCatalog, CatalogResource, CatalogSource, Snapshot};
    use async_trait::async_trait;
    use chrono::Utc;
    use palisade_core::storage::{MemoryBackend, StorageBackend};
    use palisade_core::{Error, Result};
    use serde_json::{Value, json};
    use std::sync::atomic::AtomicUsize;

    struct FailingSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CatalogSource for FailingSource {
        async fn fetch(&self, resource: &CatalogResource) -> Result<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::fetch(resource.to_string(), "upstream unreachable"))
        }
    }

    fn scheduler_with(
        source: Arc<dyn CatalogSource>,
        store: Arc<dyn StorageBackend>,
    ) -> RefreshScheduler {
        let fetcher = CatalogFetcher::new(source, store, Duration::from_millis(200));
        RefreshScheduler::new(fetcher, Duration::from_secs(3600))
    }

    #[tokio::test]
    async fn failed_refresh_is_swallowed_and_leaves_prior_snapshot_servable() {
        let store: Arc<dyn StorageBackend> = Arc::new(MemoryBackend::new());
        let seeded = Snapshot {
            fetched_at: Utc::now(),
            data: json!({"frameworks": [{"id": "nist-800-53"}]}),
        };

        let scheduler = scheduler_with(
            Arc::new(FailingSource {
                calls: AtomicUsize::new(0),
            }),
            Arc::clone(&store),
        );
        scheduler
            .fetcher
            .cache()
            .write("frameworks", &seeded)
            .await
            .expect("seed");

        // Must not panic or propagate.
        scheduler.run_once().await;

        let after = scheduler
            .fetcher
            .cache()
            .read("frameworks")
            .await
            .expect("read")
            .expect("snapshot still present");
        assert_eq!(after.data, seeded.data);
    }

    #[tokio::test]
    async fn successful_refresh_overwrites_snapshot() {
        let store: Arc<dyn StorageBackend> = Arc::new(MemoryBackend::new());
        let scheduler = scheduler_with(Arc::new(BuiltinCatalog::new()), Arc::clone(&store));

        scheduler.run_once().await;

        let snapshot = scheduler
            .fetcher
            .cache()
            .read("frameworks")
            .await
            .expect("read")
            .expect("snapshot present");
        assert_eq!(snapshot.data["frameworks"].as_array().map(Vec::len), Some(3));
    }

    #[tokio::test]
    async fn overlapping_tick_is_skipped() {
        let source = Arc::new(FailingSource {
            calls: AtomicUsize::new(0),
        });
        let scheduler = scheduler_with(
            Arc::clone(&source) as Arc<dyn CatalogSource>,
            Arc::new(MemoryBackend::new()),
        );

        // Hold the running flag as an in-flight invocation would.
        scheduler.running.store(true, Ordering::SeqCst);
        scheduler.run_once().await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);

        // Once released, the next tick runs normally.
        scheduler.running.store(false, Ordering::SeqCst);
        scheduler.run_once().await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }
}
