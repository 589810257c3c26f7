// Fan-out/fan-in over all sensor sources into one timestamped snapshot.
// Each source runs on the blocking pool under a timeout; failures only drop that category.

use crate::error::SourceError;
use crate::models::{Category, Reading, Snapshot, unix_millis_now};
use crate::sources::SensorSource;
use futures_util::future::join_all;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::instrument;

struct Registered {
    source: Arc<dyn SensorSource>,
    /// Set while a fetch runs on the blocking pool, including one abandoned by a timeout.
    busy: Arc<AtomicBool>,
}

/// Clears the busy flag when the blocking fetch ends, panics included.
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct SnapshotAggregator {
    sources: Vec<Registered>,
    source_timeout: Duration,
}

impl SnapshotAggregator {
    pub fn new(sources: Vec<Arc<dyn SensorSource>>, source_timeout: Duration) -> Self {
        Self {
            sources: sources
                .into_iter()
                .map(|source| Registered {
                    source,
                    busy: Arc::new(AtomicBool::new(false)),
                })
                .collect(),
            source_timeout,
        }
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn source_timeout(&self) -> Duration {
        self.source_timeout
    }

    /// Runs every source concurrently and merges the results under the
    /// timestamp taken when the call started. Never fails: a source that
    /// errors, panics, times out or is still stuck in a previous cycle just
    /// contributes nothing and is listed in [`Snapshot::failed`].
    #[instrument(skip(self), fields(operation = "refresh", sources = self.sources.len()))]
    pub async fn refresh(&self) -> Snapshot {
        let timestamp = unix_millis_now();
        let outcomes = join_all(
            self.sources
                .iter()
                .map(|registered| self.fetch_one(registered, timestamp)),
        )
        .await;

        let mut readings = Vec::new();
        let mut failed = BTreeSet::new();
        for (category, outcome) in outcomes {
            match outcome {
                Some(r) if !r.is_empty() => readings.extend(r),
                _ => {
                    failed.insert(category);
                }
            }
        }

        let snapshot = Snapshot::from_readings(timestamp, readings).with_failed(failed);
        tracing::debug!(
            timestamp,
            readings = snapshot.len(),
            failed = snapshot.failed().len(),
            "snapshot assembled"
        );
        snapshot
    }

    async fn fetch_one(
        &self,
        registered: &Registered,
        timestamp: u64,
    ) -> (Category, Option<Vec<Reading>>) {
        let category = registered.source.category();
        let name = registered.source.name();

        if registered.busy.swap(true, Ordering::AcqRel) {
            tracing::debug!(source = name, "previous fetch still running; skipped");
            return (category, None);
        }
        let source = registered.source.clone();
        let guard = BusyGuard(registered.busy.clone());
        let task = tokio::task::spawn_blocking(move || {
            let _guard = guard;
            source.fetch(timestamp)
        });

        match tokio::time::timeout(self.source_timeout, task).await {
            Ok(Ok(readings)) => (category, Some(readings)),
            Ok(Err(e)) => {
                tracing::warn!(
                    source = name,
                    error = %e,
                    operation = "fetch",
                    "sensor task join failed"
                );
                (category, None)
            }
            Err(_) => {
                let e = SourceError::Timeout {
                    source_name: name,
                    after: self.source_timeout,
                };
                tracing::warn!(source = name, error = %e, operation = "fetch", "sensor source timed out");
                (category, None)
            }
        }
    }
}
