// In-memory history: one bounded FIFO series per metric.
// Single writer (the scheduler), any number of readers; a snapshot is applied
// under one write lock so readers see all of it or none of it.

pub mod aggregation;
mod series;

pub use series::HistorySeries;

use crate::error::HistoryError;
use crate::models::{MetricId, Reading, Snapshot, TimeWindow, unix_millis_now};
use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::instrument;

#[derive(Debug, Default)]
struct Inner {
    series: HashMap<MetricId, HistorySeries>,
    last_timestamp: Option<u64>,
    snapshots_appended: u64,
    evicted_total: u64,
}

#[derive(Debug)]
pub struct HistoryStore {
    inner: RwLock<Inner>,
    capacity: usize,
}

impl HistoryStore {
    /// `capacity` is the per-metric bound; 0 is treated as 1.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            capacity: capacity.max(1),
        }
    }

    // Series mutations cannot panic halfway, so a poisoned lock still guards consistent data.
    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds every reading of `snapshot` to its series, evicting the oldest entries
    /// past capacity. Returns the number of readings appended.
    ///
    /// Snapshots must arrive in non-decreasing timestamp order; an older one is
    /// rejected whole.
    #[instrument(skip(self, snapshot), fields(store = "history", operation = "append", readings = snapshot.len()))]
    pub fn append(&self, snapshot: &Snapshot) -> Result<usize, HistoryError> {
        let mut inner = self.write();
        let ts = snapshot.timestamp();
        if let Some(latest) = inner.last_timestamp
            && ts < latest
        {
            return Err(HistoryError::OutOfOrder { latest, got: ts });
        }

        let capacity = self.capacity;
        let mut appended = 0;
        let mut evicted = 0u64;
        for reading in snapshot.readings() {
            let series = inner
                .series
                .entry(reading.metric_id())
                .or_insert_with(|| HistorySeries::new(capacity));
            evicted += series.push(reading.clone()) as u64;
            debug_assert!(
                series.len() <= capacity,
                "series {} holds {} readings, capacity {}",
                reading.metric_id(),
                series.len(),
                capacity
            );
            appended += 1;
        }
        inner.last_timestamp = Some(ts);
        inner.snapshots_appended += 1;
        inner.evicted_total += evicted;
        if evicted > 0 {
            tracing::trace!(evicted, "history eviction");
        }
        Ok(appended)
    }

    /// Readings for `metric` newer than `window` before the current time, oldest first.
    pub fn query(&self, metric: &MetricId, window: TimeWindow) -> Vec<Reading> {
        self.query_at(metric, window, unix_millis_now())
    }

    /// Readings for `metric` with `timestamp > now_ms - window`, oldest first.
    /// Empty for unknown metrics or windows older than retained history.
    pub fn query_at(&self, metric: &MetricId, window: TimeWindow, now_ms: u64) -> Vec<Reading> {
        let inner = self.read();
        inner
            .series
            .get(metric)
            .map(|s| s.since(window.cutoff(now_ms)))
            .unwrap_or_default()
    }

    /// Like [`query_at`](Self::query_at) for every metric matching `filter`, read under one
    /// lock so all series reflect the same set of appended snapshots. Metrics with no
    /// readings in the window are omitted.
    pub fn query_matching_at(
        &self,
        filter: impl Fn(&MetricId) -> bool,
        window: TimeWindow,
        now_ms: u64,
    ) -> BTreeMap<MetricId, Vec<Reading>> {
        let cutoff = window.cutoff(now_ms);
        let inner = self.read();
        inner
            .series
            .iter()
            .filter(|(id, _)| filter(id))
            .map(|(id, s)| (id.clone(), s.since(cutoff)))
            .filter(|(_, readings)| !readings.is_empty())
            .collect()
    }

    /// Known metrics, sorted by category then name.
    pub fn metrics(&self) -> Vec<MetricId> {
        let mut ids: Vec<MetricId> = self.read().series.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn latest(&self, metric: &MetricId) -> Option<Reading> {
        self.read().series.get(metric).and_then(|s| s.latest().cloned())
    }

    /// Number of readings retained for `metric`.
    pub fn len(&self, metric: &MetricId) -> usize {
        self.read().series.get(metric).map_or(0, HistorySeries::len)
    }

    pub fn is_empty(&self) -> bool {
        self.read().series.is_empty()
    }

    pub fn series_count(&self) -> usize {
        self.read().series.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Timestamp of the newest appended snapshot.
    pub fn last_timestamp(&self) -> Option<u64> {
        self.read().last_timestamp
    }

    pub fn snapshots_appended(&self) -> u64 {
        self.read().snapshots_appended
    }

    pub fn evicted_total(&self) -> u64 {
        self.read().evicted_total
    }
}
