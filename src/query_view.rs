// Read-only projections of the history store: one per consumer, each with its
// own selection and time window.

use crate::history_store::HistoryStore;
use crate::history_store::aggregation::{downsample, series_stats};
use crate::models::{Category, MetricId, Reading, SeriesStats, TimeWindow, unix_millis_now};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

/// Metrics a consumer observes: individual ids plus whole categories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    metrics: BTreeSet<MetricId>,
    categories: BTreeSet<Category>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every metric of every category.
    pub fn all() -> Self {
        Self::new().with_categories(Category::ALL)
    }

    pub fn with_categories(mut self, categories: impl IntoIterator<Item = Category>) -> Self {
        self.categories.extend(categories);
        self
    }

    pub fn with_metrics(mut self, metrics: impl IntoIterator<Item = MetricId>) -> Self {
        self.metrics.extend(metrics);
        self
    }

    pub fn contains(&self, id: &MetricId) -> bool {
        self.categories.contains(&id.category) || self.metrics.contains(id)
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty() && self.categories.is_empty()
    }

    pub fn metrics(&self) -> &BTreeSet<MetricId> {
        &self.metrics
    }

    pub fn categories(&self) -> &BTreeSet<Category> {
        &self.categories
    }
}

/// Filtered view over a shared [`HistoryStore`]. Never mutates the store, so
/// any number of views can coexist.
#[derive(Debug, Clone)]
pub struct QueryView {
    store: Arc<HistoryStore>,
    selection: Selection,
    window: TimeWindow,
}

impl QueryView {
    pub fn new(store: Arc<HistoryStore>, selection: Selection, window: TimeWindow) -> Self {
        Self {
            store,
            selection,
            window,
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }

    /// Same selection over a different window.
    pub fn with_window(&self, window: TimeWindow) -> Self {
        Self {
            store: self.store.clone(),
            selection: self.selection.clone(),
            window,
        }
    }

    pub fn filtered(&self) -> Vec<Reading> {
        self.filtered_at(unix_millis_now())
    }

    /// Selected readings inside the window ending at `now_ms`, ordered by
    /// metric (category, then name) and then by timestamp.
    pub fn filtered_at(&self, now_ms: u64) -> Vec<Reading> {
        self.series_at(now_ms).into_values().flatten().collect()
    }

    pub fn series(&self) -> BTreeMap<MetricId, Vec<Reading>> {
        self.series_at(unix_millis_now())
    }

    /// Selected readings grouped per metric; metrics with nothing in the window are left out.
    pub fn series_at(&self, now_ms: u64) -> BTreeMap<MetricId, Vec<Reading>> {
        self.store
            .query_matching_at(|id| self.selection.contains(id), self.window, now_ms)
    }

    pub fn stats(&self) -> BTreeMap<MetricId, SeriesStats> {
        self.stats_at(unix_millis_now())
    }

    pub fn stats_at(&self, now_ms: u64) -> BTreeMap<MetricId, SeriesStats> {
        self.series_at(now_ms)
            .into_iter()
            .filter_map(|(id, readings)| series_stats(&readings).map(|s| (id, s)))
            .collect()
    }

    pub fn downsampled(&self, bucket: Duration) -> BTreeMap<MetricId, Vec<Reading>> {
        self.downsampled_at(bucket, unix_millis_now())
    }

    /// [`series_at`](Self::series_at) averaged into `bucket`-wide slots, for
    /// plotting long windows with a bounded number of points.
    pub fn downsampled_at(&self, bucket: Duration, now_ms: u64) -> BTreeMap<MetricId, Vec<Reading>> {
        let bucket_ms = bucket.as_millis() as u64;
        self.series_at(now_ms)
            .into_iter()
            .map(|(id, readings)| (id, downsample(&readings, bucket_ms)))
            .collect()
    }

    /// Newest retained reading per selected metric, regardless of the window.
    pub fn latest(&self) -> BTreeMap<MetricId, Reading> {
        self.store
            .metrics()
            .into_iter()
            .filter(|id| self.selection.contains(id))
            .filter_map(|id| self.store.latest(&id).map(|r| (id, r)))
            .collect()
    }
}
