// Refresh scheduling: at most one aggregation in flight, rate limited by a
// minimum interval, results appended to the store and pushed to subscribers.
// `spawn` runs the periodic driver loop.

use crate::aggregator::SnapshotAggregator;
use crate::history_store::HistoryStore;
use crate::models::Snapshot;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::{Mutex, broadcast, oneshot};
use tokio::time::{Duration, Instant, MissedTickBehavior, interval};
use tracing::Instrument;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Refreshing,
}

/// Resets the state flag even if the refresh future is dropped mid-flight.
struct RefreshingGuard<'a>(&'a AtomicBool);

impl Drop for RefreshingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct RefreshScheduler {
    aggregator: SnapshotAggregator,
    store: Arc<HistoryStore>,
    min_interval: Duration,
    /// Held for the whole cycle; guards the instant of the last completed refresh.
    gate: Mutex<Option<Instant>>,
    latest: RwLock<Option<Arc<Snapshot>>>,
    refreshing: AtomicBool,
    refreshes_total: AtomicU64,
    tx: broadcast::Sender<Arc<Snapshot>>,
}

impl RefreshScheduler {
    pub fn new(
        aggregator: SnapshotAggregator,
        store: Arc<HistoryStore>,
        min_interval: Duration,
        broadcast_capacity: usize,
    ) -> Self {
        let (tx, _) = broadcast::channel(broadcast_capacity.max(1));
        Self {
            aggregator,
            store,
            min_interval,
            gate: Mutex::new(None),
            latest: RwLock::new(None),
            refreshing: AtomicBool::new(false),
            refreshes_total: AtomicU64::new(0),
            tx,
        }
    }

    /// Refreshes when strictly more than `min_interval` has passed since the
    /// last refresh, or none happened yet. Otherwise returns the current
    /// snapshot. Callers arriving during a refresh wait for it and share its
    /// result, whatever `min_interval` is.
    pub async fn refresh_if_stale(&self) -> Arc<Snapshot> {
        let seen = self.refreshes_total();
        let mut last_refresh = self.gate.lock().await;
        if let Some(snapshot) = self.completed_since(seen) {
            return snapshot;
        }
        if let Some(at) = *last_refresh
            && at.elapsed() <= self.min_interval
            && let Some(snapshot) = self.latest()
        {
            return snapshot;
        }
        self.run_cycle(&mut last_refresh).await
    }

    /// Refreshes regardless of the interval, unless another refresh completed
    /// while this call was waiting, in which case that result is returned.
    pub async fn refresh_now(&self) -> Arc<Snapshot> {
        let seen = self.refreshes_total();
        let mut last_refresh = self.gate.lock().await;
        if let Some(snapshot) = self.completed_since(seen) {
            return snapshot;
        }
        self.run_cycle(&mut last_refresh).await
    }

    /// The snapshot of a cycle that finished after `seen` was read. Only
    /// meaningful while holding the gate.
    fn completed_since(&self, seen: u64) -> Option<Arc<Snapshot>> {
        if self.refreshes_total() == seen {
            return None;
        }
        self.latest()
    }

    async fn run_cycle(&self, last_refresh: &mut Option<Instant>) -> Arc<Snapshot> {
        self.refreshing.store(true, Ordering::Release);
        let _refreshing = RefreshingGuard(&self.refreshing);

        let snapshot = Arc::new(self.aggregator.refresh().await);
        if let Err(e) = self.store.append(&snapshot) {
            tracing::warn!(error = %e, operation = "append", "snapshot not added to history");
        }
        *last_refresh = Some(Instant::now());
        *self.latest.write().unwrap_or_else(PoisonError::into_inner) = Some(snapshot.clone());
        self.refreshes_total.fetch_add(1, Ordering::Relaxed);

        if self.tx.send(snapshot.clone()).is_err() {
            tracing::trace!(operation = "broadcast_snapshot", "no subscribers");
        }
        snapshot
    }

    pub fn state(&self) -> SchedulerState {
        if self.refreshing.load(Ordering::Acquire) {
            SchedulerState::Refreshing
        } else {
            SchedulerState::Idle
        }
    }

    /// Most recent snapshot, if any refresh has completed.
    pub fn latest(&self) -> Option<Arc<Snapshot>> {
        self.latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Receives every snapshot produced after this call. Slow receivers lag and skip.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<Snapshot>> {
        self.tx.subscribe()
    }

    pub fn refreshes_total(&self) -> u64 {
        self.refreshes_total.load(Ordering::Relaxed)
    }

    pub fn store(&self) -> &Arc<HistoryStore> {
        &self.store
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}

/// Driver loop timing.
pub struct WorkerConfig {
    pub tick_interval_ms: u64,
    /// How often to log scheduler stats (real seconds).
    pub stats_log_interval_secs: u64,
}

/// Spawns the periodic driver: every tick calls [`RefreshScheduler::refresh_if_stale`].
/// Stops when `shutdown_rx` fires, abandoning a refresh still in flight.
pub fn spawn(
    scheduler: Arc<RefreshScheduler>,
    config: WorkerConfig,
    mut shutdown_rx: oneshot::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    let WorkerConfig {
        tick_interval_ms,
        stats_log_interval_secs,
    } = config;

    let worker_span = tracing::debug_span!("scheduler", tick_interval_ms);
    tokio::spawn(
        async move {
            let mut tick = interval(Duration::from_millis(tick_interval_ms));
            tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut stats_log_tick = interval(Duration::from_secs(stats_log_interval_secs));
            stats_log_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick of an interval fires immediately.
            stats_log_tick.tick().await;

            loop {
                tokio::select! {
                    _ = tick.tick() => {
                        tokio::select! {
                            _ = scheduler.refresh_if_stale() => {}
                            _ = &mut shutdown_rx => {
                                tracing::debug!("Scheduler shutting down mid-refresh");
                                break;
                            }
                        }
                    }
                    _ = &mut shutdown_rx => {
                        tracing::debug!("Scheduler shutting down");
                        break;
                    }
                    _ = stats_log_tick.tick() => {
                        let failed: Vec<&str> = scheduler
                            .latest()
                            .map(|s| s.failed().iter().map(|c| c.as_str()).collect())
                            .unwrap_or_default();
                        tracing::info!(
                            refreshes_total = scheduler.refreshes_total(),
                            series = scheduler.store().series_count(),
                            evicted_total = scheduler.store().evicted_total(),
                            failed_categories = ?failed,
                            "scheduler stats"
                        );
                    }
                }
            }
        }
        .instrument(worker_span),
    )
}
