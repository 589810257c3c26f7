// HistoryStore tests: bounded FIFO series, window queries, ordering, atomic appends

mod common;

use common::{metric, snapshot};
use rand::{Rng, SeedableRng, rngs::StdRng};
use sensorhub::error::HistoryError;
use sensorhub::history_store::HistoryStore;
use sensorhub::models::{Category, TimeWindow};
use std::sync::Arc;

#[test]
fn fourth_append_evicts_oldest_at_capacity_three() {
    let store = HistoryStore::new(3);
    for (i, v) in [40.0, 41.0, 42.0, 43.0].into_iter().enumerate() {
        let ts = 1_000 * (i as u64 + 1);
        store
            .append(&snapshot(ts, &[(Category::Temperature, "CPU", v)]))
            .unwrap();
    }
    let cpu = metric(Category::Temperature, "CPU");
    assert_eq!(store.len(&cpu), 3);
    assert_eq!(store.evicted_total(), 1);

    let readings = store.query_at(&cpu, TimeWindow::THREE_HOURS, 5_000);
    let timestamps: Vec<u64> = readings.iter().map(|r| r.timestamp).collect();
    assert_eq!(timestamps, vec![2_000, 3_000, 4_000]);
    assert_eq!(readings.last().unwrap().value, 43.0);
}

#[test]
fn append_returns_reading_count_and_tracks_latest() {
    let store = HistoryStore::new(10);
    let n = store
        .append(&snapshot(
            1_000,
            &[
                (Category::Temperature, "CPU", 50.0),
                (Category::Memory, "used", 1024.0),
            ],
        ))
        .unwrap();
    assert_eq!(n, 2);
    assert_eq!(store.series_count(), 2);
    assert_eq!(store.last_timestamp(), Some(1_000));
    assert_eq!(store.snapshots_appended(), 1);
    assert_eq!(
        store.latest(&metric(Category::Memory, "used")).unwrap().value,
        1024.0
    );
}

#[test]
fn older_snapshot_is_rejected_and_store_unchanged() {
    let store = HistoryStore::new(10);
    store
        .append(&snapshot(2_000, &[(Category::Cpu, "total", 10.0)]))
        .unwrap();
    let err = store
        .append(&snapshot(1_000, &[(Category::Cpu, "total", 99.0)]))
        .unwrap_err();
    assert!(matches!(
        err,
        HistoryError::OutOfOrder {
            latest: 2_000,
            got: 1_000
        }
    ));
    assert_eq!(store.len(&metric(Category::Cpu, "total")), 1);
    assert_eq!(store.last_timestamp(), Some(2_000));

    // Equal timestamps are allowed.
    store
        .append(&snapshot(2_000, &[(Category::Cpu, "total", 11.0)]))
        .unwrap();
    assert_eq!(store.len(&metric(Category::Cpu, "total")), 2);
}

#[test]
fn window_lower_bound_is_exclusive() {
    let store = HistoryStore::new(10);
    for ts in [4_999, 5_000, 5_001, 10_000] {
        store
            .append(&snapshot(ts, &[(Category::Voltage, "VCC", 3.3)]))
            .unwrap();
    }
    let id = metric(Category::Voltage, "VCC");
    let readings = store.query_at(&id, TimeWindow::from_secs(5), 10_000);
    let timestamps: Vec<u64> = readings.iter().map(|r| r.timestamp).collect();
    assert_eq!(timestamps, vec![5_001, 10_000]);
}

#[test]
fn query_is_repeatable_for_fixed_now() {
    let store = HistoryStore::new(10);
    for ts in [1_000, 2_000, 3_000] {
        store
            .append(&snapshot(ts, &[(Category::Disk, "used_percent", 40.0)]))
            .unwrap();
    }
    let id = metric(Category::Disk, "used_percent");
    let first = store.query_at(&id, TimeWindow::ONE_MINUTE, 3_500);
    let second = store.query_at(&id, TimeWindow::ONE_MINUTE, 3_500);
    assert_eq!(first, second);
    assert_eq!(store.len(&id), 3);
}

#[test]
fn unknown_metric_and_stale_window_are_empty() {
    let store = HistoryStore::new(10);
    store
        .append(&snapshot(1_000, &[(Category::Cpu, "total", 5.0)]))
        .unwrap();
    assert!(
        store
            .query_at(&metric(Category::Cpu, "nice"), TimeWindow::ONE_MINUTE, 1_000)
            .is_empty()
    );
    // Everything retained is older than the window.
    assert!(
        store
            .query_at(&metric(Category::Cpu, "total"), TimeWindow::ONE_MINUTE, 1_000_000)
            .is_empty()
    );
}

#[test]
fn metrics_are_sorted_by_category_then_name() {
    let store = HistoryStore::new(10);
    store
        .append(&snapshot(
            1_000,
            &[
                (Category::Disk, "free", 1.0),
                (Category::Temperature, "b", 1.0),
                (Category::Temperature, "a", 1.0),
            ],
        ))
        .unwrap();
    assert_eq!(
        store.metrics(),
        vec![
            metric(Category::Temperature, "a"),
            metric(Category::Temperature, "b"),
            metric(Category::Disk, "free"),
        ]
    );
}

#[test]
fn zero_capacity_keeps_one_reading() {
    let store = HistoryStore::new(0);
    assert_eq!(store.capacity(), 1);
    for ts in [1_000, 2_000] {
        store
            .append(&snapshot(ts, &[(Category::Cpu, "total", 1.0)]))
            .unwrap();
    }
    assert_eq!(store.len(&metric(Category::Cpu, "total")), 1);
}

#[test]
fn readers_never_observe_half_applied_snapshots() {
    let store = Arc::new(HistoryStore::new(50));
    let a = metric(Category::Temperature, "a");
    let b = metric(Category::Temperature, "b");

    std::thread::scope(|scope| {
        let writer = store.clone();
        scope.spawn(move || {
            for ts in 1..=500u64 {
                writer
                    .append(&snapshot(
                        ts,
                        &[
                            (Category::Temperature, "a", ts as f64),
                            (Category::Temperature, "b", ts as f64),
                        ],
                    ))
                    .unwrap();
            }
        });
        for _ in 0..4 {
            let reader = store.clone();
            let (a, b) = (a.clone(), b.clone());
            scope.spawn(move || {
                for _ in 0..500 {
                    let series = reader.query_matching_at(
                        |id| id.category == Category::Temperature,
                        TimeWindow::THREE_HOURS,
                        1_000,
                    );
                    let len_a = series.get(&a).map_or(0, Vec::len);
                    let len_b = series.get(&b).map_or(0, Vec::len);
                    assert_eq!(len_a, len_b);
                    assert!(len_a <= 50);
                    let last_a = series.get(&a).and_then(|r| r.last()).map(|r| r.timestamp);
                    let last_b = series.get(&b).and_then(|r| r.last()).map(|r| r.timestamp);
                    assert_eq!(last_a, last_b);
                }
            });
        }
    });

    assert_eq!(store.len(&a), 50);
    assert_eq!(store.snapshots_appended(), 500);
}

#[test]
fn cpu_total_keeps_last_three_of_four() {
    let store = HistoryStore::new(3);
    for (ts, v) in [(1, 10.0), (2, 20.0), (3, 30.0), (4, 40.0)] {
        store
            .append(&snapshot(ts, &[(Category::Cpu, "total", v)]))
            .unwrap();
    }
    let points: Vec<(u64, f64)> = store
        .query_at(&metric(Category::Cpu, "total"), TimeWindow::ONE_MINUTE, 4)
        .iter()
        .map(|r| (r.timestamp, r.value))
        .collect();
    assert_eq!(points, vec![(2, 20.0), (3, 30.0), (4, 40.0)]);
}

#[test]
fn randomized_bursts_stay_bounded_and_fifo() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for capacity in [1usize, 2, 7, 32] {
        let store = HistoryStore::new(capacity);
        let mut ts = 0u64;
        for _ in 0..20 {
            let burst = rng.random_range(0..=capacity * 3);
            for _ in 0..burst {
                ts += rng.random_range(1..=3u64);
                store
                    .append(&snapshot(ts, &[(Category::Memory, "used", ts as f64)]))
                    .unwrap();
                assert!(store.len(&metric(Category::Memory, "used")) <= capacity);
            }
        }
        let retained = store.query_at(
            &metric(Category::Memory, "used"),
            TimeWindow::THREE_HOURS,
            ts,
        );
        let expected = (store.snapshots_appended() as usize).min(capacity);
        assert_eq!(retained.len(), expected);
        assert!(retained.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        if let Some(last) = retained.last() {
            assert_eq!(last.timestamp, ts);
        }
    }
}
