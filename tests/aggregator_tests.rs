// SnapshotAggregator tests: fan-out, failed categories, per-source timeout

mod common;

use common::{fixed_source, metric, slow_source, unavailable_source};
use sensorhub::aggregator::SnapshotAggregator;
use sensorhub::models::Category;
use sensorhub::sources::{FnSource, SensorSource};
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::time::{Duration, Instant};

#[tokio::test]
async fn empty_voltage_source_only_drops_its_category() {
    let aggregator = SnapshotAggregator::new(
        vec![
            fixed_source("thermal", Category::Temperature, &[("CPU Die", 52.5)]),
            unavailable_source("voltage", Category::Voltage),
            fixed_source("memory", Category::Memory, &[("used_percent", 40.0)]),
        ],
        Duration::from_secs(2),
    );
    let snapshot = aggregator.refresh().await;

    assert_eq!(snapshot.len(), 2);
    assert_eq!(
        snapshot
            .get(&metric(Category::Temperature, "CPU Die"))
            .unwrap()
            .value,
        52.5
    );
    assert_eq!(snapshot.category(Category::Voltage).count(), 0);
    assert!(snapshot.failed().contains(&Category::Voltage));
    assert!(!snapshot.failed().contains(&Category::Temperature));
}

#[tokio::test]
async fn every_reading_carries_the_snapshot_timestamp() {
    let aggregator = SnapshotAggregator::new(
        vec![
            fixed_source("thermal", Category::Temperature, &[("a", 1.0), ("b", 2.0)]),
            fixed_source("cpu", Category::Cpu, &[("total", 3.0)]),
        ],
        Duration::from_secs(2),
    );
    let snapshot = aggregator.refresh().await;
    assert!(snapshot.timestamp() > 0);
    assert_eq!(snapshot.len(), 3);
    assert!(snapshot.readings().all(|r| r.timestamp == snapshot.timestamp()));
    assert!(snapshot.failed().is_empty());
}

#[tokio::test]
async fn hung_source_times_out_without_blocking_others() {
    let calls = Arc::new(AtomicUsize::new(0));
    let aggregator = SnapshotAggregator::new(
        vec![
            slow_source("disk", Category::Disk, Duration::from_millis(800), calls),
            fixed_source("cpu", Category::Cpu, &[("total", 12.0)]),
        ],
        Duration::from_millis(50),
    );

    let started = Instant::now();
    let snapshot = aggregator.refresh().await;
    assert!(started.elapsed() < Duration::from_millis(600));
    assert!(snapshot.failed().contains(&Category::Disk));
    assert_eq!(snapshot.get(&metric(Category::Cpu, "total")).unwrap().value, 12.0);
}

#[tokio::test]
async fn still_running_source_is_skipped_next_cycle() {
    let calls = Arc::new(AtomicUsize::new(0));
    let aggregator = SnapshotAggregator::new(
        vec![slow_source(
            "disk",
            Category::Disk,
            Duration::from_millis(500),
            calls.clone(),
        )],
        Duration::from_millis(30),
    );
    let first = aggregator.refresh().await;
    let second = aggregator.refresh().await;
    assert!(first.failed().contains(&Category::Disk));
    assert!(second.failed().contains(&Category::Disk));
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn panicking_source_is_recorded_as_failed() {
    let panicking: Arc<dyn SensorSource> = Arc::new(FnSource::new(
        "current",
        Category::Current,
        || -> Result<Vec<(String, f64)>, sensorhub::error::SourceError> {
            panic!("sensor driver bug")
        },
    ));
    let aggregator = SnapshotAggregator::new(
        vec![
            panicking,
            fixed_source("thermal", Category::Temperature, &[("CPU", 40.0)]),
        ],
        Duration::from_secs(2),
    );
    let snapshot = aggregator.refresh().await;
    assert!(snapshot.failed().contains(&Category::Current));
    assert_eq!(snapshot.len(), 1);
}

#[tokio::test]
async fn no_sources_gives_empty_snapshot() {
    let aggregator = SnapshotAggregator::new(vec![], Duration::from_secs(1));
    let snapshot = aggregator.refresh().await;
    assert!(snapshot.is_empty());
    assert!(snapshot.failed().is_empty());
    assert_eq!(aggregator.source_count(), 0);
}
