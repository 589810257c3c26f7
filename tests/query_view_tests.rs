// QueryView tests: selection filtering, ordering, independent windows

mod common;

use common::{metric, snapshot};
use sensorhub::history_store::HistoryStore;
use sensorhub::models::{Category, TimeWindow};
use sensorhub::query_view::{QueryView, Selection};
use std::sync::Arc;

/// Readings every 10 s from t=10 s to t=600 s for two temperatures, one voltage and cpu.total.
fn populated_store() -> Arc<HistoryStore> {
    let store = Arc::new(HistoryStore::new(1_000));
    for i in 1..=60u64 {
        let ts = i * 10_000;
        store
            .append(&snapshot(
                ts,
                &[
                    (Category::Temperature, "GPU", 60.0 + i as f64),
                    (Category::Temperature, "CPU", 40.0 + i as f64),
                    (Category::Voltage, "VCORE", 1.2),
                    (Category::Cpu, "total", i as f64),
                ],
            ))
            .unwrap();
    }
    store
}

const NOW: u64 = 600_000;

#[test]
fn filtered_orders_by_metric_then_time() {
    let view = QueryView::new(
        populated_store(),
        Selection::new().with_categories([Category::Temperature]),
        TimeWindow::from_secs(30),
    );
    let readings = view.filtered_at(NOW);
    let keys: Vec<(&str, u64)> = readings
        .iter()
        .map(|r| (r.name.as_str(), r.timestamp))
        .collect();
    assert_eq!(
        keys,
        vec![
            ("CPU", 580_000),
            ("CPU", 590_000),
            ("CPU", 600_000),
            ("GPU", 580_000),
            ("GPU", 590_000),
            ("GPU", 600_000),
        ]
    );
}

#[test]
fn selection_combines_metrics_and_categories() {
    let selection = Selection::new()
        .with_categories([Category::Voltage])
        .with_metrics([metric(Category::Cpu, "total")]);
    assert!(selection.contains(&metric(Category::Voltage, "anything")));
    assert!(selection.contains(&metric(Category::Cpu, "total")));
    assert!(!selection.contains(&metric(Category::Cpu, "user")));
    assert!(!selection.contains(&metric(Category::Temperature, "CPU")));

    let view = QueryView::new(populated_store(), selection, TimeWindow::ONE_MINUTE);
    let series = view.series_at(NOW);
    let ids: Vec<String> = series.keys().map(|id| id.to_string()).collect();
    assert_eq!(ids, vec!["voltage.VCORE", "cpu.total"]);
    assert!(series.values().all(|r| r.len() == 6));
}

#[test]
fn views_with_different_windows_are_independent() {
    let store = populated_store();
    let selection = Selection::new().with_metrics([metric(Category::Temperature, "CPU")]);
    let short = QueryView::new(store.clone(), selection.clone(), TimeWindow::ONE_MINUTE);
    let long = QueryView::new(store.clone(), selection, TimeWindow::FIVE_MINUTES);

    assert_eq!(short.filtered_at(NOW).len(), 6);
    assert_eq!(long.filtered_at(NOW).len(), 30);
    // Querying through one view leaves the other and the store untouched.
    assert_eq!(short.filtered_at(NOW).len(), 6);
    assert_eq!(store.len(&metric(Category::Temperature, "CPU")), 60);

    let rewindowed = short.with_window(TimeWindow::FIFTEEN_MINUTES);
    assert_eq!(rewindowed.filtered_at(NOW).len(), 60);
    assert_eq!(short.window(), TimeWindow::ONE_MINUTE);
}

#[test]
fn stats_summarize_each_selected_metric() {
    let view = QueryView::new(
        populated_store(),
        Selection::new().with_metrics([metric(Category::Cpu, "total")]),
        TimeWindow::from_secs(30),
    );
    let stats = view.stats_at(NOW);
    let s = stats.get(&metric(Category::Cpu, "total")).unwrap();
    assert_eq!(s.count, 3);
    assert_eq!(s.min, 58.0);
    assert_eq!(s.max, 60.0);
    assert!((s.avg - 59.0).abs() < 1e-9);
    assert_eq!(s.current, 60.0);
}

#[test]
fn latest_ignores_window() {
    let view = QueryView::new(
        populated_store(),
        Selection::new().with_categories([Category::Temperature]),
        TimeWindow::ONE_MINUTE,
    );
    // Far past the newest reading: window is empty, latest still answers.
    assert!(view.filtered_at(NOW * 10).is_empty());
    let latest = view.latest();
    assert_eq!(latest.len(), 2);
    assert_eq!(latest[&metric(Category::Temperature, "GPU")].value, 120.0);
}

#[test]
fn empty_selection_sees_nothing() {
    let view = QueryView::new(populated_store(), Selection::new(), TimeWindow::THREE_HOURS);
    assert!(view.selection().is_empty());
    assert!(view.filtered_at(NOW).is_empty());
    assert!(view.latest().is_empty());

    let all = QueryView::new(populated_store(), Selection::all(), TimeWindow::THREE_HOURS);
    assert_eq!(all.series_at(NOW).len(), 4);
}

#[test]
fn downsampled_averages_each_metric_into_buckets() {
    let view = QueryView::new(
        populated_store(),
        Selection::new().with_metrics([metric(Category::Cpu, "total")]),
        TimeWindow::ONE_MINUTE,
    );
    // Window keeps 550..=600 s (values 55..=60); 30 s buckets start at 540, 570 and 600 s.
    let buckets = view.downsampled_at(std::time::Duration::from_secs(30), NOW);
    let points: Vec<(u64, f64)> = buckets[&metric(Category::Cpu, "total")]
        .iter()
        .map(|r| (r.timestamp, r.value))
        .collect();
    assert_eq!(points, vec![(540_000, 55.5), (570_000, 58.0), (600_000, 60.0)]);
}
