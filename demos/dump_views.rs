// Run a few refresh cycles against the local machine and print every configured view as JSON.
//
// Usage: cargo run --example dump_views -- [CYCLES]
//   CYCLES  default: 3 (one per second)
//   CONFIG_FILE  optional config path, as for the binary

use sensorhub::aggregator::SnapshotAggregator;
use sensorhub::config::AppConfig;
use sensorhub::history_store::HistoryStore;
use sensorhub::query_view::QueryView;
use sensorhub::scheduler::RefreshScheduler;
use sensorhub::{sources, system_info};
use std::collections::BTreeMap;
use std::env;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    let cycles: u32 = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(3);

    let config = AppConfig::load()?;
    let store = Arc::new(HistoryStore::new(config.history.capacity));
    let scheduler = RefreshScheduler::new(
        SnapshotAggregator::new(
            sources::default_sources(&config.sources),
            Duration::from_millis(config.scheduler.source_timeout_ms),
        ),
        store.clone(),
        Duration::from_millis(config.scheduler.min_interval_ms),
        config.monitoring.broadcast_capacity,
    );

    for i in 0..cycles {
        if i > 0 {
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        scheduler.refresh_now().await;
    }

    let mut out = BTreeMap::new();
    for view in &config.views {
        let query = QueryView::new(store.clone(), view.selection()?, view.window_secs);
        let stats: BTreeMap<String, _> = query
            .stats()
            .into_iter()
            .map(|(id, s)| (id.to_string(), s))
            .collect();
        let downsampled: BTreeMap<String, _> = query
            .downsampled(Duration::from_secs(10))
            .into_iter()
            .map(|(id, r)| (id.to_string(), r))
            .collect();
        out.insert(
            view.name.clone(),
            serde_json::json!({
                "readings": query.filtered(),
                "stats": stats,
                "downsampled": downsampled,
            }),
        );
    }
    if let Some(latest) = scheduler.latest() {
        out.insert("latest".into(), serde_json::to_value(latest.as_ref())?);
    }
    out.insert(
        "system".into(),
        serde_json::to_value(system_info::get_system_info().await?)?,
    );

    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
