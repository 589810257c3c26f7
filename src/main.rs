use anyhow::Result;
use sensorhub::aggregator::SnapshotAggregator;
use sensorhub::config::AppConfig;
use sensorhub::models::Category;
use sensorhub::history_store::HistoryStore;
use sensorhub::query_view::QueryView;
use sensorhub::scheduler::{self, RefreshScheduler, WorkerConfig};
use sensorhub::{format, sources, system_info};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = AppConfig::load()?;

    let store = Arc::new(HistoryStore::new(app_config.history.capacity));
    let aggregator = SnapshotAggregator::new(
        sources::default_sources(&app_config.sources),
        Duration::from_millis(app_config.scheduler.source_timeout_ms),
    );
    let scheduler = Arc::new(RefreshScheduler::new(
        aggregator,
        store.clone(),
        Duration::from_millis(app_config.scheduler.min_interval_ms),
        app_config.monitoring.broadcast_capacity,
    ));

    let views = app_config
        .views
        .iter()
        .map(|v| -> Result<(String, QueryView)> {
            Ok((
                v.name.clone(),
                QueryView::new(store.clone(), v.selection()?, v.window_secs),
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let worker_handle = scheduler::spawn(
        scheduler.clone(),
        WorkerConfig {
            tick_interval_ms: app_config.scheduler.tick_interval_ms,
            stats_log_interval_secs: app_config.monitoring.stats_log_interval_secs,
        },
        shutdown_rx,
    );
    tracing::info!(
        views = views.len(),
        capacity = store.capacity(),
        tick_interval_ms = app_config.scheduler.tick_interval_ms,
        "sensorhub started"
    );
    match system_info::get_system_info().await {
        Ok(info) => tracing::info!(
            os = %info.os_name,
            os_version = %info.os_version,
            kernel = %info.kernel_version,
            host = %info.host_name,
            uptime = %info.formatted_uptime(),
            "host"
        ),
        Err(e) => tracing::warn!(error = %e, operation = "get_system_info", "System info unavailable"),
    }

    let dashboard_interval = Duration::from_secs(app_config.monitoring.dashboard_interval_secs);
    tokio::select! {
        _ = run_dashboard(&scheduler, &views, dashboard_interval) => {}
        _ = shutdown_signal() => {
            tracing::info!("Received shutdown signal");
        }
    }
    let _ = shutdown_tx.send(());
    let _ = worker_handle.await;

    Ok(())
}

/// Logs host health, memory/disk usage and one line per metric of every view, forever.
async fn run_dashboard(scheduler: &RefreshScheduler, views: &[(String, QueryView)], every: Duration) {
    let mut tick = tokio::time::interval(every);
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        tick.tick().await;
        match system_info::get_system_info().await {
            Ok(info) => tracing::info!(
                uptime = %info.formatted_uptime(),
                thermal_state = %info.thermal_state,
                "dashboard host"
            ),
            Err(e) => tracing::warn!(error = %e, operation = "get_system_info", "System info unavailable"),
        }
        if let Some(latest) = scheduler.latest() {
            for category in [Category::Memory, Category::Disk] {
                if let Some(usage) = format::format_snapshot_usage(&latest, category) {
                    tracing::info!(category = %category.label(), usage = %usage, "dashboard usage");
                }
            }
        }
        for (name, view) in views {
            let stats = view.stats();
            if stats.is_empty() {
                tracing::debug!(view = %name, "no readings in window");
                continue;
            }
            for (metric, s) in stats {
                tracing::info!(
                    view = %name,
                    metric = %metric,
                    current = %format::format_value(metric.category, &metric.name, s.current),
                    min = %format::format_value(metric.category, &metric.name, s.min),
                    avg = %format::format_value(metric.category, &metric.name, s.avg),
                    max = %format::format_value(metric.category, &metric.name, s.max),
                    samples = s.count,
                    "dashboard"
                );
            }
        }
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
