use serde::Deserialize;

use crate::models::{Category, MetricId, TimeWindow};
use crate::query_view::Selection;
use crate::sources::{CpuMetric, DiskMetric, MemoryMetric};

/// Default config path when `CONFIG_FILE` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "sensorhub.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    /// Independent consumers; each gets its own QueryView.
    #[serde(default = "default_views")]
    pub views: Vec<ViewConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            history: HistoryConfig::default(),
            sources: SourcesConfig::default(),
            monitoring: MonitoringConfig::default(),
            views: default_views(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Period of the driver loop.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// A refresh happens only when strictly more than this has passed since the last one.
    /// Kept below the tick so a 1 Hz driver never skips a tick.
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,
    /// Per-source bound; a slower source contributes nothing to that snapshot.
    #[serde(default = "default_source_timeout_ms")]
    pub source_timeout_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            min_interval_ms: default_min_interval_ms(),
            source_timeout_ms: default_source_timeout_ms(),
        }
    }
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_min_interval_ms() -> u64 {
    900
}

fn default_source_timeout_ms() -> u64 {
    2000
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    /// Max readings kept per metric (3 hours at 1 Hz).
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

fn default_capacity() -> usize {
    10_800
}

/// Which sources run and which sub-metrics they report.
#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "default_enabled")]
    pub enabled: Vec<Category>,
    #[serde(default = "default_memory_metrics")]
    pub memory_metrics: Vec<MemoryMetric>,
    #[serde(default = "default_cpu_metrics")]
    pub cpu_metrics: Vec<CpuMetric>,
    #[serde(default = "default_disk_metrics")]
    pub disk_metrics: Vec<DiskMetric>,
    /// Disk metrics describe the volume holding this path.
    #[serde(default = "default_disk_path")]
    pub disk_path: String,
    #[serde(default = "default_hwmon_root")]
    pub hwmon_root: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            memory_metrics: default_memory_metrics(),
            cpu_metrics: default_cpu_metrics(),
            disk_metrics: default_disk_metrics(),
            disk_path: default_disk_path(),
            hwmon_root: default_hwmon_root(),
        }
    }
}

fn default_enabled() -> Vec<Category> {
    Category::ALL.to_vec()
}

fn default_memory_metrics() -> Vec<MemoryMetric> {
    MemoryMetric::ALL.to_vec()
}

fn default_cpu_metrics() -> Vec<CpuMetric> {
    CpuMetric::ALL.to_vec()
}

fn default_disk_metrics() -> Vec<DiskMetric> {
    DiskMetric::ALL.to_vec()
}

fn default_disk_path() -> String {
    "/".into()
}

fn default_hwmon_root() -> String {
    "/sys/class/hwmon".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    /// How often to log scheduler stats (refreshes, series, failures) at INFO level.
    #[serde(default = "default_stats_log_interval_secs")]
    pub stats_log_interval_secs: u64,
    /// How often the demo binary logs each view's summary.
    #[serde(default = "default_dashboard_interval_secs")]
    pub dashboard_interval_secs: u64,
    /// Max snapshots buffered for push subscribers (slow subscribers lag).
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            stats_log_interval_secs: default_stats_log_interval_secs(),
            dashboard_interval_secs: default_dashboard_interval_secs(),
            broadcast_capacity: default_broadcast_capacity(),
        }
    }
}

fn default_stats_log_interval_secs() -> u64 {
    60
}

fn default_dashboard_interval_secs() -> u64 {
    5
}

fn default_broadcast_capacity() -> usize {
    16
}

#[derive(Debug, Clone, Deserialize)]
pub struct ViewConfig {
    pub name: String,
    /// Whole categories to include.
    #[serde(default)]
    pub categories: Vec<Category>,
    /// Individual metrics as `<category>.<name>`.
    #[serde(default)]
    pub metrics: Vec<String>,
    #[serde(default)]
    pub window_secs: TimeWindow,
}

impl ViewConfig {
    pub fn selection(&self) -> anyhow::Result<Selection> {
        let metrics = self
            .metrics
            .iter()
            .map(|m| m.parse::<MetricId>())
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Selection::new()
            .with_categories(self.categories.iter().copied())
            .with_metrics(metrics))
    }
}

fn default_views() -> Vec<ViewConfig> {
    vec![
        ViewConfig {
            name: "thermal".into(),
            categories: vec![Category::Temperature],
            metrics: vec![],
            window_secs: TimeWindow::ONE_MINUTE,
        },
        ViewConfig {
            name: "power".into(),
            categories: vec![Category::Voltage, Category::Current],
            metrics: vec![],
            window_secs: TimeWindow::ONE_MINUTE,
        },
        ViewConfig {
            name: "system".into(),
            categories: vec![],
            metrics: vec![
                "cpu.total".into(),
                "memory.used_percent".into(),
                "disk.used_percent".into(),
            ],
            window_secs: TimeWindow::FIVE_MINUTES,
        },
    ]
}

impl AppConfig {
    /// Loads from `CONFIG_FILE`, or `sensorhub.toml` in the working directory.
    /// A missing default file yields built-in defaults; a missing explicit one is an error.
    pub fn load() -> anyhow::Result<Self> {
        let explicit = std::env::var("CONFIG_FILE").ok();
        let path = explicit.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
        match std::fs::read_to_string(path) {
            Ok(s) => Self::load_from_str(&s),
            Err(e) if explicit.is_none() && e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path, "no config file; using defaults");
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
            Err(e) => Err(anyhow::anyhow!("read config {}: {}", path, e)),
        }
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.scheduler.tick_interval_ms > 0,
            "scheduler.tick_interval_ms must be > 0, got {}",
            self.scheduler.tick_interval_ms
        );
        anyhow::ensure!(
            self.scheduler.source_timeout_ms > 0,
            "scheduler.source_timeout_ms must be > 0, got {}",
            self.scheduler.source_timeout_ms
        );
        anyhow::ensure!(
            self.history.capacity > 0,
            "history.capacity must be > 0, got {}",
            self.history.capacity
        );
        anyhow::ensure!(
            !self.sources.disk_path.is_empty(),
            "sources.disk_path must be non-empty"
        );
        anyhow::ensure!(
            self.monitoring.stats_log_interval_secs > 0,
            "monitoring.stats_log_interval_secs must be > 0, got {}",
            self.monitoring.stats_log_interval_secs
        );
        anyhow::ensure!(
            self.monitoring.dashboard_interval_secs > 0,
            "monitoring.dashboard_interval_secs must be > 0, got {}",
            self.monitoring.dashboard_interval_secs
        );
        anyhow::ensure!(
            self.monitoring.broadcast_capacity > 0,
            "monitoring.broadcast_capacity must be > 0, got {}",
            self.monitoring.broadcast_capacity
        );
        for view in &self.views {
            anyhow::ensure!(!view.name.is_empty(), "views.name must be non-empty");
            anyhow::ensure!(
                view.window_secs.as_millis() > 0,
                "views[{}].window_secs must be > 0",
                view.name
            );
            view.selection()
                .map_err(|e| anyhow::anyhow!("views[{}]: {}", view.name, e))?;
        }
        Ok(())
    }
}
