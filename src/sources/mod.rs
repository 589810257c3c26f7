// Sensor sources: one per category, each a pure query that fails closed.
// Backends: sysinfo (thermal, memory, cpu, disk) and Linux hwmon (voltage, current).

mod cpu;
mod disk;
mod linux;
mod memory;
mod power;
mod thermal;

pub use cpu::{CpuMetric, CpuSource, CpuTicks};
pub use disk::{DiskMetric, DiskSource};
pub use memory::{MemoryMetric, MemorySource};
pub use power::PowerSource;
pub use thermal::ThermalSource;

use crate::config::SourcesConfig;
use crate::error::SourceError;
use crate::models::{Category, Reading};
use std::sync::Arc;

/// Plugin seam for sensor backends.
///
/// Implementors provide [`collect`](SensorSource::collect); callers use
/// [`fetch`](SensorSource::fetch), which never fails: errors become an
/// empty set and values come back sorted by name.
pub trait SensorSource: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    fn category(&self) -> Category;

    /// Raw `(name, value)` pairs from the backend.
    fn collect(&self) -> Result<Vec<(String, f64)>, SourceError>;

    /// Current readings stamped with `timestamp`, sorted by name, one per
    /// name (first wins), non-finite values dropped. Empty on any error.
    fn fetch(&self, timestamp: u64) -> Vec<Reading> {
        let mut values = match self.collect() {
            Ok(v) => v,
            Err(e @ SourceError::Unavailable { .. }) => {
                tracing::debug!(source = self.name(), error = %e, "sensor source unavailable");
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!(
                    source = self.name(),
                    error = %e,
                    operation = "collect",
                    "sensor source failed"
                );
                return Vec::new();
            }
        };
        values.retain(|(_, v)| v.is_finite());
        values.sort_by(|a, b| a.0.cmp(&b.0));
        values.dedup_by(|later, earlier| later.0 == earlier.0);
        let category = self.category();
        values
            .into_iter()
            .map(|(name, value)| Reading::new(category, name, value, timestamp))
            .collect()
    }
}

/// Source backed by a closure. Handy for embedding other backends and for tests.
pub struct FnSource<F> {
    name: &'static str,
    category: Category,
    f: F,
}

impl<F> FnSource<F>
where
    F: Fn() -> Result<Vec<(String, f64)>, SourceError> + Send + Sync,
{
    pub fn new(name: &'static str, category: Category, f: F) -> Self {
        Self { name, category, f }
    }
}

impl<F> SensorSource for FnSource<F>
where
    F: Fn() -> Result<Vec<(String, f64)>, SourceError> + Send + Sync,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn category(&self) -> Category {
        self.category
    }

    fn collect(&self) -> Result<Vec<(String, f64)>, SourceError> {
        (self.f)()
    }
}

/// Builds the platform sources for every enabled category.
pub fn default_sources(config: &SourcesConfig) -> Vec<Arc<dyn SensorSource>> {
    let mut sources: Vec<Arc<dyn SensorSource>> = Vec::new();
    for category in Category::ALL {
        if !config.enabled.contains(&category) {
            continue;
        }
        let source: Arc<dyn SensorSource> = match category {
            Category::Temperature => Arc::new(ThermalSource::new()),
            Category::Voltage => Arc::new(PowerSource::voltage(&config.hwmon_root)),
            Category::Current => Arc::new(PowerSource::current(&config.hwmon_root)),
            Category::Memory => Arc::new(MemorySource::new(config.memory_metrics.clone())),
            Category::Cpu => Arc::new(CpuSource::new(config.cpu_metrics.clone())),
            Category::Disk => Arc::new(DiskSource::new(
                &config.disk_path,
                config.disk_metrics.clone(),
            )),
        };
        sources.push(source);
    }
    tracing::debug!(sources = sources.len(), "sensor sources registered");
    sources
}
