// Memory usage via sysinfo, plus active/inactive pages from /proc/meminfo

use super::SensorSource;
use super::linux::{parse_meminfo_field, read_trimmed};
use crate::error::SourceError;
use crate::models::Category;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;
use sysinfo::System;

const PROC_MEMINFO: &str = "/proc/meminfo";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryMetric {
    Total,
    Free,
    Available,
    Used,
    UsedPercent,
    /// Recently used pages (`Active` in /proc/meminfo).
    Active,
    /// Reclaimable pages (`Inactive` in /proc/meminfo).
    Inactive,
    SwapTotal,
    SwapUsed,
}

impl MemoryMetric {
    pub const ALL: [MemoryMetric; 9] = [
        MemoryMetric::Total,
        MemoryMetric::Free,
        MemoryMetric::Available,
        MemoryMetric::Used,
        MemoryMetric::UsedPercent,
        MemoryMetric::Active,
        MemoryMetric::Inactive,
        MemoryMetric::SwapTotal,
        MemoryMetric::SwapUsed,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MemoryMetric::Total => "total",
            MemoryMetric::Free => "free",
            MemoryMetric::Available => "available",
            MemoryMetric::Used => "used",
            MemoryMetric::UsedPercent => "used_percent",
            MemoryMetric::Active => "active",
            MemoryMetric::Inactive => "inactive",
            MemoryMetric::SwapTotal => "swap_total",
            MemoryMetric::SwapUsed => "swap_used",
        }
    }
}

pub struct MemorySource {
    metrics: Vec<MemoryMetric>,
    meminfo: PathBuf,
    sys: Mutex<System>,
}

impl MemorySource {
    pub fn new(metrics: Vec<MemoryMetric>) -> Self {
        Self::with_meminfo(metrics, PROC_MEMINFO)
    }

    pub fn with_meminfo(metrics: Vec<MemoryMetric>, meminfo: impl Into<PathBuf>) -> Self {
        Self {
            metrics,
            meminfo: meminfo.into(),
            sys: Mutex::new(System::new()),
        }
    }

    fn needs_meminfo(&self) -> bool {
        self.metrics
            .iter()
            .any(|m| matches!(m, MemoryMetric::Active | MemoryMetric::Inactive))
    }
}

impl SensorSource for MemorySource {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn category(&self) -> Category {
        Category::Memory
    }

    fn collect(&self) -> Result<Vec<(String, f64)>, SourceError> {
        let mut sys = self
            .sys
            .lock()
            .map_err(|e| SourceError::unavailable("memory", format!("sysinfo lock poisoned: {e}")))?;
        sys.refresh_memory();

        let total = sys.total_memory();
        if total == 0 {
            return Err(SourceError::unavailable("memory", "total memory reported as 0"));
        }
        let available = sys.available_memory();
        let used = total.saturating_sub(available);

        // Page lists are optional; without procfs those metrics are just left out.
        let meminfo = if self.needs_meminfo() {
            read_trimmed(&self.meminfo)
                .inspect_err(|e| tracing::debug!(error = %e, "meminfo unreadable"))
                .ok()
        } else {
            None
        };
        let page_list = |key: &str| {
            meminfo
                .as_deref()
                .and_then(|content| parse_meminfo_field(content, key))
        };

        let mut out = Vec::with_capacity(self.metrics.len());
        for metric in &self.metrics {
            let value = match metric {
                MemoryMetric::Total => total as f64,
                MemoryMetric::Free => sys.free_memory() as f64,
                MemoryMetric::Available => available as f64,
                MemoryMetric::Used => used as f64,
                MemoryMetric::UsedPercent => used as f64 / total as f64 * 100.0,
                MemoryMetric::Active => match page_list("Active") {
                    Some(bytes) => bytes as f64,
                    None => continue,
                },
                MemoryMetric::Inactive => match page_list("Inactive") {
                    Some(bytes) => bytes as f64,
                    None => continue,
                },
                MemoryMetric::SwapTotal => sys.total_swap() as f64,
                MemoryMetric::SwapUsed => sys.used_swap() as f64,
            };
            out.push((metric.name().to_string(), value));
        }
        if out.is_empty() && !self.metrics.is_empty() {
            return Err(SourceError::unavailable("memory", "no memory statistics"));
        }
        Ok(out)
    }
}
