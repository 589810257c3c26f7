// CPU load from /proc/stat tick deltas, falling back to sysinfo where procfs is absent.

use super::SensorSource;
use super::linux::{parse_proc_stat, read_trimmed};
use crate::error::SourceError;
use crate::models::Category;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;
use sysinfo::System;

const PROC_STAT: &str = "/proc/stat";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CpuMetric {
    Total,
    User,
    System,
    Idle,
    Nice,
    ActiveProcessors,
    TotalProcessors,
}

impl CpuMetric {
    pub const ALL: [CpuMetric; 7] = [
        CpuMetric::Total,
        CpuMetric::User,
        CpuMetric::System,
        CpuMetric::Idle,
        CpuMetric::Nice,
        CpuMetric::ActiveProcessors,
        CpuMetric::TotalProcessors,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CpuMetric::Total => "total",
            CpuMetric::User => "user",
            CpuMetric::System => "system",
            CpuMetric::Idle => "idle",
            CpuMetric::Nice => "nice",
            CpuMetric::ActiveProcessors => "active_processors",
            CpuMetric::TotalProcessors => "total_processors",
        }
    }
}

/// Cumulative jiffies; irq/softirq fold into `system`, iowait into `idle`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTicks {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub other: u64,
}

impl CpuTicks {
    pub fn total(&self) -> u64 {
        self.user
            .saturating_add(self.nice)
            .saturating_add(self.system)
            .saturating_add(self.idle)
            .saturating_add(self.other)
    }
}

/// Percentages between two tick samples: (total, user, system, idle, nice).
/// All zero when no ticks elapsed or the counters went backwards.
pub fn tick_percentages(prev: &CpuTicks, cur: &CpuTicks) -> (f64, f64, f64, f64, f64) {
    let total = cur.total().saturating_sub(prev.total());
    if total == 0 {
        return (0.0, 0.0, 0.0, 0.0, 0.0);
    }
    let pct = |now: u64, before: u64| now.saturating_sub(before) as f64 / total as f64 * 100.0;
    let idle = pct(cur.idle, prev.idle);
    (
        (100.0 - idle).clamp(0.0, 100.0),
        pct(cur.user, prev.user),
        pct(cur.system, prev.system),
        idle,
        pct(cur.nice, prev.nice),
    )
}

struct CpuState {
    sys: System,
    last_ticks: Option<CpuTicks>,
}

pub struct CpuSource {
    metrics: Vec<CpuMetric>,
    proc_stat: PathBuf,
    state: Mutex<CpuState>,
}

impl CpuSource {
    pub fn new(metrics: Vec<CpuMetric>) -> Self {
        Self::with_proc_stat(metrics, PROC_STAT)
    }

    pub fn with_proc_stat(metrics: Vec<CpuMetric>, proc_stat: impl Into<PathBuf>) -> Self {
        let mut sys = System::new();
        sys.refresh_cpu_all();
        Self {
            metrics,
            proc_stat: proc_stat.into(),
            state: Mutex::new(CpuState {
                sys,
                last_ticks: None,
            }),
        }
    }
}

impl SensorSource for CpuSource {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn category(&self) -> Category {
        Category::Cpu
    }

    fn collect(&self) -> Result<Vec<(String, f64)>, SourceError> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| SourceError::unavailable("cpu", format!("state lock poisoned: {e}")))?;

        let ticks = read_trimmed(&self.proc_stat)
            .ok()
            .and_then(|content| parse_proc_stat(&content));

        // First sample has nothing to diff against and reports zeros.
        let breakdown = ticks.map(|cur| {
            let pct = state
                .last_ticks
                .map(|prev| tick_percentages(&prev, &cur))
                .unwrap_or_default();
            state.last_ticks = Some(cur);
            pct
        });

        state.sys.refresh_cpu_all();
        let total_processors = state.sys.cpus().len();
        let fallback_total = (state.sys.global_cpu_usage() as f64).clamp(0.0, 100.0);
        let active_processors = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(total_processors);

        let mut out = Vec::with_capacity(self.metrics.len());
        for metric in &self.metrics {
            let value = match (metric, breakdown) {
                (CpuMetric::Total, Some((total, ..))) => total,
                (CpuMetric::Total, None) => fallback_total,
                (CpuMetric::User, Some((_, user, ..))) => user,
                (CpuMetric::System, Some((_, _, system, ..))) => system,
                (CpuMetric::Idle, Some((_, _, _, idle, _))) => idle,
                (CpuMetric::Nice, Some((.., nice))) => nice,
                (CpuMetric::ActiveProcessors, _) => active_processors as f64,
                (CpuMetric::TotalProcessors, _) => total_processors as f64,
                // Tick breakdown needs procfs.
                (_, None) => continue,
            };
            out.push((metric.name().to_string(), value));
        }

        if out.is_empty() && !self.metrics.is_empty() {
            return Err(SourceError::unavailable("cpu", "no cpu statistics"));
        }
        Ok(out)
    }
}
