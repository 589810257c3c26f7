// Host identity and health: OS, kernel, uptime and a coarse thermal state.
// Queried on demand, outside the snapshot history.

use crate::format::format_duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use sysinfo::{Components, System};
use tracing::instrument;

/// Used when a component reports no critical threshold.
const DEFAULT_CRITICAL_CELSIUS: f64 = 100.0;

/// Coarse thermal pressure, from the hottest component relative to its critical threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThermalState {
    Nominal,
    Fair,
    Serious,
    Critical,
    Unknown,
}

impl ThermalState {
    /// `(temperature, critical threshold)` pairs in °C. Below 80% of critical is
    /// nominal, then fair, serious from 90%, critical at or above the threshold.
    pub fn classify(readings: impl IntoIterator<Item = (f64, Option<f64>)>) -> Self {
        let worst = readings
            .into_iter()
            .filter(|(t, _)| t.is_finite())
            .map(|(t, critical)| {
                let critical = critical
                    .filter(|c| c.is_finite() && *c > 0.0)
                    .unwrap_or(DEFAULT_CRITICAL_CELSIUS);
                t / critical
            })
            .fold(None, |acc: Option<f64>, r| Some(acc.map_or(r, |a| a.max(r))));
        match worst {
            None => ThermalState::Unknown,
            Some(r) if r >= 1.0 => ThermalState::Critical,
            Some(r) if r >= 0.9 => ThermalState::Serious,
            Some(r) if r >= 0.8 => ThermalState::Fair,
            Some(_) => ThermalState::Nominal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ThermalState::Nominal => "nominal",
            ThermalState::Fair => "fair",
            ThermalState::Serious => "serious",
            ThermalState::Critical => "critical",
            ThermalState::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ThermalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfo {
    pub os_name: String,
    pub os_version: String,
    pub kernel_version: String,
    pub host_name: String,
    pub uptime_secs: u64,
    pub thermal_state: ThermalState,
}

impl SystemInfo {
    pub fn uptime(&self) -> Duration {
        Duration::from_secs(self.uptime_secs)
    }

    /// `2d 5h 30m 15s`
    pub fn formatted_uptime(&self) -> String {
        format_duration(self.uptime())
    }
}

/// Reads host identity, uptime and thermal state on the blocking pool.
#[instrument(fields(operation = "get_system_info"))]
pub async fn get_system_info() -> anyhow::Result<SystemInfo> {
    tokio::task::spawn_blocking(|| {
        let components = Components::new_with_refreshed_list();
        let thermal_state = ThermalState::classify(components.list().iter().filter_map(|c| {
            c.temperature()
                .map(|t| (t as f64, c.critical().map(|v| v as f64)))
        }));
        SystemInfo {
            os_name: System::name().unwrap_or_else(|| std::env::consts::OS.into()),
            os_version: System::os_version().unwrap_or_default(),
            kernel_version: System::kernel_version().unwrap_or_default(),
            host_name: System::host_name().unwrap_or_default(),
            uptime_secs: System::uptime(),
            thermal_state,
        }
    })
    .await
    .map_err(|e| anyhow::anyhow!("sysinfo task join: {}", e))
}
