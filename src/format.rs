// Human-readable rendering of reading values for logs and dashboards.

use crate::models::{Category, MetricId, Reading, Snapshot};
use std::time::Duration;

const BYTE_UNITS: [&str; 6] = ["bytes", "KB", "MB", "GB", "TB", "PB"];

/// Binary-scaled size: `512 bytes`, `1.5 KB`, `16.0 GB`.
pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{} bytes", bytes);
    }
    let mut value = bytes as f64;
    let mut idx = 0usize;
    while value >= 1024.0 && idx < BYTE_UNITS.len() - 1 {
        value /= 1024.0;
        idx += 1;
    }
    format!("{:.1} {}", value, BYTE_UNITS[idx])
}

pub fn format_temperature(celsius: f64) -> String {
    format!("{:.1} °C", celsius)
}

pub fn format_voltage(volts: f64) -> String {
    format!("{:.3} V", volts)
}

pub fn format_current(amperes: f64) -> String {
    format!("{:.3} A", amperes)
}

pub fn format_percentage(percent: f64) -> String {
    format!("{:.1}%", percent)
}

/// `45.5% (7.3 GB of 16.0 GB)`. Percentage is 0 when `total` is 0.
pub fn format_usage(used: u64, total: u64) -> String {
    let percent = if total == 0 {
        0.0
    } else {
        used as f64 / total as f64 * 100.0
    };
    format!(
        "{} ({} of {})",
        format_percentage(percent),
        format_bytes(used),
        format_bytes(total)
    )
}

/// `2d 5h 30m 15s`; zero components are left out, `0s` for an empty duration.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let parts = [
        (secs / 86_400, "d"),
        ((secs % 86_400) / 3600, "h"),
        ((secs % 3600) / 60, "m"),
        (secs % 60, "s"),
    ];
    let out: Vec<String> = parts
        .iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, unit)| format!("{}{}", n, unit))
        .collect();
    if out.is_empty() {
        "0s".into()
    } else {
        out.join(" ")
    }
}

/// Usage line for a category that reports `used` and `total` bytes (memory, disk).
/// `None` when either reading is missing from the snapshot.
pub fn format_snapshot_usage(snapshot: &Snapshot, category: Category) -> Option<String> {
    let value = |name: &str| {
        snapshot
            .get(&MetricId::new(category, name))
            .map(|r| r.value.max(0.0) as u64)
    };
    Some(format_usage(value("used")?, value("total")?))
}

/// Formats a reading's value with the unit its category and name imply.
pub fn format_reading(reading: &Reading) -> String {
    format_value(reading.category, &reading.name, reading.value)
}

pub fn format_value(category: Category, name: &str, value: f64) -> String {
    match category {
        Category::Temperature => format_temperature(value),
        Category::Voltage => format_voltage(value),
        Category::Current => format_current(value),
        Category::Cpu if name.ends_with("_processors") => format!("{}", value.round() as i64),
        Category::Cpu => format_percentage(value),
        Category::Memory | Category::Disk if name.ends_with("_percent") => {
            format_percentage(value)
        }
        Category::Memory | Category::Disk => format_bytes(value.max(0.0) as u64),
    }
}
