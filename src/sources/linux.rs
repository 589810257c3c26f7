// Linux-specific helpers: /proc/stat ticks, /proc/meminfo fields and hwmon sysfs channels.
// Paths are parameters so tests can point them at a temp directory.

use super::CpuTicks;
use crate::error::SourceError;
use std::path::Path;

/// Reads a sysfs/procfs file and returns its trimmed content.
pub(super) fn read_trimmed(path: &Path) -> Result<String, SourceError> {
    std::fs::read_to_string(path)
        .map(|s| s.trim().to_string())
        .map_err(|error| SourceError::Io {
            path: path.display().to_string(),
            error,
        })
}

/// Aggregate "cpu" line of /proc/stat:
/// `cpu user nice system idle iowait irq softirq steal ...`
pub(super) fn parse_proc_stat(content: &str) -> Option<CpuTicks> {
    let line = content
        .lines()
        .find(|l| l.split_whitespace().next() == Some("cpu"))?;
    let fields: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .map(|s| s.parse().ok())
        .collect::<Option<_>>()?;
    if fields.len() < 4 {
        return None;
    }
    let field = |i: usize| fields.get(i).copied().unwrap_or(0);
    Some(CpuTicks {
        user: field(0),
        nice: field(1),
        system: field(2).saturating_add(field(5)).saturating_add(field(6)),
        idle: field(3).saturating_add(field(4)),
        other: field(7),
    })
}

/// A `/proc/meminfo` field in bytes, e.g. `Active:  123456 kB`.
pub(super) fn parse_meminfo_field(content: &str, key: &str) -> Option<u64> {
    let line = content.lines().find(|l| {
        l.split_once(':')
            .is_some_and(|(name, _)| name.trim() == key)
    })?;
    let mut parts = line.split_once(':')?.1.split_whitespace();
    let value: u64 = parts.next()?.parse().ok()?;
    match parts.next() {
        Some("kB") => Some(value.saturating_mul(1024)),
        None => Some(value),
        Some(_) => None,
    }
}

/// Reads every `<prefix><n>_input` channel under each `hwmon*` directory of
/// `root`, scaled by 1/1000 (millivolts → volts, milliamps → amperes).
/// Names come from `<prefix><n>_label`, else `<chip>/<prefix><n>`.
pub(super) fn read_hwmon_channels(
    root: &Path,
    prefix: &str,
) -> Result<Vec<(String, f64)>, SourceError> {
    let entries = std::fs::read_dir(root).map_err(|error| SourceError::Io {
        path: root.display().to_string(),
        error,
    })?;

    let mut out = Vec::new();
    for chip_dir in entries.filter_map(|e| e.ok()).map(|e| e.path()) {
        let Some(dir_name) = chip_dir.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !dir_name.starts_with("hwmon") {
            continue;
        }
        let chip = read_trimmed(&chip_dir.join("name")).unwrap_or_else(|_| dir_name.to_string());
        let Ok(files) = std::fs::read_dir(&chip_dir) else {
            continue;
        };
        for file in files.filter_map(|e| e.ok()) {
            let file_name = file.file_name();
            let Some(channel) = file_name
                .to_str()
                .and_then(|n| n.strip_suffix("_input"))
                .filter(|c| is_channel(c, prefix))
            else {
                continue;
            };
            let raw = match read_trimmed(&file.path()) {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::debug!(error = %e, "hwmon channel unreadable");
                    continue;
                }
            };
            let Ok(milli) = raw.parse::<i64>() else {
                let e = SourceError::Parse {
                    path: file.path().display().to_string(),
                    content: raw,
                };
                tracing::debug!(error = %e, "hwmon channel skipped");
                continue;
            };
            let name = read_trimmed(&chip_dir.join(format!("{channel}_label")))
                .ok()
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| format!("{chip}/{channel}"));
            out.push((name, milli as f64 / 1000.0));
        }
    }
    Ok(out)
}

/// `in0`, `curr12`; rejects `intrusion0` and friends.
fn is_channel(stem: &str, prefix: &str) -> bool {
    stem.strip_prefix(prefix)
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}
