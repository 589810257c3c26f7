// Disk space of the volume holding a configured path, via sysinfo

use super::SensorSource;
use crate::error::SourceError;
use crate::models::Category;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use sysinfo::Disks;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiskMetric {
    Total,
    Used,
    Free,
    UsedPercent,
}

impl DiskMetric {
    pub const ALL: [DiskMetric; 4] = [
        DiskMetric::Total,
        DiskMetric::Used,
        DiskMetric::Free,
        DiskMetric::UsedPercent,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DiskMetric::Total => "total",
            DiskMetric::Used => "used",
            DiskMetric::Free => "free",
            DiskMetric::UsedPercent => "used_percent",
        }
    }
}

pub struct DiskSource {
    path: PathBuf,
    metrics: Vec<DiskMetric>,
    disks: Mutex<Disks>,
}

impl DiskSource {
    pub fn new(path: impl Into<PathBuf>, metrics: Vec<DiskMetric>) -> Self {
        Self {
            path: path.into(),
            metrics,
            disks: Mutex::new(Disks::new_with_refreshed_list()),
        }
    }
}

impl SensorSource for DiskSource {
    fn name(&self) -> &'static str {
        "disk"
    }

    fn category(&self) -> Category {
        Category::Disk
    }

    fn collect(&self) -> Result<Vec<(String, f64)>, SourceError> {
        let mut disks = self
            .disks
            .lock()
            .map_err(|e| SourceError::unavailable("disk", format!("sysinfo disks lock poisoned: {e}")))?;
        disks.refresh(false);

        let list = disks.list();
        let disk = best_mount(&self.path, list.iter().map(|d| d.mount_point()))
            .and_then(|i| list.get(i))
            .ok_or_else(|| {
                SourceError::unavailable(
                    "disk",
                    format!("no mounted volume holds {}", self.path.display()),
                )
            })?;

        let total = disk.total_space();
        let free = disk.available_space();
        let used = total.saturating_sub(free);
        let used_percent = if total > 0 {
            (used as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        Ok(self
            .metrics
            .iter()
            .map(|m| {
                let value = match m {
                    DiskMetric::Total => total as f64,
                    DiskMetric::Used => used as f64,
                    DiskMetric::Free => free as f64,
                    DiskMetric::UsedPercent => used_percent,
                };
                (m.name().to_string(), value)
            })
            .collect())
    }
}

/// Index of the mount point holding `path`. The most specific one wins
/// ("/home" over "/"); `None` when no mount point is a prefix, e.g. for relative paths.
fn best_mount<'a>(path: &Path, mount_points: impl IntoIterator<Item = &'a Path>) -> Option<usize> {
    mount_points
        .into_iter()
        .enumerate()
        .filter(|(_, mount)| path.starts_with(mount))
        .max_by_key(|(_, mount)| mount.as_os_str().len())
        .map(|(i, _)| i)
}
