// Summary of one series over a window (min / avg / max / current)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    /// Value of the newest reading.
    pub current: f64,
    /// Timestamp of the newest reading.
    pub last_timestamp: u64,
}
