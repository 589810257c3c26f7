// Lookback window for history queries

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeWindow(Duration);

impl TimeWindow {
    pub const ONE_MINUTE: TimeWindow = TimeWindow(Duration::from_secs(60));
    pub const FIVE_MINUTES: TimeWindow = TimeWindow(Duration::from_secs(5 * 60));
    pub const FIFTEEN_MINUTES: TimeWindow = TimeWindow(Duration::from_secs(15 * 60));
    /// Full default retention (10 800 samples at 1 Hz).
    pub const THREE_HOURS: TimeWindow = TimeWindow(Duration::from_secs(3 * 60 * 60));

    pub const fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }

    pub const fn from_duration(d: Duration) -> Self {
        Self(d)
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }

    pub fn as_millis(&self) -> u64 {
        self.0.as_millis() as u64
    }

    /// Exclusive lower bound for `now_ms`: readings must be strictly newer.
    /// Saturates at 0, so a window longer than the epoch keeps everything but t=0.
    pub fn cutoff(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.as_millis())
    }

    pub fn contains(&self, timestamp: u64, now_ms: u64) -> bool {
        timestamp > self.cutoff(now_ms)
    }
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self::ONE_MINUTE
    }
}

impl From<Duration> for TimeWindow {
    fn from(d: Duration) -> Self {
        Self(d)
    }
}

// Config and JSON carry windows as whole seconds.
impl Serialize for TimeWindow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0.as_secs())
    }
}

impl<'de> Deserialize<'de> for TimeWindow {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u64::deserialize(deserializer).map(TimeWindow::from_secs)
    }
}
