// One aggregation cycle: readings from every source under a single timestamp

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};

use super::{Category, MetricId, Reading};

/// Readings keyed by metric identity, iterated by category then name.
/// Every reading carries the snapshot's timestamp.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    timestamp: u64,
    #[serde(
        serialize_with = "readings_as_seq",
        deserialize_with = "readings_from_seq"
    )]
    readings: BTreeMap<MetricId, Reading>,
    /// Categories whose source failed, timed out or reported nothing this cycle.
    failed: BTreeSet<Category>,
}

impl Snapshot {
    /// Builds a snapshot, restamping every reading with `timestamp`.
    /// On duplicate metric ids the first reading wins.
    pub fn from_readings(timestamp: u64, readings: impl IntoIterator<Item = Reading>) -> Self {
        let mut map = BTreeMap::new();
        for mut r in readings {
            r.timestamp = timestamp;
            map.entry(r.metric_id()).or_insert(r);
        }
        Self {
            timestamp,
            readings: map,
            failed: BTreeSet::new(),
        }
    }

    pub fn with_failed(mut self, failed: impl IntoIterator<Item = Category>) -> Self {
        self.failed.extend(failed);
        self
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn get(&self, id: &MetricId) -> Option<&Reading> {
        self.readings.get(id)
    }

    pub fn readings(&self) -> impl Iterator<Item = &Reading> {
        self.readings.values()
    }

    pub fn category(&self, category: Category) -> impl Iterator<Item = &Reading> {
        self.readings
            .values()
            .filter(move |r| r.category == category)
    }

    pub fn failed(&self) -> &BTreeSet<Category> {
        &self.failed
    }
}

// JSON maps need string keys; readings travel as a list and are re-keyed on load.
fn readings_as_seq<S: Serializer>(
    readings: &BTreeMap<MetricId, Reading>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(readings.values())
}

fn readings_from_seq<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<MetricId, Reading>, D::Error> {
    let list = Vec::<Reading>::deserialize(deserializer)?;
    Ok(list.into_iter().map(|r| (r.metric_id(), r)).collect())
}

/// Milliseconds since the UNIX epoch; 0 (with a warning) if the clock is before it.
pub fn unix_millis_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_else(|e| {
            tracing::warn!(
                error = %e,
                operation = "get_timestamp",
                "system time error"
            );
            0
        })
}
