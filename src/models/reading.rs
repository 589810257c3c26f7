// Reading, sensor category and metric identity

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sensor category. Declaration order is the iteration order everywhere
/// (snapshots, store listings, views).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Temperature,
    Voltage,
    Current,
    Memory,
    Cpu,
    Disk,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Temperature,
        Category::Voltage,
        Category::Current,
        Category::Memory,
        Category::Cpu,
        Category::Disk,
    ];

    /// Lowercase key used in metric ids and config.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Temperature => "temperature",
            Category::Voltage => "voltage",
            Category::Current => "current",
            Category::Memory => "memory",
            Category::Cpu => "cpu",
            Category::Disk => "disk",
        }
    }

    /// Human-readable section title.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Temperature => "Temperature",
            Category::Voltage => "Voltage",
            Category::Current => "Current",
            Category::Memory => "Memory",
            Category::Cpu => "CPU",
            Category::Disk => "Disk",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| anyhow::anyhow!("unknown sensor category: {}", s))
    }
}

/// Identity of one time series: (category, name). Orders by category, then name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricId {
    pub category: Category,
    pub name: String,
}

impl MetricId {
    pub fn new(category: Category, name: impl Into<String>) -> Self {
        Self {
            category,
            name: name.into(),
        }
    }
}

/// `cpu.total`, `temperature.CPU Die`
impl fmt::Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.category, self.name)
    }
}

impl FromStr for MetricId {
    type Err = anyhow::Error;

    /// Splits on the first '.', so sensor names may themselves contain dots.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (category, name) = s
            .split_once('.')
            .ok_or_else(|| anyhow::anyhow!("metric id must be <category>.<name>, got {:?}", s))?;
        anyhow::ensure!(!name.is_empty(), "metric id {:?} has an empty name", s);
        Ok(Self::new(category.parse()?, name))
    }
}

/// One immutable sample. `timestamp` is milliseconds since the UNIX epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub name: String,
    pub value: f64,
    pub category: Category,
    pub timestamp: u64,
}

impl Reading {
    pub fn new(category: Category, name: impl Into<String>, value: f64, timestamp: u64) -> Self {
        Self {
            name: name.into(),
            value,
            category,
            timestamp,
        }
    }

    pub fn metric_id(&self) -> MetricId {
        MetricId::new(self.category, self.name.clone())
    }

    pub fn is_metric(&self, id: &MetricId) -> bool {
        self.category == id.category && self.name == id.name
    }
}
