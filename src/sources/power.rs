// Voltage and current rails exposed through hwmon

use super::SensorSource;
use super::linux::read_hwmon_channels;
use crate::error::SourceError;
use crate::models::Category;
use std::path::PathBuf;

/// One hwmon channel family: `in*` (volts) or `curr*` (amperes).
pub struct PowerSource {
    category: Category,
    prefix: &'static str,
    root: PathBuf,
}

impl PowerSource {
    pub fn voltage(root: impl Into<PathBuf>) -> Self {
        Self {
            category: Category::Voltage,
            prefix: "in",
            root: root.into(),
        }
    }

    pub fn current(root: impl Into<PathBuf>) -> Self {
        Self {
            category: Category::Current,
            prefix: "curr",
            root: root.into(),
        }
    }
}

impl SensorSource for PowerSource {
    fn name(&self) -> &'static str {
        match self.category {
            Category::Current => "current",
            _ => "voltage",
        }
    }

    fn category(&self) -> Category {
        self.category
    }

    fn collect(&self) -> Result<Vec<(String, f64)>, SourceError> {
        if !self.root.exists() {
            return Err(SourceError::unavailable(
                self.name(),
                format!("{} not present", self.root.display()),
            ));
        }
        let channels = read_hwmon_channels(&self.root, self.prefix)?;
        if channels.is_empty() {
            return Err(SourceError::unavailable(self.name(), "no hwmon channels"));
        }
        Ok(channels)
    }
}
