// Temperatures of every hardware component sysinfo can see, in °C

use super::SensorSource;
use crate::error::SourceError;
use crate::models::Category;
use std::sync::Mutex;
use sysinfo::Components;

pub struct ThermalSource {
    components: Mutex<Components>,
}

impl Default for ThermalSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ThermalSource {
    pub fn new() -> Self {
        Self {
            components: Mutex::new(Components::new_with_refreshed_list()),
        }
    }
}

impl SensorSource for ThermalSource {
    fn name(&self) -> &'static str {
        "thermal"
    }

    fn category(&self) -> Category {
        Category::Temperature
    }

    fn collect(&self) -> Result<Vec<(String, f64)>, SourceError> {
        let mut components = self.components.lock().map_err(|e| {
            SourceError::unavailable("thermal", format!("sysinfo components lock poisoned: {e}"))
        })?;
        components.refresh(true);

        let temps: Vec<(String, f64)> = components
            .list()
            .iter()
            .filter_map(|c| c.temperature().map(|t| (c.label().to_string(), t as f64)))
            .collect();
        if temps.is_empty() {
            return Err(SourceError::unavailable("thermal", "no temperature sensors"));
        }
        Ok(temps)
    }
}
