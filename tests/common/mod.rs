// Shared test helpers
#![allow(dead_code)]

use sensorhub::error::SourceError;
use sensorhub::models::*;
use sensorhub::sources::{FnSource, SensorSource};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub fn snapshot(timestamp: u64, values: &[(Category, &str, f64)]) -> Snapshot {
    Snapshot::from_readings(
        timestamp,
        values
            .iter()
            .map(|(c, name, v)| Reading::new(*c, *name, *v, timestamp)),
    )
}

pub fn metric(category: Category, name: &str) -> MetricId {
    MetricId::new(category, name)
}

/// Source that always reports the same values.
pub fn fixed_source(
    name: &'static str,
    category: Category,
    values: &[(&str, f64)],
) -> Arc<dyn SensorSource> {
    let values: Vec<(String, f64)> = values.iter().map(|(n, v)| (n.to_string(), *v)).collect();
    Arc::new(FnSource::new(name, category, move || Ok(values.clone())))
}

/// Source reporting the hardware as absent.
pub fn unavailable_source(name: &'static str, category: Category) -> Arc<dyn SensorSource> {
    Arc::new(FnSource::new(name, category, move || {
        Err(SourceError::unavailable(name, "not present"))
    }))
}

/// Source that sleeps for `delay` on every call and counts calls.
pub fn slow_source(
    name: &'static str,
    category: Category,
    delay: Duration,
    calls: Arc<AtomicUsize>,
) -> Arc<dyn SensorSource> {
    Arc::new(FnSource::new(name, category, move || {
        calls.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(delay);
        Ok(vec![("value".to_string(), 1.0)])
    }))
}
