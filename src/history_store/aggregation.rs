// Pure summaries over a run of readings: min/avg/max/current and fixed-bucket downsampling.
// Readings are expected oldest first, as returned by HistoryStore::query.

use crate::models::{Reading, SeriesStats};

/// Min / avg / max / current over `readings`. `None` when empty.
pub fn series_stats(readings: &[Reading]) -> Option<SeriesStats> {
    let last = readings.last()?;
    let values: Vec<f64> = readings.iter().map(|r| r.value).collect();
    Some(SeriesStats {
        count: values.len(),
        min: values.iter().copied().fold(f64::INFINITY, f64::min),
        max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        avg: mean_f64(&values),
        current: last.value,
        last_timestamp: last.timestamp,
    })
}

/// Averages readings into `bucket_ms`-wide buckets aligned to multiples of `bucket_ms`.
/// Each output reading carries its bucket start as timestamp. Expects a single metric;
/// name and category come from the first reading of each bucket.
pub fn downsample(readings: &[Reading], bucket_ms: u64) -> Vec<Reading> {
    if bucket_ms <= 1 {
        return readings.to_vec();
    }
    let mut out: Vec<Reading> = Vec::new();
    let mut bucket: Vec<&Reading> = Vec::new();
    let mut bucket_start = None;

    for r in readings {
        let start = (r.timestamp / bucket_ms) * bucket_ms;
        if bucket_start.is_some_and(|s| s != start) {
            out.extend(flush_bucket(&bucket, bucket_start));
            bucket.clear();
        }
        bucket_start = Some(start);
        bucket.push(r);
    }
    out.extend(flush_bucket(&bucket, bucket_start));
    out
}

fn flush_bucket(bucket: &[&Reading], start: Option<u64>) -> Option<Reading> {
    let first = bucket.first()?;
    let values: Vec<f64> = bucket.iter().map(|r| r.value).collect();
    Some(Reading::new(
        first.category,
        first.name.clone(),
        mean_f64(&values),
        start?,
    ))
}

fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
