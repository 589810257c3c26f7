// Domain models: readings, snapshots, query windows, series summaries

mod reading;
mod snapshot;
mod stats;
mod window;

pub use reading::{Category, MetricId, Reading};
pub use snapshot::{Snapshot, unix_millis_now};
pub use stats::SeriesStats;
pub use window::TimeWindow;
