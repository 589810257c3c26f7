// Library error types. Neither escalates past one refresh cycle.

use std::time::Duration;

/// A sensor source could not produce readings this cycle. The aggregator
/// drops the category from the snapshot and carries on.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("{source_name}: unavailable ({reason})")]
    Unavailable {
        source_name: &'static str,
        reason: String,
    },
    #[error("{source_name}: no result after {after:?}")]
    Timeout {
        source_name: &'static str,
        after: Duration,
    },
    #[error("{path}: {error}")]
    Io {
        path: String,
        #[source]
        error: std::io::Error,
    },
    #[error("{path}: cannot parse {content:?}")]
    Parse { path: String, content: String },
}

impl SourceError {
    pub fn unavailable(source_name: &'static str, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            source_name,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// Appending would break per-store timestamp monotonicity.
    #[error("snapshot at {got} ms is older than latest appended {latest} ms")]
    OutOfOrder { latest: u64, got: u64 },
}
