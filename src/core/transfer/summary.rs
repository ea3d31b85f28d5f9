//! Run summary and elapsed-time formatting

use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;

/// Final counters of a completed run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Non-empty normalized values collected
    pub total_collected: u64,

    /// Target write operations issued (or that would have been, in dry run)
    pub docs_written: u64,

    /// Documents removed by the pre-flush clear, if one ran
    pub removed: Option<u64>,

    /// Wall time from pipeline start to completion
    pub elapsed: Duration,

    /// Start timestamp
    pub started_at: DateTime<Utc>,

    /// Completion timestamp
    pub finished_at: DateTime<Utc>,

    /// Whether writes were skipped
    pub dry_run: bool,
}

impl RunSummary {
    /// Elapsed time in whole milliseconds
    pub fn elapsed_ms(&self) -> u128 {
        self.elapsed.as_millis()
    }

    /// Elapsed time as `(minutes, seconds, milliseconds)`
    pub fn elapsed_parts(&self) -> ElapsedParts {
        ElapsedParts::from(self.elapsed)
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            total_collected = self.total_collected,
            docs_written = self.docs_written,
            removed = ?self.removed,
            elapsed_ms = self.elapsed_ms() as u64,
            dry_run = self.dry_run,
            "Transfer completed"
        );
    }
}

/// Duration decomposed for display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElapsedParts {
    pub minutes: u64,
    pub seconds: u64,
    pub millis: u64,
}

impl From<Duration> for ElapsedParts {
    fn from(duration: Duration) -> Self {
        let total_ms = duration.as_millis() as u64;
        Self {
            minutes: total_ms / 60_000,
            seconds: (total_ms % 60_000) / 1000,
            millis: total_ms % 1000,
        }
    }
}

/// Renders `N min N sec N ms`, leaving out a zero minute or second part
impl fmt::Display for ElapsedParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.minutes > 0 {
            write!(f, "{} min ", self.minutes)?;
        }
        if self.seconds > 0 {
            write!(f, "{} sec ", self.seconds)?;
        }
        write!(f, "{} ms", self.millis)
    }
}

/// Format a duration the way run output shows it
pub fn format_elapsed(duration: Duration) -> String {
    ElapsedParts::from(duration).to_string()
}
