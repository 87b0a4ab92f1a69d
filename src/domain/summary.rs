//! Suppression summaries.
//!
//! At the end of a period in which a pattern exceeded its limit, one summary
//! line is emitted saying how many events were withheld and how long the
//! pattern spent over the limit.

use crate::domain::key::PatternKey;
use crate::domain::level::Level;
use std::time::Duration;

/// A summary of the events suppressed for one pattern during one period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuppressionSummary {
    /// The pattern whose events were suppressed
    pub key: PatternKey,
    /// Number of events withheld from the sink
    pub suppressed: u64,
    /// Time between crossing the limit and the reset
    pub elapsed: Duration,
}

impl SuppressionSummary {
    /// Create a new summary.
    pub fn new(key: PatternKey, suppressed: u64, elapsed: Duration) -> Self {
        Self {
            key,
            suppressed,
            elapsed,
        }
    }

    /// Level the summary line is emitted at.
    ///
    /// Level-bound patterns report at their own level; others at `Info`.
    pub fn level(&self) -> Level {
        self.key.level().unwrap_or(Level::Info)
    }

    /// Format the summary as a human-readable message.
    pub fn format_message(&self) -> String {
        format!(
            "(suppressed {} logs similar to '{}' in {:?})",
            self.suppressed,
            self.key.template(),
            self.elapsed
        )
    }
}
