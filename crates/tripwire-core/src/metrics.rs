//! Breaker counters for the current observation window.
//!
//! # Toyota Way: Visual Management (目で見る管理)
//! Make dependency health visible at a glance.

use std::time::Instant;

/// Counters scoped to the current state's observation window.
///
/// Invariant: `requests == successes + failures`. All counters are reset to
/// zero whenever the breaker transitions into `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Metrics {
    /// Total recorded requests (admitted and executed).
    pub requests: u64,
    /// Requests whose operation returned `Ok`.
    pub successes: u64,
    /// Requests whose operation returned `Err`.
    pub failures: u64,
    /// Current streak of failures with no success in between.
    pub consecutive_failures: u64,
    /// When the most recent failure was recorded.
    pub last_failure: Option<Instant>,
}

impl Metrics {
    /// Returns true if nothing has been recorded in this window.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.requests == 0
    }

    /// Returns failures / requests (0.0 when no requests).
    #[must_use]
    pub fn failure_ratio(&self) -> f64 {
        if self.requests > 0 {
            self.failures as f64 / self.requests as f64
        } else {
            0.0
        }
    }

    pub(crate) fn record_success(&mut self) {
        self.requests += 1;
        self.successes += 1;
        self.consecutive_failures = 0;
    }

    pub(crate) fn record_failure(&mut self, now: Instant) {
        self.requests += 1;
        self.failures += 1;
        self.consecutive_failures += 1;
        self.last_failure = Some(now);
    }
}
