//! Serializable breaker status.

use serde::{Deserialize, Serialize};
use tripwire_core::{CircuitBreaker, State};

use crate::error::Result;

/// Point-in-time status of one breaker, ready for export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakerReport {
    /// Breaker name.
    pub name: String,
    /// Current state.
    pub state: State,
    /// Requests recorded in the current window.
    pub requests: u64,
    /// Successes recorded in the current window.
    pub successes: u64,
    /// Failures recorded in the current window.
    pub failures: u64,
    /// Current failure streak.
    pub consecutive_failures: u64,
    /// Failures / requests in the current window.
    pub failure_ratio: f64,
    /// Milliseconds since the last failure, if any was recorded.
    pub last_failure_age_ms: Option<u64>,
}

impl BreakerReport {
    /// Captures the breaker's current state and counters.
    ///
    /// State and counters are read separately, so a concurrent transition
    /// between the two reads can show up in one and not the other.
    #[must_use]
    pub fn capture(breaker: &CircuitBreaker) -> Self {
        let state = breaker.state();
        let metrics = breaker.metrics();
        let now = breaker.now();
        Self {
            name: breaker.name().to_string(),
            state,
            requests: metrics.requests,
            successes: metrics.successes,
            failures: metrics.failures,
            consecutive_failures: metrics.consecutive_failures,
            failure_ratio: metrics.failure_ratio(),
            last_failure_age_ms: metrics
                .last_failure
                .map(|at| {
                    u64::try_from(now.saturating_duration_since(at).as_millis())
                        .unwrap_or(u64::MAX)
                }),
        }
    }

    /// Returns true if the breaker is letting traffic through normally.
    #[must_use]
    pub const fn is_healthy(&self) -> bool {
        self.state.is_closed()
    }

    /// Serializes the report as JSON.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
