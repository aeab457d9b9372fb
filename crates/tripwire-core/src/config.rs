//! Breaker configuration.
//!
//! [`Config`] is the programmatic form: it carries the trip predicate and the
//! state-change hook as function values. [`BreakerSettings`] is the
//! declarative form that can be loaded from TOML and turned into a `Config`.
//!
//! Missing or zero values are normalized to defaults when a breaker is built,
//! never rejected at call time.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::metrics::Metrics;
use crate::state::State;

/// Default breaker name.
pub const DEFAULT_NAME: &str = "circuit-breaker";
/// Default half-open trial budget.
pub const DEFAULT_MAX_REQUESTS: u32 = 1;
/// Default observation window.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);
/// Default time spent open before probing.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Consecutive failures that trip the default predicate.
pub const DEFAULT_CONSECUTIVE_FAILURES: u64 = 5;

/// Decides, from the current counters, whether to open the circuit.
pub type TripPredicate = Arc<dyn Fn(&Metrics) -> bool + Send + Sync>;

/// Called as `(name, from, to)` on every actual state transition.
pub type StateChangeHook = Arc<dyn Fn(&str, State, State) + Send + Sync>;

/// Ready-made trip predicates.
pub mod trip {
    use super::{Metrics, TripPredicate};
    use std::sync::Arc;

    /// Trips once the failure streak reaches `threshold`.
    #[must_use]
    pub fn consecutive_failures(threshold: u64) -> TripPredicate {
        Arc::new(move |m: &Metrics| m.consecutive_failures >= threshold)
    }

    /// Trips once at least `min_requests` were recorded and the failure
    /// ratio reaches `ratio`.
    #[must_use]
    pub fn failure_ratio(min_requests: u64, ratio: f64) -> TripPredicate {
        Arc::new(move |m: &Metrics| m.requests >= min_requests && m.failure_ratio() >= ratio)
    }
}

/// Circuit breaker configuration. Immutable once handed to a breaker.
#[derive(Clone)]
pub struct Config {
    /// Name reported to the state-change hook and in logs.
    pub name: String,
    /// Successful trials needed in `HalfOpen` before closing (at least 1).
    pub max_requests: u32,
    /// Rolling observation window. Informational: counters are only reset
    /// when the breaker closes.
    pub interval: Duration,
    /// How long to stay `Open` before probing.
    pub timeout: Duration,
    /// Trip predicate; `None` means [`trip::consecutive_failures`] with 5.
    pub ready_to_trip: Option<TripPredicate>,
    /// Optional state-change hook.
    pub on_state_change: Option<StateChangeHook>,
}

impl Config {
    /// Creates a configuration with all defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            max_requests: DEFAULT_MAX_REQUESTS,
            interval: DEFAULT_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
            ready_to_trip: None,
            on_state_change: None,
        }
    }

    /// Sets the breaker name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the half-open trial budget.
    #[must_use]
    pub fn with_max_requests(mut self, max_requests: u32) -> Self {
        self.max_requests = max_requests;
        self
    }

    /// Sets the observation window.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the open-state timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the trip predicate.
    #[must_use]
    pub fn with_ready_to_trip<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Metrics) -> bool + Send + Sync + 'static,
    {
        self.ready_to_trip = Some(Arc::new(predicate));
        self
    }

    /// Sets the state-change hook.
    #[must_use]
    pub fn with_on_state_change<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, State, State) + Send + Sync + 'static,
    {
        self.on_state_change = Some(Arc::new(hook));
        self
    }

    /// Sets an already shared state-change hook.
    #[must_use]
    pub fn with_hook(mut self, hook: StateChangeHook) -> Self {
        self.on_state_change = Some(hook);
        self
    }

    /// Replaces zero or missing values with their defaults.
    pub(crate) fn normalize(self) -> Normalized {
        let name = if self.name.is_empty() {
            DEFAULT_NAME.to_string()
        } else {
            self.name
        };
        Normalized {
            name,
            max_requests: self.max_requests.max(1),
            interval: non_zero_or(self.interval, DEFAULT_INTERVAL),
            timeout: non_zero_or(self.timeout, DEFAULT_TIMEOUT),
            ready_to_trip: self
                .ready_to_trip
                .unwrap_or_else(|| trip::consecutive_failures(DEFAULT_CONSECUTIVE_FAILURES)),
            on_state_change: self.on_state_change,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("name", &self.name)
            .field("max_requests", &self.max_requests)
            .field("interval", &self.interval)
            .field("timeout", &self.timeout)
            .field("ready_to_trip", &self.ready_to_trip.is_some())
            .field("on_state_change", &self.on_state_change.is_some())
            .finish()
    }
}

const fn non_zero_or(value: Duration, default: Duration) -> Duration {
    if value.is_zero() { default } else { value }
}

/// Configuration after defaults are applied; what a breaker actually runs on.
pub(crate) struct Normalized {
    pub(crate) name: String,
    pub(crate) max_requests: u32,
    pub(crate) interval: Duration,
    pub(crate) timeout: Duration,
    pub(crate) ready_to_trip: TripPredicate,
    pub(crate) on_state_change: Option<StateChangeHook>,
}

/// Declarative breaker settings, loadable from TOML.
///
/// ```toml
/// name = "payments-api"
/// max_requests = 3
/// interval = "1m"
/// timeout = "15s"
/// consecutive_failures = 5
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakerSettings {
    /// Breaker name.
    #[serde(default = "default_name")]
    pub name: String,

    /// Half-open trial budget.
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Observation window.
    #[serde(default = "default_interval")]
    #[serde(with = "humantime_serde")]
    pub interval: Duration,

    /// Open-state timeout.
    #[serde(default = "default_timeout")]
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Failure streak that trips the circuit.
    #[serde(default = "default_consecutive_failures")]
    pub consecutive_failures: u64,

    /// Optional failure ratio (0.0, 1.0] that also trips the circuit.
    #[serde(default)]
    pub failure_ratio: Option<f64>,

    /// Requests required before `failure_ratio` is considered.
    #[serde(default = "default_min_requests")]
    pub min_requests: u64,
}

fn default_name() -> String {
    DEFAULT_NAME.to_string()
}

fn default_max_requests() -> u32 {
    DEFAULT_MAX_REQUESTS
}

fn default_interval() -> Duration {
    DEFAULT_INTERVAL
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

fn default_consecutive_failures() -> u64 {
    DEFAULT_CONSECUTIVE_FAILURES
}

fn default_min_requests() -> u64 {
    10
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            name: default_name(),
            max_requests: default_max_requests(),
            interval: default_interval(),
            timeout: default_timeout(),
            consecutive_failures: default_consecutive_failures(),
            failure_ratio: None,
            min_requests: default_min_requests(),
        }
    }
}

impl BreakerSettings {
    /// Validates the settings.
    ///
    /// # Errors
    /// Returns an error if any value is out of range.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(ConfigError::invalid("name cannot be empty"));
        }
        if self.max_requests == 0 {
            return Err(ConfigError::invalid("max_requests must be at least 1"));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::invalid("timeout must be greater than zero"));
        }
        if self.consecutive_failures == 0 {
            return Err(ConfigError::invalid(
                "consecutive_failures must be at least 1",
            ));
        }
        if let Some(ratio) = self.failure_ratio {
            if !(ratio > 0.0 && ratio <= 1.0) {
                return Err(ConfigError::invalid(format!(
                    "failure_ratio must be in (0.0, 1.0], got {ratio}"
                )));
            }
        }
        Ok(())
    }

    /// Parses and validates settings from a TOML string.
    ///
    /// # Errors
    /// Returns an error if the string cannot be parsed or is invalid.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let settings: Self = toml::from_str(s)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Loads settings from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Builds the trip predicate these settings describe.
    #[must_use]
    pub fn trip_predicate(&self) -> TripPredicate {
        let streak = trip::consecutive_failures(self.consecutive_failures);
        match self.failure_ratio {
            None => streak,
            Some(ratio) => {
                let by_ratio = trip::failure_ratio(self.min_requests, ratio);
                Arc::new(move |m: &Metrics| streak(m) || by_ratio(m))
            }
        }
    }

    /// Converts the settings into a [`Config`] without a hook.
    #[must_use]
    pub fn into_config(self) -> Config {
        let ready_to_trip = self.trip_predicate();
        Config {
            name: self.name,
            max_requests: self.max_requests,
            interval: self.interval,
            timeout: self.timeout,
            ready_to_trip: Some(ready_to_trip),
            on_state_change: None,
        }
    }
}

/// Serde helper for humantime durations.
mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    /// Serializes a duration as a human-readable string.
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    /// Deserializes a duration from a human-readable string.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
