//! Circuit breaker state machine and execution guard.
//!
//! # Reference
//! Fowler, M. (2014). Circuit Breaker pattern. martinfowler.com.
//!
//! # Toyota Way: Jidoka (自働化)
//! Automatic stop when the failure policy says the dependency is unhealthy.
//!
//! # State Transitions
//! ```text
//! Closed   → Open:     failure recorded and ready_to_trip(metrics)
//! Open     → HalfOpen: admission check finds the timeout elapsed
//! HalfOpen → Open:     any failure recorded
//! HalfOpen → Closed:   max_requests successful trials (metrics reset)
//! ```
//!
//! # Locking
//! All mutable state sits behind one reader/writer lock. Admission peeks under
//! the read lock and re-validates under the write lock before moving
//! `Open → HalfOpen`. Outcomes are recorded under the write lock. The guarded
//! operation always runs with no lock held.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::clock::{Clock, SystemClock};
use crate::config::{Config, StateChangeHook, TripPredicate};
use crate::context::CallContext;
use crate::error::BreakerError;
use crate::metrics::Metrics;
use crate::state::State;

/// Mutable breaker state, owned exclusively by the breaker.
struct Inner {
    state: State,
    metrics: Metrics,
    last_state_change: Instant,
    half_open_requests: u32,
}

/// Concurrency-safe circuit breaker guarding one logical dependency.
///
/// Share it between callers with `Arc<CircuitBreaker>`; every method takes
/// `&self`.
///
/// The state-change hook runs synchronously while the breaker's write lock is
/// held, so transitions are reported in the order they happen. The hook must
/// not call back into the same breaker (that would deadlock). Consumers that
/// need to inspect the breaker on a transition should use a decoupled hook
/// such as the one from `tripwire_observe::TransitionFeed`.
pub struct CircuitBreaker {
    name: String,
    max_requests: u32,
    interval: Duration,
    timeout: Duration,
    ready_to_trip: TripPredicate,
    on_state_change: Option<StateChangeHook>,
    clock: Arc<dyn Clock>,
    inner: RwLock<Inner>,
}

impl CircuitBreaker {
    /// Creates a breaker on the system clock.
    ///
    /// Zero or missing configuration values are replaced by defaults.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates a breaker on the given clock.
    #[must_use]
    pub fn with_clock(config: Config, clock: Arc<dyn Clock>) -> Self {
        let config = config.normalize();
        let now = clock.now();
        Self {
            name: config.name,
            max_requests: config.max_requests,
            interval: config.interval,
            timeout: config.timeout,
            ready_to_trip: config.ready_to_trip,
            on_state_change: config.on_state_change,
            clock,
            inner: RwLock::new(Inner {
                state: State::Closed,
                metrics: Metrics::default(),
                last_state_change: now,
                half_open_requests: 0,
            }),
        }
    }

    /// Executes `operation` through the breaker.
    ///
    /// 1. A done context fails immediately with [`BreakerError::Context`].
    /// 2. A denied admission fails with [`BreakerError::Open`].
    /// 3. Otherwise the operation runs inline, its outcome is recorded, and
    ///    its value or error is returned unchanged.
    ///
    /// In the two rejection cases the operation is never invoked.
    ///
    /// # Errors
    /// Returns the context error, the breaker rejection, or the operation's
    /// own error wrapped in [`BreakerError::Operation`].
    pub fn call<T, E, F>(&self, ctx: &CallContext, operation: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Result<T, E>,
    {
        self.before_call(ctx)?;
        let result = operation();
        self.after_call(result.is_ok());
        result.map_err(BreakerError::Operation)
    }

    /// Async form of [`call`](Self::call). No lock is held across the await.
    ///
    /// # Errors
    /// Same as [`call`](Self::call).
    pub async fn call_async<T, E, F, Fut>(
        &self,
        ctx: &CallContext,
        operation: F,
    ) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.before_call(ctx)?;
        let result = operation().await;
        self.after_call(result.is_ok());
        result.map_err(BreakerError::Operation)
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> State {
        self.inner.read().state
    }

    /// Returns a snapshot of the current counters.
    #[must_use]
    pub fn metrics(&self) -> Metrics {
        self.inner.read().metrics
    }

    /// Returns the successful trials recorded in the current half-open probe.
    #[must_use]
    pub fn half_open_requests(&self) -> u32 {
        self.inner.read().half_open_requests
    }

    /// Returns the breaker name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the half-open trial budget.
    #[must_use]
    pub const fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Returns the observation window.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns the open-state timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the current time on the breaker's clock.
    ///
    /// Timestamps in [`Metrics`] come from this clock, so ages must be
    /// measured against it rather than against `Instant::now()`.
    #[must_use]
    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    fn before_call<E>(&self, ctx: &CallContext) -> Result<(), BreakerError<E>> {
        if let Some(err) = ctx.err() {
            return Err(BreakerError::Context(err));
        }
        if self.can_execute() {
            Ok(())
        } else {
            tracing::debug!(breaker = %self.name, "circuit breaker open, rejecting call");
            Err(BreakerError::Open)
        }
    }

    fn after_call(&self, success: bool) {
        if success {
            self.record_success();
        } else {
            self.record_failure();
        }
    }

    /// Admission check. The caller that finds the timeout elapsed performs
    /// the `Open → HalfOpen` transition.
    fn can_execute(&self) -> bool {
        if self.inner.read().state != State::Open {
            return true;
        }

        let mut inner = self.inner.write();
        // State may have moved between the two acquisitions.
        if inner.state != State::Open {
            return true;
        }
        let now = self.clock.now();
        if now.saturating_duration_since(inner.last_state_change) <= self.timeout {
            return false;
        }
        self.set_state(&mut inner, State::HalfOpen, now);
        true
    }

    fn record_success(&self) {
        let mut inner = self.inner.write();
        inner.metrics.record_success();

        if inner.state == State::HalfOpen {
            inner.half_open_requests += 1;
            if inner.half_open_requests >= self.max_requests {
                let now = self.clock.now();
                self.set_state(&mut inner, State::Closed, now);
            }
        }
    }

    fn record_failure(&self) {
        let mut inner = self.inner.write();
        let now = self.clock.now();
        inner.metrics.record_failure(now);

        match inner.state {
            State::Closed => {
                if (self.ready_to_trip)(&inner.metrics) {
                    self.set_state(&mut inner, State::Open, now);
                }
            }
            State::HalfOpen => self.set_state(&mut inner, State::Open, now),
            State::Open => {}
        }
    }

    /// Moves to `to`. A transition to the current state is a no-op: the
    /// timestamp stays and the hook does not fire.
    fn set_state(&self, inner: &mut Inner, to: State, now: Instant) {
        let from = inner.state;
        if from == to {
            return;
        }

        inner.state = to;
        inner.last_state_change = now;

        match to {
            State::Closed => {
                inner.half_open_requests = 0;
                inner.metrics = Metrics::default();
                tracing::info!(breaker = %self.name, %from, "circuit breaker closed");
            }
            State::Open => {
                inner.half_open_requests = 0;
                tracing::warn!(
                    breaker = %self.name,
                    %from,
                    failures = inner.metrics.failures,
                    consecutive_failures = inner.metrics.consecutive_failures,
                    "circuit breaker opened"
                );
            }
            State::HalfOpen => {
                tracing::info!(breaker = %self.name, "circuit breaker half-open, testing recovery");
            }
        }

        if let Some(hook) = &self.on_state_change {
            hook(&self.name, from, to);
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("state", &inner.state)
            .field("metrics", &inner.metrics)
            .field("half_open_requests", &inner.half_open_requests)
            .field("max_requests", &self.max_requests)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
