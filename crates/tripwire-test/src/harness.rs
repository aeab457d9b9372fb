//! Deterministic breaker harness.
//!
//! # Toyota Way: Genchi Genbutsu (現地現物)
//! Drive the real breaker and observe what it actually does: every call
//! goes through [`CircuitBreaker::call`], time only moves when the test
//! says so, and every transition lands in a [`TransitionLog`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tripwire_core::{
    BreakerError, CallContext, CircuitBreaker, Config, ManualClock, Metrics, State,
    StateChangeHook, TripPredicate,
};
use tripwire_observe::{TransitionLog, compose};

use crate::chaos::InjectedFault;
use crate::error::{Result, TestError};

/// Upper bound on failures [`BreakerHarness::trip`] feeds before giving up.
const MAX_TRIP_ATTEMPTS: u32 = 10_000;

/// Classified outcome of one call through the breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    /// Admitted; the operation succeeded.
    Succeeded,
    /// Admitted; the operation failed.
    Failed,
    /// Fast-failed by the open breaker.
    Rejected,
    /// Refused because the context was done.
    Cancelled,
}

impl CallOutcome {
    /// Classifies a breaker result.
    #[must_use]
    pub fn of<T, E>(result: &std::result::Result<T, BreakerError<E>>) -> Self {
        match result {
            Ok(_) => Self::Succeeded,
            Err(BreakerError::Operation(_)) => Self::Failed,
            Err(BreakerError::Open | BreakerError::TooManyRequests) => Self::Rejected,
            Err(BreakerError::Context(_)) => Self::Cancelled,
        }
    }

    /// Returns true if the operation was invoked.
    #[must_use]
    pub const fn was_admitted(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// Builder for [`BreakerHarness`].
#[derive(Default)]
pub struct BreakerHarnessBuilder {
    config: Config,
    log_capacity: Option<usize>,
}

impl BreakerHarnessBuilder {
    /// Starts from an existing breaker config.
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Sets the breaker name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.config = self.config.with_name(name);
        self
    }

    /// Sets the half-open trial budget.
    #[must_use]
    pub fn with_max_requests(mut self, max_requests: u32) -> Self {
        self.config = self.config.with_max_requests(max_requests);
        self
    }

    /// Sets the open-state timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_timeout(timeout);
        self
    }

    /// Sets the trip predicate.
    #[must_use]
    pub fn with_ready_to_trip(mut self, predicate: TripPredicate) -> Self {
        self.config.ready_to_trip = Some(predicate);
        self
    }

    /// Sets the transition log capacity.
    #[must_use]
    pub const fn with_log_capacity(mut self, capacity: usize) -> Self {
        self.log_capacity = Some(capacity);
        self
    }

    /// Builds the harness.
    ///
    /// Any hook already present in the config keeps firing, after the
    /// harness's own transition log.
    #[must_use]
    pub fn build(self) -> BreakerHarness {
        let log = self
            .log_capacity
            .map_or_else(TransitionLog::default, TransitionLog::new);

        let mut config = self.config;
        let hook: StateChangeHook = match config.on_state_change.take() {
            Some(user) => compose(vec![log.hook(), user]),
            None => log.hook(),
        };
        config = config.with_hook(hook);

        let clock = ManualClock::new();
        let breaker = Arc::new(CircuitBreaker::with_clock(config, Arc::new(clock.clone())));
        tracing::debug!(breaker = %breaker.name(), "harness ready");

        BreakerHarness {
            breaker,
            clock,
            log,
            invocations: Arc::new(AtomicU64::new(0)),
        }
    }
}

/// A breaker on a manual clock, with a transition log and an invocation
/// counter wired in.
#[derive(Debug, Clone)]
pub struct BreakerHarness {
    breaker: Arc<CircuitBreaker>,
    clock: ManualClock,
    log: TransitionLog,
    invocations: Arc<AtomicU64>,
}

impl BreakerHarness {
    /// Creates a builder.
    #[must_use]
    pub fn builder() -> BreakerHarnessBuilder {
        BreakerHarnessBuilder::default()
    }

    /// Creates a harness with the default breaker config.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Calls through the breaker with an operation that succeeds.
    pub fn succeed(&self) -> CallOutcome {
        self.call(true)
    }

    /// Calls through the breaker with an operation that fails.
    pub fn fail(&self) -> CallOutcome {
        self.call(false)
    }

    /// Calls through the breaker with an operation of the given outcome.
    pub fn call(&self, ok: bool) -> CallOutcome {
        self.call_with(&CallContext::background(), ok)
    }

    /// Calls through the breaker with a specific context.
    pub fn call_with(&self, ctx: &CallContext, ok: bool) -> CallOutcome {
        let result = self.breaker.call(ctx, || {
            self.invocations.fetch_add(1, Ordering::SeqCst);
            if ok { Ok(()) } else { Err(InjectedFault) }
        });
        CallOutcome::of(&result)
    }

    /// Calls through the breaker and reports the state seen from inside the
    /// operation.
    pub fn probe(&self, ok: bool) -> (CallOutcome, Option<State>) {
        let mut seen = None;
        let result = self.breaker.call(&CallContext::background(), || {
            self.invocations.fetch_add(1, Ordering::SeqCst);
            seen = Some(self.breaker.state());
            if ok { Ok(()) } else { Err(InjectedFault) }
        });
        (CallOutcome::of(&result), seen)
    }

    /// Feeds failures until the breaker opens and returns how many it took.
    ///
    /// # Errors
    /// Returns an assertion error if the breaker never opens.
    pub fn trip(&self) -> Result<u32> {
        for attempt in 1..=MAX_TRIP_ATTEMPTS {
            if self.fail() == CallOutcome::Rejected {
                return Err(TestError::assertion(format!(
                    "breaker rejected failure #{attempt} before tripping"
                )));
            }
            if self.breaker.state().is_open() {
                return Ok(attempt);
            }
        }
        Err(TestError::assertion(format!(
            "breaker still {} after {MAX_TRIP_ATTEMPTS} failures",
            self.breaker.state()
        )))
    }

    /// Moves the manual clock forward.
    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }

    /// Moves the clock just past the open-state timeout.
    pub fn advance_past_timeout(&self) {
        self.clock.advance(self.breaker.timeout() + Duration::from_millis(1));
    }

    /// Asserts the current state.
    ///
    /// # Errors
    /// Returns an assertion error if the state differs.
    pub fn expect_state(&self, expected: State) -> Result<()> {
        let actual = self.breaker.state();
        if actual == expected {
            Ok(())
        } else {
            Err(TestError::assertion(format!(
                "expected {expected}, got {actual}"
            )))
        }
    }

    /// Returns how many times an operation was invoked.
    #[must_use]
    pub fn invocations(&self) -> u64 {
        self.invocations.load(Ordering::SeqCst)
    }

    /// Returns the breaker under test.
    #[must_use]
    pub const fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Returns the manual clock.
    #[must_use]
    pub const fn clock(&self) -> &ManualClock {
        &self.clock
    }

    /// Returns the transition log.
    #[must_use]
    pub const fn log(&self) -> &TransitionLog {
        &self.log
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> State {
        self.breaker.state()
    }

    /// Returns the current counters.
    #[must_use]
    pub fn metrics(&self) -> Metrics {
        self.breaker.metrics()
    }
}

impl Default for BreakerHarness {
    fn default() -> Self {
        Self::new()
    }
}
