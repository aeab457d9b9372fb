//! Fault injection for guarded operations.
//!
//! # Reference
//! Netflix. (2012). Chaos Monkey. GitHub.
//! <https://github.com/Netflix/chaosmonkey>
//!
//! A [`FaultInjector`] stands in for a flaky dependency: each run either
//! succeeds or fails with [`InjectedFault`], optionally after some latency.
//! Seeding makes a sequence of outcomes reproducible.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Error produced by an injected fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("injected fault")]
pub struct InjectedFault;

/// Fault injection configuration.
#[derive(Debug, Clone, Default)]
pub struct FaultConfig {
    /// Probability that a run fails.
    pub error_rate: Option<f64>,
    /// Latency injection: (probability, delay).
    pub latency: Option<(f64, Duration)>,
    /// RNG seed; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl FaultConfig {
    /// Creates a config that fails runs with probability `p`.
    #[must_use]
    pub fn errors(p: f64) -> Self {
        Self {
            error_rate: Some(p),
            ..Default::default()
        }
    }

    /// Creates a config that delays runs by `delay` with probability `p`.
    #[must_use]
    pub fn latency(p: f64, delay: Duration) -> Self {
        Self {
            latency: Some((p, delay)),
            ..Default::default()
        }
    }

    /// Fixes the RNG seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Injects failures and latency into operations.
#[derive(Debug)]
pub struct FaultInjector {
    config: FaultConfig,
    rng: Mutex<StdRng>,
    runs: AtomicU64,
    injected: AtomicU64,
}

impl FaultInjector {
    /// Creates an injector.
    #[must_use]
    pub fn new(config: FaultConfig) -> Self {
        let rng = config
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Self {
            config,
            rng: Mutex::new(rng),
            runs: AtomicU64::new(0),
            injected: AtomicU64::new(0),
        }
    }

    /// Returns the config.
    #[must_use]
    pub const fn config(&self) -> &FaultConfig {
        &self.config
    }

    /// Runs the simulated dependency, blocking the thread for any latency.
    ///
    /// # Errors
    /// Returns [`InjectedFault`] when a failure is injected.
    pub fn run<T>(&self, value: T) -> Result<T, InjectedFault> {
        if let Some(delay) = self.next_latency() {
            std::thread::sleep(delay);
        }
        self.outcome(value)
    }

    /// Runs the simulated dependency, sleeping asynchronously for any latency.
    ///
    /// # Errors
    /// Returns [`InjectedFault`] when a failure is injected.
    pub async fn run_async<T>(&self, value: T) -> Result<T, InjectedFault> {
        if let Some(delay) = self.next_latency() {
            tokio::time::sleep(delay).await;
        }
        self.outcome(value)
    }

    /// Returns how many runs happened.
    #[must_use]
    pub fn runs(&self) -> u64 {
        self.runs.load(Ordering::Relaxed)
    }

    /// Returns how many runs failed by injection.
    #[must_use]
    pub fn injected(&self) -> u64 {
        self.injected.load(Ordering::Relaxed)
    }

    fn outcome<T>(&self, value: T) -> Result<T, InjectedFault> {
        self.runs.fetch_add(1, Ordering::Relaxed);
        if self.should_fail() {
            self.injected.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("injecting fault");
            Err(InjectedFault)
        } else {
            Ok(value)
        }
    }

    fn should_fail(&self) -> bool {
        self.config
            .error_rate
            .is_some_and(|p| self.rng.lock().random_bool(p.clamp(0.0, 1.0)))
    }

    fn next_latency(&self) -> Option<Duration> {
        let (p, delay) = self.config.latency?;
        self.rng
            .lock()
            .random_bool(p.clamp(0.0, 1.0))
            .then_some(delay)
    }
}

impl Default for FaultInjector {
    fn default() -> Self {
        Self::new(FaultConfig::default())
    }
}
