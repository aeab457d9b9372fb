//! Concurrent load against a shared breaker.
//!
//! # Toyota Way: Heijunka (平準化)
//! Level loading to understand how the breaker behaves under contention.
//!
//! # Implementation
//! Spawns tokio workers that share one `Arc<CircuitBreaker>` and call it
//! through [`CircuitBreaker::call_async`]. Every outcome is classified and
//! counted, and latencies of admitted calls feed the percentiles.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tripwire_core::{CallContext, CircuitBreaker};

use crate::chaos::{FaultInjector, InjectedFault};
use crate::error::{Result, TestError};
use crate::harness::CallOutcome;

/// Load test configuration.
#[derive(Debug, Clone)]
pub struct LoadTestConfig {
    /// Number of concurrent workers.
    pub workers: u32,
    /// Calls each worker issues.
    pub calls_per_worker: u32,
    /// Pause between a worker's calls.
    pub pause: Option<Duration>,
}

impl Default for LoadTestConfig {
    fn default() -> Self {
        Self {
            workers: 16,
            calls_per_worker: 100,
            pause: None,
        }
    }
}

impl LoadTestConfig {
    /// Creates a light load test config.
    #[must_use]
    pub fn light() -> Self {
        Self {
            workers: 4,
            calls_per_worker: 50,
            ..Default::default()
        }
    }

    /// Creates a heavy load test config.
    ///
    /// 128 workers × 1000 calls; the report keeps every admitted call's
    /// latency in memory to compute percentiles.
    #[must_use]
    pub fn heavy() -> Self {
        Self {
            workers: 128,
            calls_per_worker: 1_000,
            ..Default::default()
        }
    }

    /// Creates a quick config for testing.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            workers: 4,
            calls_per_worker: 10,
            pause: None,
        }
    }

    /// Returns the number of calls the test issues in total.
    #[must_use]
    pub fn total_calls(&self) -> u64 {
        u64::from(self.workers) * u64::from(self.calls_per_worker)
    }
}

/// Shared counters for concurrent workers.
#[derive(Default)]
struct LoadMetrics {
    succeeded: AtomicU64,
    failed: AtomicU64,
    rejected: AtomicU64,
    cancelled: AtomicU64,
    invocations: AtomicU64,
    /// One entry per admitted call, kept for exact percentiles. Memory grows
    /// with the run: `heavy()` holds up to 128k samples (about 1 MiB).
    latencies_us: Mutex<Vec<u64>>,
}

impl LoadMetrics {
    fn record(&self, outcome: CallOutcome, latency_us: u64) {
        let counter = match outcome {
            CallOutcome::Succeeded => &self.succeeded,
            CallOutcome::Failed => &self.failed,
            CallOutcome::Rejected => &self.rejected,
            CallOutcome::Cancelled => &self.cancelled,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        if outcome.was_admitted() {
            self.latencies_us.lock().push(latency_us);
        }
    }
}

/// Call handler type.
///
/// Takes a worker id and call id and returns true for success.
pub type CallHandler = Arc<dyn Fn(u32, u64) -> bool + Send + Sync>;

/// Drives concurrent calls through a shared breaker.
pub struct LoadTester {
    config: LoadTestConfig,
    handler: Option<CallHandler>,
    injector: Option<Arc<FaultInjector>>,
    ctx: CallContext,
}

impl LoadTester {
    /// Creates a new load tester.
    #[must_use]
    pub fn new(config: LoadTestConfig) -> Self {
        Self {
            config,
            handler: None,
            injector: None,
            ctx: CallContext::background(),
        }
    }

    /// Sets a custom call handler.
    #[must_use]
    pub fn with_handler(mut self, handler: CallHandler) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Routes every admitted call through a fault injector.
    ///
    /// The injector runs after the handler, when both are set.
    #[must_use]
    pub fn with_injector(mut self, injector: Arc<FaultInjector>) -> Self {
        self.injector = Some(injector);
        self
    }

    /// Sets the context every call is made with.
    #[must_use]
    pub fn with_context(mut self, ctx: CallContext) -> Self {
        self.ctx = ctx;
        self
    }

    /// Runs the load test against `breaker`.
    ///
    /// # Errors
    /// Returns an error if a worker task panics or is cancelled.
    pub async fn run(&self, breaker: Arc<CircuitBreaker>) -> Result<LoadTestReport> {
        tracing::info!(
            breaker = %breaker.name(),
            workers = self.config.workers,
            calls_per_worker = self.config.calls_per_worker,
            "starting load test"
        );

        let metrics = Arc::new(LoadMetrics::default());
        let start_time = Instant::now();

        let mut handles = Vec::with_capacity(self.config.workers as usize);
        for worker_id in 0..self.config.workers {
            let breaker = Arc::clone(&breaker);
            let metrics = Arc::clone(&metrics);
            let handler = self.handler.clone();
            let injector = self.injector.clone();
            let ctx = self.ctx.clone();
            let calls = u64::from(self.config.calls_per_worker);
            let pause = self.config.pause;

            handles.push(tokio::spawn(async move {
                for call_id in 0..calls {
                    let started = Instant::now();
                    let result = breaker
                        .call_async(&ctx, || {
                            let metrics = Arc::clone(&metrics);
                            let handler = handler.clone();
                            let injector = injector.clone();
                            async move {
                                metrics.invocations.fetch_add(1, Ordering::Relaxed);
                                let ok = handler.as_ref().is_none_or(|h| h(worker_id, call_id));
                                if !ok {
                                    return Err(InjectedFault);
                                }
                                match injector {
                                    Some(injector) => injector.run_async(()).await,
                                    None => Ok(()),
                                }
                            }
                        })
                        .await;
                    let latency_us =
                        u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
                    metrics.record(CallOutcome::of(&result), latency_us);

                    if let Some(pause) = pause {
                        tokio::time::sleep(pause).await;
                    } else {
                        tokio::task::yield_now().await;
                    }
                }
            }));
        }

        for handle in handles {
            handle
                .await
                .map_err(|e| TestError::LoadTest(format!("worker failed: {e}")))?;
        }

        let elapsed = start_time.elapsed();

        let mut latencies = std::mem::take(&mut *metrics.latencies_us.lock());
        latencies.sort_unstable();

        let succeeded = metrics.succeeded.load(Ordering::Relaxed);
        let failed = metrics.failed.load(Ordering::Relaxed);
        let rejected = metrics.rejected.load(Ordering::Relaxed);
        let cancelled = metrics.cancelled.load(Ordering::Relaxed);
        let total_calls = succeeded + failed + rejected + cancelled;

        let throughput_rps = if elapsed.as_secs_f64() > 0.0 {
            total_calls as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        let report = LoadTestReport {
            total_calls,
            succeeded,
            failed,
            rejected,
            cancelled,
            invocations: metrics.invocations.load(Ordering::Relaxed),
            latency_p50_us: percentile(&latencies, 50),
            latency_p99_us: percentile(&latencies, 99),
            elapsed,
            throughput_rps,
        };

        tracing::info!(
            breaker = %breaker.name(),
            total = report.total_calls,
            succeeded = report.succeeded,
            failed = report.failed,
            rejected = report.rejected,
            final_state = %breaker.state(),
            throughput_rps = format!("{throughput_rps:.2}"),
            "load test completed"
        );

        Ok(report)
    }

    /// Returns the test config.
    #[must_use]
    pub const fn config(&self) -> &LoadTestConfig {
        &self.config
    }
}

impl Default for LoadTester {
    fn default() -> Self {
        Self::new(LoadTestConfig::default())
    }
}

/// Computes a percentile from a sorted slice.
fn percentile(sorted: &[u64], p: usize) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let idx = (sorted.len() * p / 100).min(sorted.len() - 1);
    sorted[idx]
}

/// Load test report.
#[derive(Debug, Clone)]
pub struct LoadTestReport {
    /// Calls issued.
    pub total_calls: u64,
    /// Admitted calls whose operation succeeded.
    pub succeeded: u64,
    /// Admitted calls whose operation failed.
    pub failed: u64,
    /// Calls fast-failed by the breaker.
    pub rejected: u64,
    /// Calls refused because the context was done.
    pub cancelled: u64,
    /// Times the guarded operation actually ran.
    pub invocations: u64,
    /// P50 latency of admitted calls in microseconds.
    pub latency_p50_us: u64,
    /// P99 latency of admitted calls in microseconds.
    pub latency_p99_us: u64,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
    /// Calls per second.
    pub throughput_rps: f64,
}

impl LoadTestReport {
    /// Returns the number of calls the breaker admitted.
    #[must_use]
    pub const fn admitted(&self) -> u64 {
        self.succeeded + self.failed
    }

    /// Returns true if every admitted call ran its operation exactly once
    /// and no rejected call ran it at all.
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        self.invocations == self.admitted()
    }

    /// Returns the share of calls that were rejected (0.0 to 1.0).
    #[must_use]
    pub fn rejection_rate(&self) -> f64 {
        if self.total_calls > 0 {
            self.rejected as f64 / self.total_calls as f64
        } else {
            0.0
        }
    }

    /// Returns the share of calls that succeeded (0.0 to 1.0).
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        if self.total_calls > 0 {
            self.succeeded as f64 / self.total_calls as f64
        } else {
            0.0
        }
    }
}
