//! Falsification Tests: Category B - Admission and Fast-Fail (F021-F035)
//!
//! # Toyota Way: Andon (行灯)
//! An open breaker signals the problem immediately instead of letting
//! callers wait on a dependency that is known to be down.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use tripwire_core::{
    BreakerError, CallContext, CircuitBreaker, Config, ContextError, ManualClock, State,
};
use tripwire_test::{BreakerHarness, CallOutcome};

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("upstream error: {0}")]
struct UpstreamError(&'static str);

// =============================================================================
// F021-F025: Fast-fail
// =============================================================================

/// F021: The call after the trip is rejected without invoking the operation
///
/// # Falsification Attempt
/// Count invocations inside the operation; the count must not move.
#[test]
fn f021_fast_fail_skips_operation() {
    let h = BreakerHarness::new();
    h.trip().unwrap();
    let pre_trip = h.invocations();

    for _ in 0..25 {
        assert_eq!(h.succeed(), CallOutcome::Rejected, "F021 FALSIFIED: Open admitted a call");
    }
    assert_eq!(h.invocations(), pre_trip, "F021 FALSIFIED: operation ran while Open");
}

/// F022: The rejection is the open-circuit error
#[test]
fn f022_rejection_is_open_error() {
    let cb = CircuitBreaker::default();
    let ctx = CallContext::background();
    for _ in 0..5 {
        let _: Result<(), _> = cb.call(&ctx, || Err(UpstreamError("down")));
    }
    let result: Result<(), BreakerError<UpstreamError>> = cb.call(&ctx, || Ok(()));
    let err = result.unwrap_err();
    assert!(matches!(err, BreakerError::Open), "F022 FALSIFIED: wrong rejection {err:?}");
    assert!(err.is_rejected());
    assert_eq!(err.to_string(), "circuit breaker is open");
}

/// F023: The too-many-requests error is never produced
///
/// # Falsification Attempt
/// Run many half-open probes with a large trial budget and look for it.
#[test]
fn f023_too_many_requests_unreachable() {
    let clock = ManualClock::new();
    let cb = CircuitBreaker::with_clock(
        Config::new().with_max_requests(1_000),
        Arc::new(clock.clone()),
    );
    let ctx = CallContext::background();
    for _ in 0..5 {
        let _: Result<(), _> = cb.call(&ctx, || Err(UpstreamError("down")));
    }
    clock.advance(Duration::from_secs(31));

    for _ in 0..500 {
        let result: Result<(), BreakerError<UpstreamError>> = cb.call(&ctx, || Ok(()));
        assert!(
            !matches!(result, Err(BreakerError::TooManyRequests)),
            "F023 FALSIFIED: half-open concurrency cap applied"
        );
    }
    assert_eq!(cb.state(), State::HalfOpen);
}

/// F024: HalfOpen admits every caller until a trial resolves it
#[test]
fn f024_half_open_admits_all() {
    let h = BreakerHarness::builder().with_max_requests(10).build();
    h.trip().unwrap();
    h.advance_past_timeout();
    for i in 0..9 {
        assert_eq!(h.succeed(), CallOutcome::Succeeded, "F024 FALSIFIED: trial {i} rejected");
    }
    assert_eq!(h.state(), State::HalfOpen);
}

/// F025: Exactly one caller performs the Open → HalfOpen transition
#[test]
fn f025_single_half_open_transition() {
    let h = BreakerHarness::builder().with_max_requests(100).build();
    h.trip().unwrap();
    h.advance_past_timeout();
    for _ in 0..10 {
        h.succeed();
    }
    assert_eq!(
        h.log().count(State::Open, State::HalfOpen),
        1,
        "F025 FALSIFIED: HalfOpen entered more than once"
    );
}

// =============================================================================
// F026-F030: Context handling
// =============================================================================

/// F026: A cancelled context fails before admission
#[test]
fn f026_cancelled_context_short_circuits() {
    let cb = CircuitBreaker::default();
    let invoked = AtomicU32::new(0);
    let ctx = CallContext::background();
    ctx.cancel();

    let result: Result<(), BreakerError<UpstreamError>> = cb.call(&ctx, || {
        invoked.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    assert!(
        matches!(result, Err(BreakerError::Context(ContextError::Canceled))),
        "F026 FALSIFIED: cancelled context not reported"
    );
    assert_eq!(invoked.load(Ordering::SeqCst), 0, "F026 FALSIFIED: operation ran");
    assert!(cb.metrics().is_empty(), "F026 FALSIFIED: cancelled call was counted");
}

/// F027: An expired deadline fails before admission
#[test]
fn f027_expired_deadline_short_circuits() {
    let cb = CircuitBreaker::default();
    let ctx = CallContext::background().with_deadline(Instant::now());
    std::thread::sleep(Duration::from_millis(2));

    let result: Result<(), BreakerError<UpstreamError>> = cb.call(&ctx, || Ok(()));
    assert!(
        matches!(result, Err(BreakerError::Context(ContextError::DeadlineExceeded))),
        "F027 FALSIFIED: expired deadline not reported"
    );
}

/// F028: A done context is reported even while the breaker is Open
#[test]
fn f028_context_checked_before_open() {
    let h = BreakerHarness::new();
    h.trip().unwrap();
    let ctx = CallContext::background();
    ctx.cancel();
    assert_eq!(
        h.call_with(&ctx, true),
        CallOutcome::Cancelled,
        "F028 FALSIFIED: open rejection shadowed the context error"
    );
}

/// F029: A done context does not consume the half-open probe
#[test]
fn f029_context_error_leaves_open_untouched() {
    let h = BreakerHarness::new();
    h.trip().unwrap();
    h.advance_past_timeout();
    let ctx = CallContext::background();
    ctx.cancel();
    h.call_with(&ctx, true);
    assert_eq!(h.state(), State::Open, "F029 FALSIFIED: cancelled call moved the state");
}

/// F030: Cancelling a parent context cancels calls made with a child
#[test]
fn f030_child_context_inherits_cancel() {
    let parent = CallContext::background();
    let child = parent.child();
    parent.cancel();
    let h = BreakerHarness::new();
    assert_eq!(h.call_with(&child, true), CallOutcome::Cancelled, "F030 FALSIFIED");
}

// =============================================================================
// F031-F035: Result passthrough
// =============================================================================

/// F031: The operation's value is returned unchanged
#[test]
fn f031_value_passthrough() {
    let cb = CircuitBreaker::default();
    let result: Result<Vec<u8>, BreakerError<UpstreamError>> =
        cb.call(&CallContext::background(), || Ok(vec![1, 2, 3]));
    assert_eq!(result.unwrap(), vec![1, 2, 3], "F031 FALSIFIED: value altered");
}

/// F032: The operation's error is returned unchanged
#[test]
fn f032_error_passthrough() {
    let cb = CircuitBreaker::default();
    let result: Result<(), _> = cb.call(&CallContext::background(), || {
        Err(UpstreamError("connection reset"))
    });
    assert_eq!(
        result.unwrap_err().into_operation(),
        Some(UpstreamError("connection reset")),
        "F032 FALSIFIED: error altered"
    );
}

/// F033: Any error counts as a failure whatever the value type
#[test]
fn f033_error_classification() {
    let cb = CircuitBreaker::default();
    let ctx = CallContext::background();
    let _: Result<Option<u32>, _> = cb.call(&ctx, || Err(UpstreamError("x")));
    let _: Result<Option<u32>, BreakerError<UpstreamError>> = cb.call(&ctx, || Ok(None));
    let m = cb.metrics();
    assert_eq!((m.failures, m.successes), (1, 1), "F033 FALSIFIED: misclassified");
}

/// F034: The async path enforces the same fast-fail
#[test]
fn f034_async_fast_fail() {
    let cb = CircuitBreaker::default();
    let ctx = CallContext::background();
    let invoked = AtomicU32::new(0);

    tokio_test::block_on(async {
        for _ in 0..5 {
            let _: Result<(), _> = cb
                .call_async(&ctx, || async { Err(UpstreamError("down")) })
                .await;
        }
        let result: Result<(), BreakerError<UpstreamError>> = cb
            .call_async(&ctx, || async {
                invoked.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(BreakerError::Open)), "F034 FALSIFIED");
    });
    assert_eq!(invoked.load(Ordering::SeqCst), 0, "F034 FALSIFIED: operation ran");
}

/// F035: The breaker imposes no timeout of its own on the operation
#[test]
fn f035_no_operation_timeout() {
    let cb = CircuitBreaker::new(Config::new().with_timeout(Duration::from_millis(1)));
    let result: Result<&str, BreakerError<UpstreamError>> =
        cb.call(&CallContext::background(), || {
            std::thread::sleep(Duration::from_millis(20));
            Ok("slow but fine")
        });
    assert_eq!(result.unwrap(), "slow but fine", "F035 FALSIFIED: slow call aborted");
    assert_eq!(cb.state(), State::Closed);
}
