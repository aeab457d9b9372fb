//! Falsification Tests: Category A - State Machine (F001-F020)
//!
//! # Toyota Way: Jidoka (自働化)
//! The breaker stops the line on failure and restarts it only after a
//! successful probe.

use std::time::Duration;

use tripwire_core::{State, trip};
use tripwire_test::{BreakerHarness, CallOutcome};

// =============================================================================
// F001-F005: Closed state
// =============================================================================

/// F001: A fresh breaker starts Closed
#[test]
fn f001_initial_state_closed() {
    let h = BreakerHarness::new();
    assert_eq!(h.state(), State::Closed, "F001 FALSIFIED: not Closed at start");
    assert!(h.metrics().is_empty(), "F001 FALSIFIED: metrics not zero at start");
}

/// F002: Successes never move a Closed breaker
///
/// # Falsification Attempt
/// Issue many successes and check state and streak after each.
#[test]
fn f002_closed_stable_under_successes() {
    let h = BreakerHarness::new();
    for i in 0..500 {
        assert_eq!(h.succeed(), CallOutcome::Succeeded);
        assert_eq!(h.state(), State::Closed, "F002 FALSIFIED: left Closed at call {i}");
        assert_eq!(
            h.metrics().consecutive_failures,
            0,
            "F002 FALSIFIED: failure streak moved on success"
        );
    }
}

/// F003: Four failures are not enough under the default policy
#[test]
fn f003_below_threshold_stays_closed() {
    let h = BreakerHarness::new();
    for _ in 0..4 {
        h.fail();
    }
    assert_eq!(h.state(), State::Closed, "F003 FALSIFIED: tripped below threshold");
}

/// F004: The fifth consecutive failure trips the breaker and is itself
/// executed
#[test]
fn f004_fifth_failure_trips_and_runs() {
    let h = BreakerHarness::new();
    for _ in 0..4 {
        h.fail();
    }
    assert_eq!(h.fail(), CallOutcome::Failed, "F004 FALSIFIED: 5th call not executed");
    assert_eq!(h.invocations(), 5, "F004 FALSIFIED: 5th operation not invoked");
    assert_eq!(h.state(), State::Open, "F004 FALSIFIED: not Open after 5th failure");
}

/// F005: A success in the middle of a failure run resets the streak
#[test]
fn f005_success_breaks_failure_streak() {
    let h = BreakerHarness::new();
    for _ in 0..4 {
        h.fail();
    }
    h.succeed();
    for _ in 0..4 {
        h.fail();
    }
    assert_eq!(h.state(), State::Closed, "F005 FALSIFIED: non-consecutive failures tripped");
    assert_eq!(h.metrics().failures, 8);
}

// =============================================================================
// F006-F010: Open → HalfOpen
// =============================================================================

/// F006: The breaker stays Open until the timeout has passed
#[test]
fn f006_open_until_timeout() {
    let h = BreakerHarness::new();
    h.trip().unwrap();
    h.advance(Duration::from_secs(29));
    assert_eq!(h.succeed(), CallOutcome::Rejected, "F006 FALSIFIED: admitted early");
    assert_eq!(h.state(), State::Open);
}

/// F007: Exactly at the timeout boundary the breaker still rejects
#[test]
fn f007_timeout_boundary_rejects() {
    let h = BreakerHarness::new();
    h.trip().unwrap();
    h.advance(Duration::from_secs(30));
    assert_eq!(
        h.succeed(),
        CallOutcome::Rejected,
        "F007 FALSIFIED: admitted at elapsed == timeout"
    );
}

/// F008: After the timeout, the next call runs while the breaker is HalfOpen
#[test]
fn f008_recovery_probe_runs_half_open() {
    let h = BreakerHarness::builder().with_max_requests(2).build();
    h.trip().unwrap();
    let before = h.invocations();
    h.advance_past_timeout();

    let (outcome, seen) = h.probe(true);
    assert_eq!(outcome, CallOutcome::Succeeded, "F008 FALSIFIED: probe not admitted");
    assert_eq!(h.invocations(), before + 1, "F008 FALSIFIED: probe not invoked");
    assert_eq!(seen, Some(State::HalfOpen), "F008 FALSIFIED: probe did not see HalfOpen");
}

/// F009: Rejections while Open do not extend the timeout
#[test]
fn f009_rejections_do_not_reset_timer() {
    let h = BreakerHarness::new();
    h.trip().unwrap();
    for _ in 0..10 {
        h.advance(Duration::from_secs(3));
        h.succeed();
    }
    h.advance(Duration::from_millis(1));
    assert_eq!(h.succeed(), CallOutcome::Succeeded, "F009 FALSIFIED: timer was reset");
}

/// F010: A custom timeout is honored
#[test]
fn f010_custom_timeout() {
    let h = BreakerHarness::builder()
        .with_timeout(Duration::from_millis(200))
        .build();
    h.trip().unwrap();
    h.advance(Duration::from_millis(201));
    assert_eq!(h.succeed(), CallOutcome::Succeeded, "F010 FALSIFIED: custom timeout ignored");
}

// =============================================================================
// F011-F015: HalfOpen resolution
// =============================================================================

/// F011: One failure during HalfOpen reopens and resets the trial counter
#[test]
fn f011_half_open_failure_reopens() {
    let h = BreakerHarness::builder().with_max_requests(3).build();
    h.trip().unwrap();
    h.advance_past_timeout();
    h.succeed();
    assert_eq!(h.breaker().half_open_requests(), 1);

    assert_eq!(h.fail(), CallOutcome::Failed);
    assert_eq!(h.state(), State::Open, "F011 FALSIFIED: not reopened");
    assert_eq!(
        h.breaker().half_open_requests(),
        0,
        "F011 FALSIFIED: trial counter not reset"
    );
}

/// F012: Two of three trial successes leave the breaker HalfOpen
#[test]
fn f012_partial_trial_stays_half_open() {
    let h = BreakerHarness::builder().with_max_requests(3).build();
    h.trip().unwrap();
    h.advance_past_timeout();
    h.succeed();
    h.succeed();
    assert_eq!(h.state(), State::HalfOpen, "F012 FALSIFIED: closed early");
}

/// F013: Three of three trial successes close the breaker and zero metrics
#[test]
fn f013_full_trial_closes_and_resets() {
    let h = BreakerHarness::builder().with_max_requests(3).build();
    h.trip().unwrap();
    h.advance_past_timeout();
    for _ in 0..3 {
        h.succeed();
    }
    assert_eq!(h.state(), State::Closed, "F013 FALSIFIED: not closed");
    assert!(h.metrics().is_empty(), "F013 FALSIFIED: metrics not reset");
    assert_eq!(h.breaker().half_open_requests(), 0);
}

/// F014: A reopened breaker waits a full timeout again
#[test]
fn f014_reopen_restarts_timeout() {
    let h = BreakerHarness::new();
    h.trip().unwrap();
    h.advance_past_timeout();
    h.fail();
    assert_eq!(h.state(), State::Open);

    h.advance(Duration::from_secs(10));
    assert_eq!(h.succeed(), CallOutcome::Rejected, "F014 FALSIFIED: timer not restarted");
    h.advance(Duration::from_secs(21));
    assert_eq!(h.succeed(), CallOutcome::Succeeded);
}

/// F015: The breaker cycles indefinitely
#[test]
fn f015_machine_has_no_terminal_state() {
    let h = BreakerHarness::new();
    for cycle in 0..20 {
        h.trip().unwrap();
        h.advance_past_timeout();
        h.succeed();
        assert_eq!(h.state(), State::Closed, "F015 FALSIFIED: stuck on cycle {cycle}");
    }
    assert_eq!(h.log().count(State::Closed, State::Open), 20);
}

// =============================================================================
// F016-F020: Trip predicates
// =============================================================================

/// F016: A ratio predicate ignores streaks and trips on the ratio
#[test]
fn f016_failure_ratio_predicate() {
    let h = BreakerHarness::builder()
        .with_ready_to_trip(trip::failure_ratio(10, 0.5))
        .build();
    for _ in 0..5 {
        h.succeed();
        h.fail();
    }
    assert_eq!(h.state(), State::Open, "F016 FALSIFIED: 50% of 10 did not trip");
    assert_eq!(h.metrics().consecutive_failures, 1);
}

/// F017: The ratio predicate needs its minimum sample size
#[test]
fn f017_failure_ratio_minimum_requests() {
    let h = BreakerHarness::builder()
        .with_ready_to_trip(trip::failure_ratio(10, 0.5))
        .build();
    for _ in 0..9 {
        h.fail();
    }
    assert_eq!(h.state(), State::Closed, "F017 FALSIFIED: tripped below sample size");
    h.fail();
    assert_eq!(h.state(), State::Open);
}

/// F018: The predicate is only consulted on failure
#[test]
fn f018_predicate_not_consulted_on_success() {
    let h = BreakerHarness::builder()
        .with_ready_to_trip(std::sync::Arc::new(|_: &tripwire_core::Metrics| true))
        .build();
    for _ in 0..50 {
        h.succeed();
    }
    assert_eq!(h.state(), State::Closed, "F018 FALSIFIED: success tripped the breaker");
    h.fail();
    assert_eq!(h.state(), State::Open);
}

/// F019: A threshold of one opens on the first failure
#[test]
fn f019_single_failure_threshold() {
    let h = BreakerHarness::builder()
        .with_ready_to_trip(trip::consecutive_failures(1))
        .build();
    assert_eq!(h.trip().unwrap(), 1, "F019 FALSIFIED: needed more than one failure");
}

/// F020: HalfOpen failures reopen regardless of the predicate
#[test]
fn f020_half_open_ignores_predicate() {
    let h = BreakerHarness::builder()
        .with_ready_to_trip(trip::consecutive_failures(100))
        .with_max_requests(5)
        .build();
    h.trip().unwrap();
    h.advance_past_timeout();
    h.succeed();
    h.fail();
    assert_eq!(h.state(), State::Open, "F020 FALSIFIED: predicate consulted in HalfOpen");
}
