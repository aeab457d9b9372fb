// Allow unwrap/expect in tests for clear failure messages
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # tripwire-test
//!
//! Testing infrastructure for Tripwire circuit breakers.
//!
//! This crate provides:
//! - **Harness**: breaker on a manual clock with a transition log and an
//!   invocation counter
//! - **Fault injection**: seeded error and latency injection for a fake
//!   dependency
//! - **Load testing**: concurrent tokio workers against a shared breaker
//! - **Falsification tests**: Popperian tests that try to refute each
//!   breaker guarantee
//!
//! ## Example
//!
//! ```rust
//! use tripwire_core::State;
//! use tripwire_test::{BreakerHarness, CallOutcome};
//!
//! let harness = BreakerHarness::builder().with_max_requests(2).build();
//! assert_eq!(harness.trip().unwrap(), 5);
//! assert_eq!(harness.succeed(), CallOutcome::Rejected);
//!
//! harness.advance_past_timeout();
//! assert_eq!(harness.succeed(), CallOutcome::Succeeded);
//! assert_eq!(harness.state(), State::HalfOpen);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod chaos;
pub mod error;
pub mod harness;
pub mod load;

pub use chaos::{FaultConfig, FaultInjector, InjectedFault};
pub use error::{Result, TestError};
pub use harness::{BreakerHarness, BreakerHarnessBuilder, CallOutcome};
pub use load::{CallHandler, LoadTestConfig, LoadTestReport, LoadTester};
