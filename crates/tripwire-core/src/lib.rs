// Allow unwrap/expect/panic in tests for clear failure messages
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # tripwire-core
//!
//! A concurrency-safe circuit breaker: a guard that wraps a fallible
//! operation, tracks the health of the dependency behind it, and fast-fails
//! while that dependency is unhealthy.
//!
//! This crate provides:
//! - [`CircuitBreaker`]: the `Closed`/`Open`/`HalfOpen` state machine and
//!   execution guard
//! - [`Config`] and [`BreakerSettings`]: programmatic and TOML configuration
//! - [`CallContext`]: cancellation and deadlines checked before admission
//! - [`Metrics`]: counters for the current observation window
//! - [`Clock`]: injectable time source ([`ManualClock`] for tests)
//!
//! The breaker does not retry, time out, or rate-limit; those belong to the
//! caller's layer.
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use tripwire_core::{BreakerError, CallContext, CircuitBreaker, Config, State};
//!
//! let breaker = CircuitBreaker::new(
//!     Config::new()
//!         .with_name("inventory")
//!         .with_timeout(Duration::from_secs(10)),
//! );
//! let ctx = CallContext::background();
//!
//! let stock: Result<u32, BreakerError<std::io::Error>> = breaker.call(&ctx, || Ok(42));
//! assert_eq!(stock.unwrap(), 42);
//! assert_eq!(breaker.state(), State::Closed);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod breaker;
pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod metrics;
pub mod state;

pub use breaker::CircuitBreaker;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{BreakerSettings, Config, StateChangeHook, TripPredicate, trip};
pub use context::{CallContext, ContextError};
pub use error::{BreakerError, ConfigError, Result};
pub use metrics::Metrics;
pub use state::{State, Transition};
