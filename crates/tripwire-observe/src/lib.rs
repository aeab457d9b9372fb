// Allow unwrap/expect in tests for clear failure messages
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # tripwire-observe
//!
//! Observability for Tripwire circuit breakers, built on the breaker's
//! state-change hook.
//!
//! This crate provides:
//! - **Hooks**: `tracing` logging of transitions and hook composition
//! - **History**: bounded ring buffer of recent transitions
//! - **Feed**: broadcast channel that decouples consumers from the breaker lock
//! - **Reports**: serializable point-in-time breaker status
//!
//! ## Example
//!
//! ```rust
//! use tripwire_core::{CircuitBreaker, Config};
//! use tripwire_observe::{compose, tracing_hook, BreakerReport, TransitionLog};
//!
//! let log = TransitionLog::default();
//! let breaker = CircuitBreaker::new(
//!     Config::new()
//!         .with_name("billing")
//!         .with_hook(compose(vec![tracing_hook(), log.hook()])),
//! );
//!
//! let report = BreakerReport::capture(&breaker);
//! assert!(report.is_healthy());
//! assert!(log.is_empty());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod event;
pub mod feed;
pub mod history;
pub mod hooks;
pub mod report;

pub use error::{ObserveError, Result};
pub use event::TransitionEvent;
pub use feed::{TransitionFeed, TransitionSubscriber};
pub use history::TransitionLog;
pub use hooks::{compose, tracing_hook};
pub use report::BreakerReport;
