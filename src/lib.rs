//! Tripwire: Concurrency-Safe Circuit Breaker
//!
//! Part of the PAIML Sovereign AI Stack.
//!
//! # Quick Start
//!
//! ```rust
//! use tripwire::prelude::*;
//!
//! let breaker = CircuitBreaker::new(Config::new().with_name("inventory"));
//! let stock: Result<u32, BreakerError<std::io::Error>> =
//!     breaker.call(&CallContext::background(), || Ok(42));
//! assert_eq!(stock.unwrap(), 42);
//! assert_eq!(breaker.state(), State::Closed);
//! ```

pub use tripwire_core as core;
pub use tripwire_observe as observe;

/// Prelude module for common imports.
pub mod prelude {
    pub use tripwire_core::{
        BreakerError, BreakerSettings, CallContext, CircuitBreaker, Clock, Config, ContextError,
        Metrics, State, StateChangeHook, Transition, TripPredicate, trip,
    };
    pub use tripwire_observe::{
        BreakerReport, TransitionEvent, TransitionFeed, TransitionLog, compose, tracing_hook,
    };
}
