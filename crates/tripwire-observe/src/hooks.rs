//! Ready-made state-change hooks.
//!
//! A breaker accepts a single hook; [`compose`] fans one transition out to
//! several. Hooks run under the breaker's write lock, so everything here is
//! short and non-blocking.

use std::sync::Arc;

use tripwire_core::{State, StateChangeHook};

/// Returns a hook that logs every transition through `tracing`.
///
/// Opening logs at `warn`, everything else at `info`. The breaker already
/// logs its own transitions under the `tripwire_core` target; this hook
/// emits under `tripwire_observe`, for setups that filter the core crate out
/// or want transitions as a separate event stream.
#[must_use]
pub fn tracing_hook() -> StateChangeHook {
    Arc::new(|name: &str, from: State, to: State| match to {
        State::Open => {
            tracing::warn!(breaker = name, %from, %to, "breaker state changed");
        }
        State::HalfOpen | State::Closed => {
            tracing::info!(breaker = name, %from, %to, "breaker state changed");
        }
    })
}

/// Returns a hook that calls each of `hooks` in order.
#[must_use]
pub fn compose(hooks: Vec<StateChangeHook>) -> StateChangeHook {
    Arc::new(move |name: &str, from: State, to: State| {
        for hook in &hooks {
            hook(name, from, to);
        }
    })
}
