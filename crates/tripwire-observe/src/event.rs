//! Transition events.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use tripwire_core::{State, Transition};

/// One observed state transition of a named breaker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionEvent {
    /// Name of the breaker that changed state.
    pub breaker: String,
    /// The state change.
    pub transition: Transition,
    /// Wall-clock time the hook observed the change.
    pub at: SystemTime,
}

impl TransitionEvent {
    /// Creates an event stamped with the current time.
    #[must_use]
    pub fn now(breaker: &str, from: State, to: State) -> Self {
        Self {
            breaker: breaker.to_string(),
            transition: Transition::new(from, to),
            at: SystemTime::now(),
        }
    }

    /// Returns the state before the change.
    #[must_use]
    pub const fn from(&self) -> State {
        self.transition.from
    }

    /// Returns the state after the change.
    #[must_use]
    pub const fn to(&self) -> State {
        self.transition.to
    }
}
