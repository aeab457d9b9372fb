//! Circuit breaker states.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Circuit breaker state.
///
/// A breaker is in exactly one state at any instant. There is no terminal
/// state; the machine cycles `Closed → Open → HalfOpen → Closed` indefinitely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum State {
    /// Circuit is closed (requests flow through).
    #[default]
    Closed,
    /// Circuit is open (requests fast-fail).
    Open,
    /// Circuit is half-open (a limited trial probes recovery).
    HalfOpen,
}

impl State {
    /// Returns true if the circuit is closed.
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Returns true if the circuit is open.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }

    /// Returns true if the circuit is half-open.
    #[must_use]
    pub const fn is_half_open(self) -> bool {
        matches!(self, Self::HalfOpen)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Closed => "Closed",
            Self::Open => "Open",
            Self::HalfOpen => "Half-Open",
        };
        f.write_str(s)
    }
}

/// A single state change, `from → to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transition {
    /// State before the change.
    pub from: State,
    /// State after the change.
    pub to: State,
}

impl Transition {
    /// Creates a transition.
    #[must_use]
    pub const fn new(from: State, to: State) -> Self {
        Self { from, to }
    }

    /// Returns true if this is a trip (`Closed → Open`).
    #[must_use]
    pub const fn is_trip(self) -> bool {
        matches!((self.from, self.to), (State::Closed, State::Open))
    }

    /// Returns true if this is a recovery (`HalfOpen → Closed`).
    #[must_use]
    pub const fn is_recovery(self) -> bool {
        matches!((self.from, self.to), (State::HalfOpen, State::Closed))
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}
