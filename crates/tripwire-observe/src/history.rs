//! Bounded transition history.
//!
//! # Toyota Way: Visual Management (目で見る管理)
//! Keep the recent state changes of a breaker visible for inspection.
//!
//! # Implementation
//! Ring buffer of [`TransitionEvent`]s: once `capacity` is reached the oldest
//! event is dropped. Recording is a short push under a mutex, safe to call
//! from a hook while the breaker holds its own lock.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tripwire_core::{State, StateChangeHook};

use crate::event::TransitionEvent;

/// Default number of events kept.
pub const DEFAULT_CAPACITY: usize = 256;

/// Shared, bounded log of breaker transitions.
///
/// Cloning is cheap; clones share the same buffer.
#[derive(Debug, Clone)]
pub struct TransitionLog {
    capacity: usize,
    events: Arc<Mutex<VecDeque<TransitionEvent>>>,
}

impl TransitionLog {
    /// Creates a log holding at most `capacity` events (at least 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            events: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
        }
    }

    /// Returns a hook that records into this log.
    #[must_use]
    pub fn hook(&self) -> StateChangeHook {
        let log = self.clone();
        Arc::new(move |name: &str, from: State, to: State| {
            log.record(TransitionEvent::now(name, from, to));
        })
    }

    /// Appends an event, evicting the oldest one when full.
    pub fn record(&self, event: TransitionEvent) {
        let mut events = self.events.lock();
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(event);
    }

    /// Returns the recorded events, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<TransitionEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Returns the most recent event.
    #[must_use]
    pub fn last(&self) -> Option<TransitionEvent> {
        self.events.lock().back().cloned()
    }

    /// Returns the `(from, to)` pairs, oldest first.
    #[must_use]
    pub fn transitions(&self) -> Vec<(State, State)> {
        self.events
            .lock()
            .iter()
            .map(|e| (e.from(), e.to()))
            .collect()
    }

    /// Counts recorded `from → to` transitions.
    #[must_use]
    pub fn count(&self, from: State, to: State) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| e.from() == from && e.to() == to)
            .count()
    }

    /// Returns the number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Returns the capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drops every recorded event.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl Default for TransitionLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
