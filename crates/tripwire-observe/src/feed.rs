//! Decoupled transition feed.
//!
//! The breaker runs its hook inline under its write lock. A [`TransitionFeed`]
//! hook only enqueues the event on a broadcast channel, so subscribers can do
//! arbitrary work, including calling back into the breaker, on their own task.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tripwire_core::{State, StateChangeHook};

use crate::error::{ObserveError, Result};
use crate::event::TransitionEvent;

/// Default channel capacity.
pub const DEFAULT_FEED_CAPACITY: usize = 256;

/// Broadcast feed of breaker transitions.
#[derive(Debug, Clone)]
pub struct TransitionFeed {
    event_tx: broadcast::Sender<TransitionEvent>,
}

impl TransitionFeed {
    /// Creates a feed buffering up to `capacity` events per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (event_tx, _) = broadcast::channel(capacity.max(1));
        Self { event_tx }
    }

    /// Returns a hook that publishes into this feed.
    ///
    /// Events published while nobody is subscribed are dropped.
    #[must_use]
    pub fn hook(&self) -> StateChangeHook {
        let event_tx = self.event_tx.clone();
        Arc::new(move |name: &str, from: State, to: State| {
            let _ = event_tx.send(TransitionEvent::now(name, from, to));
        })
    }

    /// Subscribes to events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> TransitionSubscriber {
        TransitionSubscriber {
            event_rx: self.event_tx.subscribe(),
        }
    }

    /// Returns the number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.event_tx.receiver_count()
    }
}

impl Default for TransitionFeed {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}

/// Receiving end of a [`TransitionFeed`].
#[derive(Debug)]
pub struct TransitionSubscriber {
    event_rx: broadcast::Receiver<TransitionEvent>,
}

impl TransitionSubscriber {
    /// Waits for the next event.
    ///
    /// # Errors
    /// Returns [`ObserveError::Lagged`] if events were dropped because this
    /// subscriber fell behind, or [`ObserveError::FeedClosed`] once the feed
    /// and all its hooks are gone.
    pub async fn recv(&mut self) -> Result<TransitionEvent> {
        self.event_rx.recv().await.map_err(|e| match e {
            RecvError::Closed => ObserveError::FeedClosed,
            RecvError::Lagged(n) => ObserveError::Lagged(n),
        })
    }

    /// Returns the next event if one is queued.
    ///
    /// # Errors
    /// Same as [`recv`](Self::recv).
    pub fn try_recv(&mut self) -> Result<Option<TransitionEvent>> {
        match self.event_rx.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Closed) => Err(ObserveError::FeedClosed),
            Err(TryRecvError::Lagged(n)) => Err(ObserveError::Lagged(n)),
        }
    }
}
