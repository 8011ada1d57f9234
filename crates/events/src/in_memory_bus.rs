//! Channel-backed bus for a single process.

use std::sync::mpsc::{self, Sender};
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

use crate::bus::{EventBus, Subscription};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InMemoryBusError {
    /// A thread panicked while delivering; the subscriber list can no longer
    /// be trusted to be complete.
    #[error("event bus lock poisoned")]
    Poisoned,
}

/// Fans every published message out to each live subscription over an
/// `mpsc` channel. Subscriptions whose receiver was dropped are forgotten on
/// the next publish.
#[derive(Debug)]
pub struct InMemoryEventBus<M> {
    senders: Mutex<Vec<Sender<M>>>,
}

impl<M> InMemoryEventBus<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscriptions still registered. Dropped ones count until the next
    /// publish notices them.
    pub fn subscriber_count(&self) -> usize {
        self.senders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl<M> Default for InMemoryEventBus<M> {
    fn default() -> Self {
        Self {
            senders: Mutex::new(Vec::new()),
        }
    }
}

impl<M> EventBus<M> for InMemoryEventBus<M>
where
    M: Clone + Send + 'static,
{
    type Error = InMemoryBusError;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        let mut senders = self.senders.lock().map_err(|_| InMemoryBusError::Poisoned)?;

        let registered = senders.len();
        senders.retain(|tx| tx.send(message.clone()).is_ok());
        if senders.len() < registered {
            tracing::debug!(
                dropped = registered - senders.len(),
                live = senders.len(),
                "pruned closed subscriptions"
            );
        }

        Ok(())
    }

    fn subscribe(&self) -> Subscription<M> {
        let (tx, rx) = mpsc::channel();
        self.senders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        Subscription::new(rx)
    }
}
