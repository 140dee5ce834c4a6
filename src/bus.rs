//! Typed publish/subscribe bus
//!
//! Decouples publishers (toolbars, sync controllers) from consumers (the active
//! graph view, banners). Built on a tokio broadcast channel: every live
//! subscription sees each message once, and dropping a [`Subscription`]
//! unsubscribes it.

use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{debug, warn};

/// Default number of buffered messages per subscriber
pub const DEFAULT_BUS_CAPACITY: usize = 64;

/// A cloneable handle to a bus carrying messages of type `M`
#[derive(Debug)]
pub struct EventBus<M> {
    sender: broadcast::Sender<M>,
}

impl<M> Clone for EventBus<M> {
    fn clone(&self) -> Self {
        Self { sender: self.sender.clone() }
    }
}

impl<M: Clone + Send + std::fmt::Debug + 'static> EventBus<M> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUS_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish a message. Returns how many subscriptions it was delivered to;
    /// publishing with nobody listening is not an error.
    pub fn publish(&self, message: M) -> usize {
        match self.sender.send(message) {
            Ok(receivers) => receivers,
            Err(broadcast::error::SendError(message)) => {
                debug!(?message, "no subscribers for bus message");
                0
            }
        }
    }

    pub fn subscribe(&self) -> Subscription<M> {
        Subscription { receiver: self.sender.subscribe() }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<M: Clone + Send + std::fmt::Debug + 'static> Default for EventBus<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// A live subscription. Released when dropped.
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: broadcast::Receiver<M>,
}

impl<M: Clone> Subscription<M> {
    /// Next pending message without waiting
    pub fn try_next(&mut self) -> Option<M> {
        loop {
            match self.receiver.try_recv() {
                Ok(message) => return Some(message),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "bus subscriber lagged, oldest messages dropped");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// All pending messages, oldest first
    pub fn drain(&mut self) -> Vec<M> {
        std::iter::from_fn(|| self.try_next()).collect()
    }

    /// Wait for the next message. `None` once every publisher is gone.
    pub async fn recv(&mut self) -> Option<M> {
        loop {
            match self.receiver.recv().await {
                Ok(message) => return Some(message),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "bus subscriber lagged, oldest messages dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
