//! Cross-thread publishing into an [`EventManager`](super::EventManager).
//!
//! The manager itself is confined to the thread that owns it. Other threads
//! get an [`EventSender`] instead: a crossbeam channel whose receiving end is
//! pumped by the owner at the start of every `drain_all`. Nothing on the
//! sending side touches dispatcher state.

use crossbeam_channel::Sender;

use super::error::BridgeError;
use super::priority::Priority;

/// `Send` handle for publishing events from other threads.
pub struct EventSender<E> {
    tx: Sender<(Priority, E)>,
}

impl<E> Clone for EventSender<E> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<E> EventSender<E> {
    pub(crate) fn new(tx: Sender<(Priority, E)>) -> Self {
        Self { tx }
    }

    /// Hand an event to the owning thread.
    ///
    /// `Realtime` events are dispatched when the owner next pumps the bridge,
    /// ahead of the buffered levels of that drain.
    pub fn publish(&self, event: E, priority: Priority) -> Result<(), BridgeError> {
        self.tx
            .send((priority, event))
            .map_err(|_| BridgeError::Disconnected)
    }

    pub fn publish_normal(&self, event: E) -> Result<(), BridgeError> {
        self.publish(event, Priority::Normal)
    }

    /// Events sent but not yet pumped by the owner.
    pub fn in_flight(&self) -> usize {
        self.tx.len()
    }
}
