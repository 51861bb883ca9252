//! Error types for the event dispatcher.

use thiserror::Error;

use super::listeners::ListenerId;

/// Error a listener may return to signal it could not handle an event.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Return type of every listener callback.
pub type ListenerResult = Result<(), ListenerError>;

/// Errors raised by [`EventManager`](super::EventManager) operations.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// `unsubscribe` was called with a kind/id pair that is not registered.
    #[error("listener {id} is not registered for {kind}")]
    NotRegistered { kind: String, id: ListenerId },

    /// A listener failed while the manager runs with
    /// [`FaultPolicy::Propagate`](super::FaultPolicy::Propagate).
    #[error("listener {id} failed while handling {kind}")]
    ListenerFailed {
        kind: String,
        id: ListenerId,
        #[source]
        source: ListenerError,
    },

    /// `drain_all` was called from inside a listener during a drain.
    #[error("drain_all called while a drain is already running")]
    ReentrantDrain,
}

/// Errors raised by [`EventSender`](super::bridge::EventSender).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BridgeError {
    #[error("event manager has been dropped")]
    Disconnected,
}
