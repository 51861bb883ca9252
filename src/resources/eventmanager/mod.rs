//! Priority-queued publish/subscribe event dispatcher.
//!
//! The [`EventManager`] decouples code that changes game state (tiles, the
//! world, the camera) from code that reacts to it (visualizers, counters).
//! Producers [`publish`](EventManager::publish) events; the host calls
//! [`drain_all`](EventManager::drain_all) once per tick, which delivers the
//! buffered events level by level:
//!
//! 1. [`Priority::Realtime`] is never buffered. It is delivered inside
//!    `publish`, to the listeners registered at that moment.
//! 2. [`Priority::High`], then [`Priority::Normal`], then [`Priority::Low`].
//!    Each level is fully drained before the next one starts.
//!
//! Within a level, events arrive in publish order. A drain only delivers the
//! events that were pending when it started; anything a listener publishes
//! to the same level waits for the next drain. A listener publishing to a
//! later level in the same tick is delivered in that tick.
//!
//! # Ownership
//!
//! `EventManager` is a cheap handle over shared state. Clone it into every
//! producer and consumer; all clones see the same buffers and listeners.
//! The handle is `!Send`. Other threads publish through an
//! [`EventSender`](bridge::EventSender) obtained from
//! [`bridge`](EventManager::bridge).
//!
//! # Example
//!
//! ```ignore
//! let events = EventManager::<GameEvent>::new();
//! events.subscribe(GameEventKind::TileTypeChanged, |event| {
//!     if let GameEvent::Tile(TileEvent::TypeChanged { tile, .. }) = event {
//!         info!("tile at ({}, {}) is now {:?}", tile.x, tile.y, tile.tile_type);
//!     }
//!     Ok(())
//! });
//! events.publish_normal(some_event)?;
//! events.drain_all()?;
//! ```

pub mod bridge;
pub mod error;
pub mod listeners;
pub mod priority;

use crossbeam_channel::{Receiver, Sender, unbounded};
use log::{debug, error, trace, warn};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::hash::Hash;
use std::rc::{Rc, Weak};
use std::str::FromStr;

pub use bridge::EventSender;
pub use error::{BridgeError, DispatchError, ListenerError, ListenerResult};
pub use listeners::{Listener, ListenerId};
pub use priority::Priority;

use listeners::ListenerRegistry;

/// A value that can travel through the dispatcher.
///
/// `Kind` is the key listeners subscribe to; the event value itself carries
/// the payload. With an enum per event family the payload type of each kind
/// is fixed at compile time.
pub trait Event: fmt::Debug + 'static {
    type Kind: Copy + Eq + Hash + fmt::Debug + 'static;

    fn kind(&self) -> Self::Kind;
}

/// What a drain does when a listener returns `Err`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaultPolicy {
    /// Log the failure and keep dispatching.
    #[default]
    Isolate,
    /// Stop the drain and return the error to the caller.
    Propagate,
}

impl FromStr for FaultPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "isolate" => Ok(FaultPolicy::Isolate),
            "propagate" => Ok(FaultPolicy::Propagate),
            other => Err(format!("Unknown fault policy '{}'", other)),
        }
    }
}

const DEFAULT_PENDING_WARN_THRESHOLD: usize = 4096;

/// Dispatcher settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchConfig {
    pub fault_policy: FaultPolicy,
    /// Pending events per level before a warning is logged. A buffer this
    /// large usually means the host is not calling `drain_all`.
    pub pending_warn_threshold: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            fault_policy: FaultPolicy::default(),
            pending_warn_threshold: DEFAULT_PENDING_WARN_THRESHOLD,
        }
    }
}

/// Running counters, useful for logging at shutdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchStats {
    /// Events accepted by `publish`, all levels.
    pub published: u64,
    /// Of those, how many were realtime.
    pub realtime: u64,
    /// Events handed to at least one listener.
    pub delivered: u64,
    /// Events with no listener at dispatch time.
    pub dropped: u64,
    /// Listener calls that returned `Err`.
    pub failed: u64,
    /// Completed or aborted `drain_all` calls.
    pub drains: u64,
}

struct Level<E> {
    pending: Vec<E>,
    processing: VecDeque<E>,
    warned: bool,
}

impl<E> Default for Level<E> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
            processing: VecDeque::new(),
            warned: false,
        }
    }
}

type BridgeChannel<E> = (Sender<(Priority, E)>, Receiver<(Priority, E)>);

struct Inner<E: Event> {
    levels: [Level<E>; Priority::QUEUE_COUNT],
    listeners: ListenerRegistry<E>,
    config: DispatchConfig,
    stats: DispatchStats,
    draining: bool,
    bridge: Option<BridgeChannel<E>>,
}

/// Shared handle to one dispatcher.
pub struct EventManager<E: Event> {
    inner: Rc<RefCell<Inner<E>>>,
}

impl<E: Event> Clone for EventManager<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E: Event> Default for EventManager<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> fmt::Debug for EventManager<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        let pending: Vec<usize> = inner.levels.iter().map(|l| l.pending.len()).collect();
        f.debug_struct("EventManager")
            .field("pending", &pending)
            .field("listener_kinds", &inner.listeners.kind_count())
            .field("config", &inner.config)
            .field("stats", &inner.stats)
            .finish()
    }
}

/// Non-owning handle, for listeners that publish back into their own manager.
pub struct WeakEventManager<E: Event> {
    inner: Weak<RefCell<Inner<E>>>,
}

impl<E: Event> Clone for WeakEventManager<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<E: Event> WeakEventManager<E> {
    pub fn upgrade(&self) -> Option<EventManager<E>> {
        self.inner.upgrade().map(|inner| EventManager { inner })
    }
}

/// Marks the manager as draining for the lifetime of the guard.
struct DrainGuard<'a, E: Event> {
    inner: &'a RefCell<Inner<E>>,
}

impl<'a, E: Event> DrainGuard<'a, E> {
    fn enter(inner: &'a RefCell<Inner<E>>) -> Result<Self, DispatchError> {
        let mut state = inner.borrow_mut();
        if state.draining {
            warn!("drain_all called from inside a listener; ignoring");
            return Err(DispatchError::ReentrantDrain);
        }
        state.draining = true;
        state.stats.drains += 1;
        Ok(Self { inner })
    }
}

impl<E: Event> Drop for DrainGuard<'_, E> {
    fn drop(&mut self) {
        self.inner.borrow_mut().draining = false;
    }
}

impl<E: Event> EventManager<E> {
    /// Create a dispatcher with default settings.
    pub fn new() -> Self {
        Self::with_config(DispatchConfig::default())
    }

    pub fn with_config(config: DispatchConfig) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                levels: std::array::from_fn(|_| Level::default()),
                listeners: ListenerRegistry::default(),
                config,
                stats: DispatchStats::default(),
                draining: false,
                bridge: None,
            })),
        }
    }

    pub fn downgrade(&self) -> WeakEventManager<E> {
        WeakEventManager {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// True if both handles point at the same dispatcher.
    pub fn same_as(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn config(&self) -> DispatchConfig {
        self.inner.borrow().config
    }

    pub fn set_config(&self, config: DispatchConfig) {
        self.inner.borrow_mut().config = config;
    }

    pub fn stats(&self) -> DispatchStats {
        self.inner.borrow().stats
    }

    /// Publish an event.
    ///
    /// `Realtime` events are dispatched before this returns. Any other level
    /// is appended to that level's pending buffer and always returns `Ok`.
    /// Listeners may publish from inside their callback.
    pub fn publish(&self, event: E, priority: Priority) -> Result<(), DispatchError> {
        let Some(index) = priority.queue_index() else {
            {
                let mut inner = self.inner.borrow_mut();
                inner.stats.published += 1;
                inner.stats.realtime += 1;
            }
            return self.dispatch(&event);
        };

        let mut inner = self.inner.borrow_mut();
        inner.stats.published += 1;
        let threshold = inner.config.pending_warn_threshold;
        let level = &mut inner.levels[index];
        level.pending.push(event);
        if !level.warned && level.pending.len() >= threshold {
            level.warned = true;
            warn!(
                "{} pending {} events; is drain_all being called every tick?",
                level.pending.len(),
                priority
            );
        }
        Ok(())
    }

    /// Publish at [`Priority::Normal`].
    pub fn publish_normal(&self, event: E) -> Result<(), DispatchError> {
        self.publish(event, Priority::Normal)
    }

    /// Register `callback` for `kind`.
    ///
    /// Listeners for the same kind run in registration order. Registering the
    /// same closure twice gives two ids and two calls per event.
    pub fn subscribe<F>(&self, kind: E::Kind, callback: F) -> ListenerId
    where
        F: Fn(&E) -> ListenerResult + 'static,
    {
        let id = self.inner.borrow_mut().listeners.add(kind, Rc::new(callback));
        debug!("Subscribed listener {} to {:?}", id, kind);
        id
    }

    /// Remove one registration.
    ///
    /// The kind's registry entry disappears with its last listener. An
    /// unknown kind/id pair is an error, not a no-op.
    pub fn unsubscribe(&self, kind: E::Kind, id: ListenerId) -> Result<(), DispatchError> {
        if self.inner.borrow_mut().listeners.remove(kind, id) {
            debug!("Unsubscribed listener {} from {:?}", id, kind);
            Ok(())
        } else {
            Err(DispatchError::NotRegistered {
                kind: format!("{:?}", kind),
                id,
            })
        }
    }

    /// True if at least one listener is registered for `kind`.
    pub fn is_registered(&self, kind: E::Kind) -> bool {
        self.inner.borrow().listeners.contains(kind)
    }

    pub fn listener_count(&self, kind: E::Kind) -> usize {
        self.inner.borrow().listeners.len(kind)
    }

    /// Events waiting for the next drain of `level`. Always 0 for `Realtime`.
    pub fn pending_len(&self, level: Priority) -> usize {
        level
            .queue_index()
            .map_or(0, |i| self.inner.borrow().levels[i].pending.len())
    }

    /// Events moved into `level`'s processing queue and not yet dispatched.
    pub fn queued_len(&self, level: Priority) -> usize {
        level
            .queue_index()
            .map_or(0, |i| self.inner.borrow().levels[i].processing.len())
    }

    /// Sender for publishing from other threads. All senders share one channel.
    pub fn bridge(&self) -> EventSender<E> {
        let mut inner = self.inner.borrow_mut();
        let (tx, _) = inner.bridge.get_or_insert_with(unbounded);
        EventSender::new(tx.clone())
    }

    /// Deliver every buffered event: High, then Normal, then Low.
    ///
    /// Call once per tick. Events arriving through the bridge are taken in
    /// first. With [`FaultPolicy::Propagate`] the first listener error stops
    /// the drain; undelivered events of that level go back to the front of
    /// its pending buffer and later levels wait for the next call.
    pub fn drain_all(&self) -> Result<(), DispatchError> {
        let _guard = DrainGuard::enter(&self.inner)?;
        self.pump_bridge()?;
        for level in Priority::BUFFERED {
            self.drain_priority(level)?;
        }
        Ok(())
    }

    /// Drain one buffered level.
    ///
    /// An empty pending buffer returns immediately without touching the
    /// processing queue. Events published while this runs stay pending.
    pub(crate) fn drain_priority(&self, level: Priority) -> Result<(), DispatchError> {
        let Some(index) = level.queue_index() else {
            return Ok(());
        };

        {
            let mut inner = self.inner.borrow_mut();
            let slot = &mut inner.levels[index];
            if slot.pending.is_empty() {
                return Ok(());
            }
            let pending = std::mem::take(&mut slot.pending);
            slot.warned = false;
            debug!("Draining {} {} event(s)", pending.len(), level);
            slot.processing.extend(pending);
        }

        loop {
            let next = self.inner.borrow_mut().levels[index].processing.pop_front();
            let Some(event) = next else {
                break;
            };
            if let Err(err) = self.dispatch(&event) {
                self.requeue_unprocessed(index, level);
                return Err(err);
            }
        }
        Ok(())
    }

    fn requeue_unprocessed(&self, index: usize, level: Priority) {
        let mut inner = self.inner.borrow_mut();
        let slot = &mut inner.levels[index];
        if slot.processing.is_empty() {
            return;
        }
        let mut carried: Vec<E> = slot.processing.drain(..).collect();
        warn!(
            "Drain of {} aborted; {} event(s) carried to the next drain",
            level,
            carried.len()
        );
        carried.append(&mut slot.pending);
        slot.pending = carried;
    }

    fn pump_bridge(&self) -> Result<(), DispatchError> {
        let Some(rx) = self.inner.borrow().bridge.as_ref().map(|(_, rx)| rx.clone()) else {
            return Ok(());
        };
        while let Ok((priority, event)) = rx.try_recv() {
            self.publish(event, priority)?;
        }
        Ok(())
    }

    /// Invoke every listener for the event's kind.
    ///
    /// No internal borrow is held while listeners run, so they may publish,
    /// subscribe or unsubscribe freely. Changes to the registry take effect
    /// from the next event on.
    fn dispatch(&self, event: &E) -> Result<(), DispatchError> {
        let kind = event.kind();
        let (listeners, policy) = {
            let inner = self.inner.borrow();
            (inner.listeners.snapshot(kind), inner.config.fault_policy)
        };

        if listeners.is_empty() {
            self.inner.borrow_mut().stats.dropped += 1;
            trace!("No listeners for {:?}, dropped", kind);
            return Ok(());
        }

        self.inner.borrow_mut().stats.delivered += 1;
        trace!("Dispatching {:?} to {} listener(s)", event, listeners.len());

        for (id, listener) in listeners {
            if let Err(source) = listener(event) {
                self.inner.borrow_mut().stats.failed += 1;
                match policy {
                    FaultPolicy::Isolate => {
                        error!("Listener {} failed handling {:?}: {}", id, kind, source);
                    }
                    FaultPolicy::Propagate => {
                        return Err(DispatchError::ListenerFailed {
                            kind: format!("{:?}", kind),
                            id,
                            source,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Debug, Clone, PartialEq)]
    enum Note {
        A(u32),
        B(u32),
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum NoteKind {
        A,
        B,
    }

    impl Event for Note {
        type Kind = NoteKind;
        fn kind(&self) -> NoteKind {
            match self {
                Note::A(_) => NoteKind::A,
                Note::B(_) => NoteKind::B,
            }
        }
    }

    fn recorder(events: &EventManager<Note>, kind: NoteKind) -> Rc<RefCell<Vec<Note>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        events.subscribe(kind, move |e: &Note| {
            sink.borrow_mut().push(e.clone());
            Ok(())
        });
        seen
    }

    #[test]
    fn test_empty_drain_priority_is_noop() {
        let events = EventManager::<Note>::new();
        events.drain_priority(Priority::Normal).unwrap();
        assert_eq!(events.queued_len(Priority::Normal), 0);
        assert_eq!(events.pending_len(Priority::Normal), 0);
    }

    #[test]
    fn test_drain_priority_only_touches_its_level() {
        let events = EventManager::<Note>::new();
        let seen = recorder(&events, NoteKind::A);
        events.publish(Note::A(1), Priority::High).unwrap();
        events.publish(Note::A(2), Priority::Low).unwrap();

        events.drain_priority(Priority::Low).unwrap();
        assert_eq!(*seen.borrow(), vec![Note::A(2)]);
        assert_eq!(events.pending_len(Priority::High), 1);
    }

    #[test]
    fn test_drain_priority_ignores_realtime() {
        let events = EventManager::<Note>::new();
        events.drain_priority(Priority::Realtime).unwrap();
        assert_eq!(events.pending_len(Priority::Realtime), 0);
    }

    #[test]
    fn test_same_level_republish_waits_for_next_drain() {
        let events = EventManager::<Note>::new();
        let seen = recorder(&events, NoteKind::B);
        let handle = events.downgrade();
        events.subscribe(NoteKind::A, move |e: &Note| {
            if let (Note::A(n), Some(events)) = (e, handle.upgrade()) {
                events.publish(Note::B(*n), Priority::Normal)?;
                events.publish(Note::A(n + 1), Priority::Normal)?;
            }
            Ok(())
        });

        events.publish_normal(Note::A(0)).unwrap();
        events.drain_priority(Priority::Normal).unwrap();
        assert!(seen.borrow().is_empty());
        assert_eq!(events.pending_len(Priority::Normal), 2);
        assert_eq!(events.queued_len(Priority::Normal), 0);

        events.drain_priority(Priority::Normal).unwrap();
        assert_eq!(*seen.borrow(), vec![Note::B(0)]);
        assert_eq!(events.pending_len(Priority::Normal), 2);
    }

    #[test]
    fn test_reentrant_drain_is_rejected() {
        let events = EventManager::<Note>::new();
        let handle = events.downgrade();
        let inner_result = Rc::new(RefCell::new(None));
        let slot = Rc::clone(&inner_result);
        events.subscribe(NoteKind::A, move |_: &Note| {
            if let Some(events) = handle.upgrade() {
                *slot.borrow_mut() = Some(events.drain_all());
            }
            Ok(())
        });
        events.publish_normal(Note::A(1)).unwrap();
        events.drain_all().unwrap();

        let nested = inner_result.borrow_mut().take();
        assert!(matches!(nested, Some(Err(DispatchError::ReentrantDrain))));
        // The guard is released after the outer drain.
        events.drain_all().unwrap();
        assert_eq!(events.stats().drains, 2);
    }

    #[test]
    fn test_propagate_requeues_rest_of_level() {
        let events = EventManager::<Note>::with_config(DispatchConfig {
            fault_policy: FaultPolicy::Propagate,
            ..DispatchConfig::default()
        });
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        events.subscribe(NoteKind::A, move |e: &Note| {
            let Note::A(n) = e else { return Ok(()) };
            if *n == 2 {
                return Err("bad tile".into());
            }
            sink.borrow_mut().push(*n);
            Ok(())
        });

        for n in 1..=4 {
            events.publish_normal(Note::A(n)).unwrap();
        }
        events.publish(Note::A(9), Priority::Low).unwrap();

        let err = events.drain_all().unwrap_err();
        assert!(matches!(err, DispatchError::ListenerFailed { .. }));
        assert_eq!(*seen.borrow(), vec![1]);
        assert_eq!(events.pending_len(Priority::Normal), 2);
        assert_eq!(events.queued_len(Priority::Normal), 0);
        // Low was never reached.
        assert_eq!(events.pending_len(Priority::Low), 1);

        events.publish_normal(Note::A(5)).unwrap();
        events.drain_all().unwrap();
        assert_eq!(*seen.borrow(), vec![1, 3, 4, 5, 9]);
    }

    #[test]
    fn test_isolate_keeps_dispatching() {
        let events = EventManager::<Note>::new();
        let calls = Rc::new(Cell::new(0));
        events.subscribe(NoteKind::A, |_: &Note| Err("always fails".into()));
        let counter = Rc::clone(&calls);
        events.subscribe(NoteKind::A, move |_: &Note| {
            counter.set(counter.get() + 1);
            Ok(())
        });

        events.publish_normal(Note::A(1)).unwrap();
        events.publish_normal(Note::A(2)).unwrap();
        events.drain_all().unwrap();

        assert_eq!(calls.get(), 2);
        assert_eq!(events.stats().failed, 2);
        assert_eq!(events.stats().delivered, 2);
    }

    #[test]
    fn test_stats_count_drops() {
        let events = EventManager::<Note>::new();
        events.publish(Note::B(1), Priority::Realtime).unwrap();
        events.publish(Note::B(2), Priority::High).unwrap();
        events.drain_all().unwrap();

        let stats = events.stats();
        assert_eq!(stats.published, 2);
        assert_eq!(stats.realtime, 1);
        assert_eq!(stats.dropped, 2);
        assert_eq!(stats.delivered, 0);
    }

    #[test]
    fn test_clones_share_state() {
        let a = EventManager::<Note>::new();
        let b = a.clone();
        let seen = recorder(&b, NoteKind::A);
        a.publish_normal(Note::A(3)).unwrap();
        assert_eq!(b.pending_len(Priority::Normal), 1);
        b.drain_all().unwrap();
        assert_eq!(*seen.borrow(), vec![Note::A(3)]);
        assert!(a.same_as(&b));
        assert!(!a.same_as(&EventManager::new()));
    }

    #[test]
    fn test_pending_warning_resets_after_drain() {
        let events = EventManager::<Note>::with_config(DispatchConfig {
            pending_warn_threshold: 2,
            ..DispatchConfig::default()
        });
        for n in 0..3 {
            events.publish_normal(Note::A(n)).unwrap();
        }
        assert!(events.inner.borrow().levels[1].warned);
        events.drain_all().unwrap();
        assert!(!events.inner.borrow().levels[1].warned);
    }

    #[test]
    fn test_fault_policy_parse() {
        assert_eq!("Propagate".parse::<FaultPolicy>(), Ok(FaultPolicy::Propagate));
        assert_eq!("isolate".parse::<FaultPolicy>(), Ok(FaultPolicy::Isolate));
        assert!("ignore".parse::<FaultPolicy>().is_err());
    }
}
