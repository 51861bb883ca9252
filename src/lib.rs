//! tilebus library.
//!
//! A tile world whose state changes are published through a priority-queued
//! event dispatcher and delivered once per tick. This module exposes the
//! dispatcher, the event types, and the world/camera/visualizer that produce
//! and consume them, for use in integration tests and as a reusable library.

pub mod components;
pub mod events;
pub mod game;
pub mod resources;
pub mod systems;

pub use events::{GameEvent, GameEventKind, GameEvents};
pub use resources::eventmanager::{
    DispatchConfig, DispatchError, Event, EventManager, EventSender, FaultPolicy, ListenerId,
    Priority,
};
