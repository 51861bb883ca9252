//! Event types exchanged through the [`EventManager`].
//!
//! Each producer family has its own payload enum; [`GameEvent`] wraps them
//! so a single dispatcher carries all of them. Listeners subscribe to a
//! [`GameEventKind`] and match on the variant they registered for.
//!
//! Submodules:
//! - [`tile`] – tile creation and type changes
//! - [`world`] – tiles entering and leaving the world grid
//! - [`camera`] – camera movement and zoom
//!
//! [`EventManager`]: crate::resources::eventmanager::EventManager
pub mod camera;
pub mod tile;
pub mod world;

use serde::{Deserialize, Serialize};

use crate::resources::eventmanager::{Event, EventManager};
use camera::CameraEvent;
use tile::TileEvent;
use world::WorldEvent;

/// Every event the game publishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Tile(TileEvent),
    World(WorldEvent),
    Camera(CameraEvent),
}

/// Subscription key for [`GameEvent`]: one value per payload variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GameEventKind {
    TileCreated,
    TileTypeChanged,
    TileAdded,
    TileRemoved,
    CameraMoved,
    CameraZoomed,
}

impl Event for GameEvent {
    type Kind = GameEventKind;

    fn kind(&self) -> GameEventKind {
        match self {
            GameEvent::Tile(TileEvent::Created(_)) => GameEventKind::TileCreated,
            GameEvent::Tile(TileEvent::TypeChanged { .. }) => GameEventKind::TileTypeChanged,
            GameEvent::World(WorldEvent::TileAdded(_)) => GameEventKind::TileAdded,
            GameEvent::World(WorldEvent::TileRemoved(_)) => GameEventKind::TileRemoved,
            GameEvent::Camera(CameraEvent::Moved { .. }) => GameEventKind::CameraMoved,
            GameEvent::Camera(CameraEvent::Zoomed { .. }) => GameEventKind::CameraZoomed,
        }
    }
}

impl From<TileEvent> for GameEvent {
    fn from(event: TileEvent) -> Self {
        GameEvent::Tile(event)
    }
}

impl From<WorldEvent> for GameEvent {
    fn from(event: WorldEvent) -> Self {
        GameEvent::World(event)
    }
}

impl From<CameraEvent> for GameEvent {
    fn from(event: CameraEvent) -> Self {
        GameEvent::Camera(event)
    }
}

/// The dispatcher type shared by every game producer and consumer.
pub type GameEvents = EventManager<GameEvent>;
