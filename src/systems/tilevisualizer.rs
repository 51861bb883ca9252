//! Headless tile visualizer.
//!
//! Mirrors the world grid as a map of `(x, y)` to sprite keys, driven purely
//! by events: `TileAdded` creates an entry, `TileTypeChanged` swaps its
//! sprite, `TileRemoved` deletes it. Nothing is drawn; a renderer would read
//! [`TileVisualizer::sprite_at`] or [`TileVisualizer::snapshot`].
//!
//! A type change for a tile the visualizer never saw added is reported as a
//! listener error. With the default fault policy the dispatcher logs it and
//! carries on.

use log::debug;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;

use crate::components::tile::TileType;
use crate::events::tile::{TileEvent, TileRef};
use crate::events::world::WorldEvent;
use crate::events::{GameEvent, GameEventKind, GameEvents};
use crate::resources::eventmanager::{DispatchError, ListenerId, ListenerResult};

const SPRITE_PATH: &str = "Tiles/";
const INVALID_SPRITE: &str = "Tiles/Invalid";

/// Sprite key for a tile type. Empty tiles have no sprite of their own.
pub fn sprite_key(tile_type: TileType) -> String {
    match tile_type {
        TileType::Empty => INVALID_SPRITE.to_string(),
        other => format!("{}{}", SPRITE_PATH, other.name()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSprite {
    /// Display name, `Tile_{x}_{y}`.
    pub name: String,
    pub sprite: String,
}

#[derive(Debug, Error)]
pub enum VisualizerError {
    #[error("no visualization for tile at ({x}, {y}); was TileAdded published?")]
    UnknownTile { x: u32, y: u32 },
}

#[derive(Default)]
struct VisualState {
    sprites: FxHashMap<(u32, u32), TileSprite>,
    sprite_updates: u64,
}

impl VisualState {
    fn on_tile_added(&mut self, tile: &TileRef) {
        self.sprites.insert(
            (tile.x, tile.y),
            TileSprite {
                name: format!("Tile_{}_{}", tile.x, tile.y),
                sprite: sprite_key(tile.tile_type),
            },
        );
        self.sprite_updates += 1;
    }

    fn on_tile_type_changed(&mut self, tile: &TileRef) -> ListenerResult {
        let entry = self
            .sprites
            .get_mut(&(tile.x, tile.y))
            .ok_or(VisualizerError::UnknownTile {
                x: tile.x,
                y: tile.y,
            })?;
        entry.sprite = sprite_key(tile.tile_type);
        self.sprite_updates += 1;
        Ok(())
    }

    fn on_tile_removed(&mut self, tile: &TileRef) {
        self.sprites.remove(&(tile.x, tile.y));
    }
}

pub struct TileVisualizer {
    state: Rc<RefCell<VisualState>>,
    events: GameEvents,
    subscriptions: Vec<(GameEventKind, ListenerId)>,
}

impl TileVisualizer {
    /// Subscribe a new visualizer to `events`.
    pub fn attach(events: &GameEvents) -> Self {
        let state = Rc::new(RefCell::new(VisualState::default()));
        let mut subscriptions = Vec::with_capacity(3);

        let s = Rc::clone(&state);
        let id = events.subscribe(GameEventKind::TileAdded, move |event| {
            if let GameEvent::World(WorldEvent::TileAdded(tile)) = event {
                s.borrow_mut().on_tile_added(tile);
            }
            Ok(())
        });
        subscriptions.push((GameEventKind::TileAdded, id));

        let s = Rc::clone(&state);
        let id = events.subscribe(GameEventKind::TileTypeChanged, move |event| {
            match event {
                GameEvent::Tile(TileEvent::TypeChanged { tile, .. }) => {
                    s.borrow_mut().on_tile_type_changed(tile)
                }
                _ => Ok(()),
            }
        });
        subscriptions.push((GameEventKind::TileTypeChanged, id));

        let s = Rc::clone(&state);
        let id = events.subscribe(GameEventKind::TileRemoved, move |event| {
            if let GameEvent::World(WorldEvent::TileRemoved(tile)) = event {
                s.borrow_mut().on_tile_removed(tile);
            }
            Ok(())
        });
        subscriptions.push((GameEventKind::TileRemoved, id));

        debug!("TileVisualizer attached");
        Self {
            state,
            events: events.clone(),
            subscriptions,
        }
    }

    /// Unsubscribe every listener this visualizer registered.
    pub fn detach(mut self) -> Result<(), DispatchError> {
        for (kind, id) in self.subscriptions.drain(..) {
            self.events.unsubscribe(kind, id)?;
        }
        debug!("TileVisualizer detached");
        Ok(())
    }

    pub fn sprite_at(&self, x: u32, y: u32) -> Option<TileSprite> {
        self.state.borrow().sprites.get(&(x, y)).cloned()
    }

    /// Number of visualized tiles.
    pub fn len(&self) -> usize {
        self.state.borrow().sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sprite assignments made so far, including initial ones.
    pub fn sprite_updates(&self) -> u64 {
        self.state.borrow().sprite_updates
    }

    /// Sorted copy of every `(x, y)` → sprite key.
    pub fn snapshot(&self) -> Vec<((u32, u32), String)> {
        let mut all: Vec<_> = self
            .state
            .borrow()
            .sprites
            .iter()
            .map(|(pos, sprite)| (*pos, sprite.sprite.clone()))
            .collect();
        all.sort();
        all
    }
}
