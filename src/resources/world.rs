//! Tile world grid.
//!
//! [`World`] owns a `width × height` grid of optional tiles and is the only
//! place tiles are mutated. Every mutation that matters to other parts of the
//! game is published on the shared [`GameEvents`] dispatcher at
//! [`Priority::Normal`], to be delivered on the next
//! [`drain_all`](crate::resources::eventmanager::EventManager::drain_all).
//!
//! | Operation            | Event                              |
//! |----------------------|------------------------------------|
//! | [`World::spawn_tile`]       | `TileCreated`, then `TileAdded` if asked |
//! | [`World::add_tile`]         | `TileAdded` if asked               |
//! | [`World::change_tile_type`] | `TileTypeChanged` if asked         |
//! | [`World::remove_tile`]      | `TileRemoved`                      |

use fastrand::Rng;
use log::{debug, error};
use thiserror::Error;

use crate::components::tile::{Tile, TileType};
use crate::events::GameEvents;
use crate::events::tile::{TileEvent, TileRef};
use crate::events::world::WorldEvent;
use crate::resources::eventmanager::{DispatchError, Priority};
use crate::resources::tilemap::Tilemap;

#[derive(Debug, Error)]
pub enum WorldError {
    #[error("map width or height cannot be 0 (got {width}x{height})")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("({x}, {y}) is outside the world")]
    OutOfBounds { x: u32, y: u32 },
    #[error("a tile already exists at ({x}, {y}); remove it first")]
    Occupied { x: u32, y: u32 },
    #[error("no tile at ({x}, {y})")]
    NoTile { x: u32, y: u32 },
    #[error("unknown tile id {id} at ({x}, {y})")]
    UnknownTileId { id: u32, x: u32, y: u32 },
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

pub struct World {
    width: u32,
    height: u32,
    tiles: Vec<Option<Tile>>,
    events: GameEvents,
}

impl World {
    /// Create an empty world. Both dimensions must be non-zero.
    pub fn new(width: u32, height: u32, events: GameEvents) -> Result<Self, WorldError> {
        if width == 0 || height == 0 {
            return Err(WorldError::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            tiles: vec![None; width as usize * height as usize],
            events,
        })
    }

    /// Build a world from a tile map, one tile per cell.
    ///
    /// Cells not mentioned by any layer become empty tiles. Later layers win.
    pub fn from_tilemap(
        map: &Tilemap,
        events: GameEvents,
        send_events: bool,
    ) -> Result<Self, WorldError> {
        let mut world = Self::new(map.map_width, map.map_height, events)?;
        let mut types = vec![TileType::Empty; world.tiles.len()];
        for pos in map.positions() {
            let index = world
                .index(pos.x, pos.y)
                .ok_or(WorldError::OutOfBounds { x: pos.x, y: pos.y })?;
            types[index] = TileType::from_id(pos.id).ok_or(WorldError::UnknownTileId {
                id: pos.id,
                x: pos.x,
                y: pos.y,
            })?;
        }
        for y in 0..world.height {
            for x in 0..world.width {
                let tile_type = types[(y * world.width + x) as usize];
                world.spawn_tile(x, y, tile_type, send_events)?;
            }
        }
        debug!(
            "Built {}x{} world from tile map ({} layers)",
            world.width,
            world.height,
            map.layers.len()
        );
        Ok(world)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// The dispatcher this world publishes on.
    pub fn events(&self) -> &GameEvents {
        &self.events
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| (y * self.width + x) as usize)
    }

    /// Tile at `(x, y)`, or `None` if out of range or unoccupied.
    pub fn tile_at(&self, x: u32, y: u32) -> Option<&Tile> {
        self.index(x, y).and_then(|i| self.tiles[i].as_ref())
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter().flatten()
    }

    pub fn tile_count(&self) -> usize {
        self.tiles().count()
    }

    /// Fill every free cell with an empty tile.
    ///
    /// Occupied cells are logged and skipped.
    pub fn create_test_world(&mut self, send_events: bool) -> Result<(), WorldError> {
        for y in 0..self.height {
            for x in 0..self.width {
                match self.spawn_tile(x, y, TileType::Empty, send_events) {
                    Ok(()) | Err(WorldError::Occupied { .. }) => {}
                    Err(e) => return Err(e),
                }
            }
        }
        Ok(())
    }

    /// Construct a tile (publishing `TileCreated`) and place it.
    pub fn spawn_tile(
        &mut self,
        x: u32,
        y: u32,
        tile_type: TileType,
        send_event: bool,
    ) -> Result<(), WorldError> {
        let tile = Tile::new(x, y).with_type(tile_type);
        self.events
            .publish(TileEvent::Created(TileRef::from(&tile)).into(), Priority::Normal)?;
        self.add_tile(tile, send_event)
    }

    /// Place `tile` at its own coordinates.
    pub fn add_tile(&mut self, tile: Tile, send_event: bool) -> Result<(), WorldError> {
        let index = self.index(tile.x, tile.y).ok_or(WorldError::OutOfBounds {
            x: tile.x,
            y: tile.y,
        })?;
        if self.tiles[index].is_some() {
            error!(
                "Tile is already created at ({}, {}). Delete the old one before making a new one",
                tile.x, tile.y
            );
            return Err(WorldError::Occupied {
                x: tile.x,
                y: tile.y,
            });
        }
        self.tiles[index] = Some(tile);
        if send_event {
            self.events
                .publish(WorldEvent::TileAdded(TileRef::from(&tile)).into(), Priority::Normal)?;
        }
        Ok(())
    }

    /// Change the type of the tile at `(x, y)`.
    ///
    /// The event is published even if the type does not actually change.
    pub fn change_tile_type(
        &mut self,
        x: u32,
        y: u32,
        new_type: TileType,
        send_event: bool,
    ) -> Result<(), WorldError> {
        let index = self.index(x, y).ok_or(WorldError::OutOfBounds { x, y })?;
        let tile = self.tiles[index]
            .as_mut()
            .ok_or(WorldError::NoTile { x, y })?;
        let previous = tile.tile_type;
        tile.tile_type = new_type;
        let snapshot = TileRef::from(&*tile);
        if send_event {
            self.events.publish(
                TileEvent::TypeChanged {
                    tile: snapshot,
                    previous,
                }
                .into(),
                Priority::Normal,
            )?;
        }
        Ok(())
    }

    /// Give every tile a random grass or stone type.
    pub fn randomize_tiles(&mut self, rng: &mut Rng) -> Result<(), WorldError> {
        let occupied: Vec<(u32, u32)> = self.tiles().map(|t| (t.x, t.y)).collect();
        for (x, y) in occupied {
            self.change_tile_type(x, y, TileType::random(rng), true)?;
        }
        debug!("Randomized {} tiles", self.tile_count());
        Ok(())
    }

    /// Remove the tile at `(x, y)`, publishing `TileRemoved`.
    ///
    /// Returns `Ok(None)` if the cell was already empty.
    pub fn remove_tile(&mut self, x: u32, y: u32) -> Result<Option<Tile>, WorldError> {
        let index = self.index(x, y).ok_or(WorldError::OutOfBounds { x, y })?;
        let Some(tile) = self.tiles[index] else {
            return Ok(None);
        };
        self.events
            .publish(WorldEvent::TileRemoved(TileRef::from(&tile)).into(), Priority::Normal)?;
        self.tiles[index] = None;
        Ok(Some(tile))
    }
}
