//! Tile events.
//!
//! Published by [`World`](crate::resources::world::World) whenever a tile is
//! created or changes type. The payload is a [`TileRef`] snapshot taken at
//! publish time, so listeners never see a tile in a later state than the one
//! the event describes.

use serde::{Deserialize, Serialize};

use crate::components::tile::{Tile, TileType};

/// Immutable snapshot of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileRef {
    pub x: u32,
    pub y: u32,
    pub tile_type: TileType,
}

impl From<&Tile> for TileRef {
    fn from(tile: &Tile) -> Self {
        Self {
            x: tile.x,
            y: tile.y,
            tile_type: tile.tile_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TileEvent {
    /// A tile was constructed. Not yet necessarily placed in a world.
    Created(TileRef),
    /// A tile's type changed. `tile` holds the new type.
    TypeChanged { tile: TileRef, previous: TileType },
}
