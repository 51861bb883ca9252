//! Tile data.
//!
//! A [`Tile`] is plain data owned by the [`World`](crate::resources::world::World)
//! grid. Mutation goes through the world, which publishes the matching events.

use fastrand::Rng;
use serde::{Deserialize, Serialize};

/// Ground type of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TileType {
    #[default]
    Empty,
    Grass,
    Stone,
}

impl TileType {
    /// Every type, in tile map id order.
    pub const ALL: [TileType; 3] = [TileType::Empty, TileType::Grass, TileType::Stone];

    /// Pick a random non-empty type.
    pub fn random(rng: &mut Rng) -> Self {
        if rng.bool() {
            TileType::Grass
        } else {
            TileType::Stone
        }
    }

    /// Map a tile map id (0 = empty, 1 = grass, 2 = stone).
    pub fn from_id(id: u32) -> Option<Self> {
        Self::ALL.get(id as usize).copied()
    }

    pub fn id(self) -> u32 {
        match self {
            TileType::Empty => 0,
            TileType::Grass => 1,
            TileType::Stone => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TileType::Empty => "Empty",
            TileType::Grass => "Grass",
            TileType::Stone => "Stone",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    pub x: u32,
    pub y: u32,
    pub tile_type: TileType,
}

impl Tile {
    /// New empty tile at `(x, y)`.
    pub fn new(x: u32, y: u32) -> Self {
        Self {
            x,
            y,
            tile_type: TileType::Empty,
        }
    }

    pub fn with_type(mut self, tile_type: TileType) -> Self {
        self.tile_type = tile_type;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tile_is_empty() {
        let tile = Tile::new(4, 5);
        assert_eq!((tile.x, tile.y), (4, 5));
        assert_eq!(tile.tile_type, TileType::Empty);
    }

    #[test]
    fn test_random_never_empty() {
        let mut rng = Rng::with_seed(7);
        for _ in 0..64 {
            assert_ne!(TileType::random(&mut rng), TileType::Empty);
        }
    }

    #[test]
    fn test_id_round_trip() {
        for tile_type in TileType::ALL {
            assert_eq!(TileType::from_id(tile_type.id()), Some(tile_type));
        }
        assert_eq!(TileType::from_id(3), None);
    }
}
