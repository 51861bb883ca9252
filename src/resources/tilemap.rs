//! JSON tile map description.
//!
//! A tile map lists, per layer, which tile id sits at which cell. Layers are
//! applied in order, so a later layer overrides an earlier one at the same
//! cell. Ids map onto [`TileType`](crate::components::tile::TileType) via
//! [`TileType::from_id`](crate::components::tile::TileType::from_id).
//!
//! ```json
//! {
//!   "tile_size": 16,
//!   "map_width": 4,
//!   "map_height": 2,
//!   "layers": [
//!     { "name": "ground", "positions": [ { "x": 0, "y": 0, "id": 1 } ] }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TilePosition {
    pub x: u32,
    pub y: u32,
    pub id: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TileLayer {
    pub name: String,
    pub positions: Vec<TilePosition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Tilemap {
    pub tile_size: u32,
    pub map_width: u32,
    pub map_height: u32,
    #[serde(default)]
    pub layers: Vec<TileLayer>,
}

#[derive(Debug, Error)]
pub enum TilemapError {
    #[error("failed to read tile map {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse tile map: {0}")]
    Parse(#[from] serde_json::Error),
}

impl Tilemap {
    pub fn from_json(text: &str) -> Result<Self, TilemapError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, TilemapError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| TilemapError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// All positions of every layer, in application order.
    pub fn positions(&self) -> impl Iterator<Item = &TilePosition> {
        self.layers.iter().flat_map(|layer| layer.positions.iter())
    }
}
