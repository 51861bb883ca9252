//! World membership events.
//!
//! [`WorldEvent::TileAdded`] is what visualizers use to learn about tiles;
//! [`WorldEvent::TileRemoved`] tells them to forget one.

use serde::{Deserialize, Serialize};

use crate::events::tile::TileRef;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorldEvent {
    TileAdded(TileRef),
    /// Carries the tile as it was just before removal.
    TileRemoved(TileRef),
}
