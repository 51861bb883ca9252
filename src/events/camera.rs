//! Camera events published by [`CameraRig`](crate::resources::camera2d::CameraRig).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CameraEvent {
    /// New camera position in world units.
    Moved { x: f32, y: f32 },
    /// New orthographic size after clamping.
    Zoomed { size: f32 },
}
