//! Headless 2D camera.
//!
//! [`CameraRig`] holds the view position and orthographic size and publishes
//! [`CameraEvent`]s when either changes. It reads no input itself: the host
//! feeds it movement and zoom amounts each tick.

use log::debug;

use crate::events::GameEvents;
use crate::events::camera::CameraEvent;
use crate::resources::eventmanager::{DispatchError, Priority};

const MIN_SIZE: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSettings {
    /// World units per second at full input.
    pub move_speed: f32,
    /// Fraction of the current size applied per unit of zoom input.
    pub zoom_speed: f32,
    /// Largest allowed orthographic size.
    pub max_zoom: f32,
    /// Priority used for camera events.
    pub priority: Priority,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            move_speed: 4.0,
            zoom_speed: 0.5,
            max_zoom: 16.0,
            priority: Priority::Normal,
        }
    }
}

pub struct CameraRig {
    x: f32,
    y: f32,
    size: f32,
    settings: CameraSettings,
    events: GameEvents,
}

impl CameraRig {
    pub fn new(settings: CameraSettings, events: GameEvents) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            size: MIN_SIZE.max(settings.max_zoom / 2.0),
            settings,
            events,
        }
    }

    pub fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    /// Announce the starting position.
    pub fn start(&self) -> Result<(), DispatchError> {
        self.publish(CameraEvent::Moved {
            x: self.x,
            y: self.y,
        })
    }

    /// Move by `(dx, dy)` world units. Zero moves publish nothing.
    pub fn translate(&mut self, dx: f32, dy: f32) -> Result<(), DispatchError> {
        if dx == 0.0 && dy == 0.0 {
            return Ok(());
        }
        self.x += dx;
        self.y += dy;
        self.publish(CameraEvent::Moved {
            x: self.x,
            y: self.y,
        })
    }

    /// Move along a direction for `dt` seconds at the configured speed.
    ///
    /// The direction is normalized, so diagonals are not faster.
    pub fn pan(&mut self, dir_x: f32, dir_y: f32, dt: f32) -> Result<(), DispatchError> {
        let len = (dir_x * dir_x + dir_y * dir_y).sqrt();
        if len == 0.0 {
            return Ok(());
        }
        let step = self.settings.move_speed * dt / len;
        self.translate(dir_x * step, dir_y * step)
    }

    /// Apply scroll-style zoom input. Positive input zooms in.
    pub fn zoom(&mut self, amount: f32) -> Result<(), DispatchError> {
        let target = self.size - self.size * amount * self.settings.zoom_speed;
        let clamped = target.clamp(MIN_SIZE, self.settings.max_zoom.max(MIN_SIZE));
        if clamped == self.size {
            return Ok(());
        }
        self.size = clamped;
        debug!("Camera size now {}", self.size);
        self.publish(CameraEvent::Zoomed { size: self.size })
    }

    fn publish(&self, event: CameraEvent) -> Result<(), DispatchError> {
        self.events.publish(event.into(), self.settings.priority)
    }
}
