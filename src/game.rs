//! Game setup and per-tick update.
//!
//! [`Game`] wires the world, camera and visualizer onto one shared
//! [`GameEvents`] dispatcher and drives them from a fixed-step loop. Each
//! [`Game::update`] first drains the events produced by the previous tick,
//! then runs this tick's producers:
//!
//! - the camera pans along a scripted path (standing in for player input)
//! - every `randomize_every` ticks the whole world is re-rolled
//!
//! Rendering, input and asset loading stay outside; the visualizer only
//! keeps sprite keys.

use fastrand::Rng;
use log::{debug, info};
use serde::Serialize;
use std::cell::Cell;
use std::rc::Rc;
use thiserror::Error;

use crate::events::camera::CameraEvent;
use crate::events::{GameEvent, GameEventKind, GameEvents};
use crate::resources::camera2d::CameraRig;
use crate::resources::eventmanager::{DispatchError, DispatchStats};
use crate::resources::gameconfig::GameConfig;
use crate::resources::tilemap::{Tilemap, TilemapError};
use crate::resources::world::{World, WorldError};
use crate::systems::tilevisualizer::TileVisualizer;

/// Ticks between camera zoom nudges.
const ZOOM_PERIOD: u32 = 90;

#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    World(#[from] WorldError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    Tilemap(#[from] TilemapError),
}

/// End-of-run figures, printed by the host.
#[derive(Debug, Clone, Serialize)]
pub struct GameSummary {
    pub ticks: u32,
    pub tiles: usize,
    pub visualized_tiles: usize,
    pub sprite_updates: u64,
    pub camera_moves_seen: u64,
    pub camera_position: (f32, f32),
    pub dispatch: DispatchStats,
}

pub struct Game {
    events: GameEvents,
    world: World,
    camera: CameraRig,
    visualizer: TileVisualizer,
    rng: Rng,
    config: GameConfig,
    tick: u32,
    camera_moves: Rc<Cell<u64>>,
}

impl Game {
    /// Build the world and hook every consumer up before anything is published.
    pub fn setup(config: GameConfig) -> Result<Self, GameError> {
        let events = GameEvents::with_config(config.dispatch);
        let visualizer = TileVisualizer::attach(&events);

        let camera_moves = Rc::new(Cell::new(0u64));
        let counter = Rc::clone(&camera_moves);
        events.subscribe(GameEventKind::CameraMoved, move |event| {
            if let GameEvent::Camera(CameraEvent::Moved { x, y }) = event {
                counter.set(counter.get() + 1);
                debug!("Camera at ({:.2}, {:.2})", x, y);
            }
            Ok(())
        });

        let world = match &config.map_path {
            Some(path) => {
                let map = Tilemap::load(path)?;
                World::from_tilemap(&map, events.clone(), true)?
            }
            None => {
                let mut world = World::new(config.world_width, config.world_height, events.clone())?;
                world.create_test_world(true)?;
                world
            }
        };
        info!("World ready: {}x{}", world.width(), world.height());

        let camera = CameraRig::new(config.camera, events.clone());
        camera.start()?;

        Ok(Self {
            rng: Rng::with_seed(config.seed),
            events,
            world,
            camera,
            visualizer,
            config,
            tick: 0,
            camera_moves,
        })
    }

    pub fn events(&self) -> &GameEvents {
        &self.events
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn visualizer(&self) -> &TileVisualizer {
        &self.visualizer
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    pub fn tick(&self) -> u32 {
        self.tick
    }

    /// One fixed step: deliver last tick's events, then produce new ones.
    pub fn update(&mut self) -> Result<(), GameError> {
        self.events.drain_all()?;
        self.tick += 1;

        let angle = self.tick as f32 * 0.05;
        self.camera
            .pan(angle.cos(), angle.sin(), self.config.tick_seconds())?;
        if self.tick % ZOOM_PERIOD == 0 {
            let direction = if (self.tick / ZOOM_PERIOD) % 2 == 0 { 1.0 } else { -1.0 };
            self.camera.zoom(direction * 0.25)?;
        }

        if self.config.randomize_every > 0 && self.tick % self.config.randomize_every == 0 {
            debug!("Tick {}: randomizing tiles", self.tick);
            self.world.randomize_tiles(&mut self.rng)?;
        }
        Ok(())
    }

    /// Run `ticks` updates and deliver whatever the last one produced.
    pub fn run(&mut self, ticks: u32) -> Result<GameSummary, GameError> {
        for _ in 0..ticks {
            self.update()?;
        }
        self.events.drain_all()?;
        Ok(self.summary())
    }

    pub fn summary(&self) -> GameSummary {
        GameSummary {
            ticks: self.tick,
            tiles: self.world.tile_count(),
            visualized_tiles: self.visualizer.len(),
            sprite_updates: self.visualizer.sprite_updates(),
            camera_moves_seen: self.camera_moves.get(),
            camera_position: self.camera.position(),
            dispatch: self.events.stats(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> GameConfig {
        GameConfig {
            world_width: 4,
            world_height: 3,
            randomize_every: 5,
            ..GameConfig::new()
        }
    }

    #[test]
    fn test_setup_defers_delivery_to_first_update() {
        let mut game = Game::setup(small_config()).unwrap();
        assert_eq!(game.visualizer().len(), 0);
        game.update().unwrap();
        assert_eq!(game.visualizer().len(), 12);
        assert_eq!(game.visualizer().sprite_at(0, 0).unwrap().sprite, "Tiles/Invalid");
    }

    #[test]
    fn test_visualizer_follows_randomized_world() {
        let mut game = Game::setup(small_config()).unwrap();
        let summary = game.run(10).unwrap();
        assert_eq!(summary.ticks, 10);
        assert_eq!(summary.visualized_tiles, 12);
        // 12 adds plus two full re-rolls.
        assert_eq!(summary.sprite_updates, 12 + 24);
        for tile in game.world().tiles() {
            let sprite = game.visualizer().sprite_at(tile.x, tile.y).unwrap();
            assert_eq!(sprite.sprite, crate::systems::tilevisualizer::sprite_key(tile.tile_type));
        }
        assert_eq!(summary.dispatch.failed, 0);
    }

    #[test]
    fn test_camera_moves_are_all_delivered() {
        let mut game = Game::setup(small_config()).unwrap();
        let summary = game.run(20).unwrap();
        // Start position plus one move per tick.
        assert_eq!(summary.camera_moves_seen, 21);
    }

    #[test]
    fn test_same_seed_same_world() {
        let mut a = Game::setup(small_config()).unwrap();
        let mut b = Game::setup(small_config()).unwrap();
        a.run(15).unwrap();
        b.run(15).unwrap();
        assert_eq!(a.visualizer().snapshot(), b.visualizer().snapshot());
    }
}
