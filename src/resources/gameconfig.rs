//! Game configuration.
//!
//! Settings loaded from an INI configuration file. Defaults are safe to run
//! with, so a missing file is not an error for the host.
//!
//! # Configuration File Format
//!
//! ```ini
//! [world]
//! width = 32
//! height = 18
//! map =
//!
//! [camera]
//! move_speed = 4
//! zoom_speed = 0.5
//! max_zoom = 16
//! priority = normal
//!
//! [events]
//! fault_policy = isolate
//! pending_warn_threshold = 4096
//!
//! [simulation]
//! ticks = 600
//! tick_rate = 60
//! randomize_every = 120
//! seed = 12345
//! ```

use configparser::ini::Ini;
use log::{info, warn};
use std::path::PathBuf;

use crate::resources::camera2d::CameraSettings;
use crate::resources::eventmanager::{DispatchConfig, FaultPolicy, Priority};

const DEFAULT_WORLD_WIDTH: u32 = 32;
const DEFAULT_WORLD_HEIGHT: u32 = 18;
const DEFAULT_TICKS: u32 = 600;
const DEFAULT_TICK_RATE: u32 = 60;
const DEFAULT_RANDOMIZE_EVERY: u32 = 120;
const DEFAULT_SEED: u64 = 12345;
const DEFAULT_CONFIG_PATH: &str = "./config.ini";

#[derive(Debug, Clone)]
pub struct GameConfig {
    pub world_width: u32,
    pub world_height: u32,
    /// Optional JSON tile map; overrides the world size when set.
    pub map_path: Option<PathBuf>,
    pub camera: CameraSettings,
    pub dispatch: DispatchConfig,
    /// Ticks to simulate before exiting.
    pub ticks: u32,
    /// Simulated ticks per second, used for camera movement.
    pub tick_rate: u32,
    /// Randomize every tile each this many ticks. 0 disables it.
    pub randomize_every: u32,
    pub seed: u64,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl GameConfig {
    /// Create a new configuration with safe default values.
    pub fn new() -> Self {
        Self {
            world_width: DEFAULT_WORLD_WIDTH,
            world_height: DEFAULT_WORLD_HEIGHT,
            map_path: None,
            camera: CameraSettings::default(),
            dispatch: DispatchConfig::default(),
            ticks: DEFAULT_TICKS,
            tick_rate: DEFAULT_TICK_RATE,
            randomize_every: DEFAULT_RANDOMIZE_EVERY,
            seed: DEFAULT_SEED,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create a new configuration with a custom config file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Seconds per tick.
    pub fn tick_seconds(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current (default) values. Values that
    /// fail to parse are logged and ignored.
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;

        // [world] section
        if let Some(width) = config.getuint("world", "width").ok().flatten() {
            self.world_width = width as u32;
        }
        if let Some(height) = config.getuint("world", "height").ok().flatten() {
            self.world_height = height as u32;
        }
        if let Some(map) = config.get("world", "map").filter(|m| !m.trim().is_empty()) {
            self.map_path = Some(PathBuf::from(map.trim()));
        }

        // [camera] section
        if let Some(speed) = config.getfloat("camera", "move_speed").ok().flatten() {
            self.camera.move_speed = speed as f32;
        }
        if let Some(speed) = config.getfloat("camera", "zoom_speed").ok().flatten() {
            self.camera.zoom_speed = speed as f32;
        }
        if let Some(zoom) = config.getfloat("camera", "max_zoom").ok().flatten() {
            self.camera.max_zoom = zoom as f32;
        }
        if let Some(priority) = config.get("camera", "priority") {
            match priority.parse::<Priority>() {
                Ok(p) => self.camera.priority = p,
                Err(e) => warn!("Ignoring [camera] priority: {}", e),
            }
        }

        // [events] section
        if let Some(policy) = config.get("events", "fault_policy") {
            match policy.parse::<FaultPolicy>() {
                Ok(p) => self.dispatch.fault_policy = p,
                Err(e) => warn!("Ignoring [events] fault_policy: {}", e),
            }
        }
        if let Some(threshold) = config
            .getuint("events", "pending_warn_threshold")
            .ok()
            .flatten()
        {
            self.dispatch.pending_warn_threshold = threshold as usize;
        }

        // [simulation] section
        if let Some(ticks) = config.getuint("simulation", "ticks").ok().flatten() {
            self.ticks = ticks as u32;
        }
        if let Some(rate) = config.getuint("simulation", "tick_rate").ok().flatten() {
            self.tick_rate = rate as u32;
        }
        if let Some(every) = config.getuint("simulation", "randomize_every").ok().flatten() {
            self.randomize_every = every as u32;
        }
        if let Some(seed) = config.getuint("simulation", "seed").ok().flatten() {
            self.seed = seed;
        }

        info!(
            "Loaded config: {}x{} world, {} ticks @ {} Hz, fault_policy={:?}, seed={}",
            self.world_width,
            self.world_height,
            self.ticks,
            self.tick_rate,
            self.dispatch.fault_policy,
            self.seed
        );

        Ok(())
    }

    /// Save configuration to the INI file.
    ///
    /// Creates the file if it doesn't exist.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();

        config.set("world", "width", Some(self.world_width.to_string()));
        config.set("world", "height", Some(self.world_height.to_string()));
        config.set(
            "world",
            "map",
            self.map_path.as_ref().map(|p| p.display().to_string()),
        );

        config.set("camera", "move_speed", Some(self.camera.move_speed.to_string()));
        config.set("camera", "zoom_speed", Some(self.camera.zoom_speed.to_string()));
        config.set("camera", "max_zoom", Some(self.camera.max_zoom.to_string()));
        config.set("camera", "priority", Some(self.camera.priority.to_string()));

        let policy = match self.dispatch.fault_policy {
            FaultPolicy::Isolate => "isolate",
            FaultPolicy::Propagate => "propagate",
        };
        config.set("events", "fault_policy", Some(policy.to_string()));
        config.set(
            "events",
            "pending_warn_threshold",
            Some(self.dispatch.pending_warn_threshold.to_string()),
        );

        config.set("simulation", "ticks", Some(self.ticks.to_string()));
        config.set("simulation", "tick_rate", Some(self.tick_rate.to_string()));
        config.set(
            "simulation",
            "randomize_every",
            Some(self.randomize_every.to_string()),
        );
        config.set("simulation", "seed", Some(self.seed.to_string()));

        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }
}
