//! Long-lived state shared by the game loop.
//!
//! Overview
//! - `camera2d` – headless camera that publishes movement and zoom
//! - `eventmanager` – priority-queued publish/subscribe dispatcher
//! - `gameconfig` – settings loaded from an INI file
//! - `tilemap` – JSON tile map description
//! - `world` – the tile grid and its events
pub mod camera2d;
pub mod eventmanager;
pub mod gameconfig;
pub mod tilemap;
pub mod world;
