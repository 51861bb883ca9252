//! Plain data owned by the world.
//!
//! Submodules overview:
//! - [`tile`] – tile position and ground type

pub mod tile;
