//! Event consumers.
//!
//! Submodules overview
//! - [`tilevisualizer`] – mirror tile sprites from world and tile events
pub mod tilevisualizer;
