//! Per-tick world grid systems
//!
//! This module wires grid construction, tracked-actor coordinate resolution
//! and proximity-driven collider activation into the bevy schedule.

pub mod activation;
pub mod grid_plugin;
pub mod tracking;

pub use activation::*;
pub use grid_plugin::*;
pub use tracking::*;
