//! Core world grid module for the tile-based world
//!
//! This module handles height-field generation, the column/cell data model,
//! build-time occlusion culling, and coordinate resolution between world
//! positions and grid cells.

pub mod cell;
pub mod coords;
pub mod grid;
pub mod heightfield;
mod occlusion;
pub mod spatial_index;

pub use cell::*;
pub use coords::*;
pub use grid::*;
pub use heightfield::*;
pub use spatial_index::*;
