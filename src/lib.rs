//! Tile world grid: height-field generation, stacked-floor columns,
//! coordinate resolution and proximity-driven collider activation.

pub mod config;
pub mod error;
pub mod simulation;
pub mod world;

pub use config::GridConfig;
pub use error::GridError;
