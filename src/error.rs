use std::path::PathBuf;

use thiserror::Error;

/// Everything that can stop a world grid from being built.
///
/// Out-of-range queries and degenerate thicknesses are not errors: the
/// resolver answers with [`crate::world::Coords::EMPTY`] and thin cells
/// become holes.
#[derive(Debug, Error)]
pub enum GridError {
    #[error("{axis} range {min}..={max} is invalid: minimum must be at least 1 and not above the maximum")]
    InvalidExtent {
        axis: &'static str,
        min: u32,
        max: u32,
    },

    #[error("a grid needs at least one floor")]
    NoFloors,

    #[error("a {width}x{length}x{floors} grid exceeds the limit of {} cells", crate::world::MAX_CELLS)]
    GridTooLarge {
        width: u32,
        length: u32,
        floors: u32,
    },

    #[error("variance must be at least 1, got {0}")]
    InvalidVariance(i32),

    #[error("floor gap must be at least 1, got {0}")]
    InvalidFloorGap(i32),

    #[error("tile scale must be finite and positive on every axis, got {0:?}")]
    InvalidTileScale([f32; 3]),

    #[error("malformed height field: {0}")]
    MalformedHeightField(String),

    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}
