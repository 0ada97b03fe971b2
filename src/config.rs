use std::path::Path;

use bevy::prelude::*;
use serde::Deserialize;

use crate::error::GridError;
use crate::simulation::ActivationStrategy;
use crate::world::NeighborSet;
use crate::world::heightfield::checked_cell_count;

/// Inclusive range a grid extent is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ExtentRange {
    pub min: u32,
    pub max: u32,
}

impl ExtentRange {
    pub const fn fixed(size: u32) -> Self {
        Self { min: size, max: size }
    }

    fn validate(&self, axis: &'static str) -> Result<(), GridError> {
        if self.min < 1 || self.min > self.max {
            return Err(GridError::InvalidExtent {
                axis,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Construction-time parameters for the world grid and its activation policy
#[derive(Resource, Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    pub width: ExtentRange,
    pub length: ExtentRange,
    pub floors: u32,
    /// Diffusion variance applied on every floor
    pub variance: i32,
    /// Height units between a floor's top and the offset of the floor above
    pub floor_gap: i32,
    pub neighbors: NeighborSet,
    /// Run the look-ahead smoothing pass after the first pass
    pub refine: bool,
    pub tile_scale: [f32; 3],
    pub seed: Option<u64>,
    pub tracking_radius: u32,
    pub activation_strategy: ActivationStrategy,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: ExtentRange { min: 10, max: 19 },
            length: ExtentRange { min: 10, max: 19 },
            floors: 1,
            variance: 2,
            floor_gap: 2,
            neighbors: NeighborSet::WestSouthDiagonals,
            refine: false,
            tile_scale: [1.0, 1.0, 1.0],
            seed: None,
            tracking_radius: 2,
            activation_strategy: ActivationStrategy::RosterScan,
        }
    }
}

impl GridConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, GridError> {
        let config: GridConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, GridError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| GridError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Reject parameters that cannot produce a grid
    pub fn validate(&self) -> Result<(), GridError> {
        self.width.validate("width")?;
        self.length.validate("length")?;
        if self.floors < 1 {
            return Err(GridError::NoFloors);
        }
        checked_cell_count(self.width.max, self.length.max, self.floors)?;
        if self.variance < 1 {
            return Err(GridError::InvalidVariance(self.variance));
        }
        if self.floor_gap < 1 {
            return Err(GridError::InvalidFloorGap(self.floor_gap));
        }
        if self.tile_scale.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err(GridError::InvalidTileScale(self.tile_scale));
        }
        Ok(())
    }

    pub fn tile_scale(&self) -> Vec3 {
        Vec3::from_array(self.tile_scale)
    }
}
