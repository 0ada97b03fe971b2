use std::fmt;

use bevy::prelude::*;

use super::cell::Cell;
use super::grid::{Column, WorldGrid};

/// A resolved grid address.
///
/// `y` is a height in height units (the top of the surface the position
/// stands on), not an index. [`Coords::EMPTY`] marks an unresolved position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coords {
    pub x: i32,
    pub z: i32,
    pub y: i32,
    pub floor: i32,
}

impl Default for Coords {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Coords {
    pub const EMPTY: Coords = Coords {
        x: -1,
        z: -1,
        y: -1,
        floor: -1,
    };

    pub const fn new(x: i32, z: i32, y: i32, floor: i32) -> Self {
        Self { x, z, y, floor }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }

    #[inline]
    pub fn column(&self) -> IVec2 {
        IVec2::new(self.x, self.z)
    }

    /// |dx| + |dz| between the two columns
    #[inline]
    pub fn manhattan(&self, other: &Coords) -> u32 {
        self.x.abs_diff(other.x) + self.z.abs_diff(other.z)
    }
}

impl fmt::Display for Coords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "(empty)");
        }
        write!(f, "({}, {}) floor {} y {}", self.x, self.z, self.floor, self.y)
    }
}

/// Cardinal facing, quantized from a yaw angle in degrees.
///
/// Sectors are 90 degrees wide, centred on each direction and closed on
/// their counter-clockwise edge: `[315, 45)` forward, `[45, 135)` right,
/// `[135, 225)` back, `[225, 315)` left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facing {
    Forward,
    Right,
    Back,
    Left,
}

impl Facing {
    pub fn from_degrees(degrees: f32) -> Option<Self> {
        if !degrees.is_finite() {
            return None;
        }
        let angle = degrees.rem_euclid(360.0);
        Some(if !(45.0..315.0).contains(&angle) {
            Facing::Forward
        } else if angle < 135.0 {
            Facing::Right
        } else if angle < 225.0 {
            Facing::Back
        } else {
            Facing::Left
        })
    }

    /// Column step (dx, dz); forward is +z, right is +x
    pub fn step(self) -> IVec2 {
        match self {
            Facing::Forward => IVec2::new(0, 1),
            Facing::Right => IVec2::new(1, 0),
            Facing::Back => IVec2::new(0, -1),
            Facing::Left => IVec2::new(-1, 0),
        }
    }
}

impl WorldGrid {
    /// Map a world position to the cell it stands in.
    ///
    /// Floors are scanned top to bottom for the first one whose top lies
    /// strictly below `position.y`; the result is the level above it. A
    /// position exactly on a top surface therefore stays on that floor's
    /// level. Below every top, the result is floor 0 at ground height.
    pub fn resolve(&self, position: Vec3) -> Coords {
        if !position.is_finite() {
            return Coords::EMPTY;
        }

        let scale = self.tile_scale();
        let x = (position.x / scale.x).floor() as i32;
        let z = (position.z / scale.z).floor() as i32;
        let Some(column) = self.column(x, z) else {
            return Coords::EMPTY;
        };

        let cells = column.cells();
        if let Some(below) = cells
            .iter()
            .rev()
            .find(|cell| self.world_height(cell.top_height()) < position.y)
        {
            return Coords::new(x, z, below.top_height(), below.floor() as i32 + 1);
        }

        match cells.first() {
            Some(ground) => Coords::new(x, z, ground.top_height(), 0),
            None => Coords::EMPTY,
        }
    }

    /// Resolve the tile one step ahead of an actor facing `facing_degrees`
    pub fn forward(&self, facing_degrees: f32, position: Vec3) -> Coords {
        let Some(facing) = Facing::from_degrees(facing_degrees) else {
            return Coords::EMPTY;
        };
        let step = facing.step().as_vec2();
        let scale = self.tile_scale();
        self.resolve(position + Vec3::new(step.x * scale.x, 0.0, step.y * scale.z))
    }

    /// Columns whose Manhattan distance to `center` is at most `radius`,
    /// in x-outer, z-inner order. Out-of-range addresses are skipped.
    pub fn columns_within_radius(&self, center: IVec2, radius: u32) -> Vec<Column<'_>> {
        let radius = i64::from(radius.min(self.width() + self.length()));
        let (cx, cz) = (i64::from(center.x), i64::from(center.y));
        let (max_x, max_z) = (i64::from(self.width()) - 1, i64::from(self.length()) - 1);

        let mut columns = Vec::new();
        for x in (cx - radius).max(0)..=(cx + radius).min(max_x) {
            let span = radius - (x - cx).abs();
            for z in (cz - span).max(0)..=(cz + span).min(max_z) {
                if let Some(column) = self.column(x as i32, z as i32) {
                    columns.push(column);
                }
            }
        }
        columns
    }

    /// Every cell of the columns within `radius` of `center`
    pub fn cells_within_radius(&self, center: IVec2, radius: u32) -> Vec<&Cell> {
        self.columns_within_radius(center, radius)
            .into_iter()
            .flat_map(|column| column.cells().iter())
            .collect()
    }
}
