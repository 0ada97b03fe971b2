use rand::Rng;
use serde::Deserialize;

use crate::error::GridError;

/// Which already-generated neighbours feed the diffusion average
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeighborSet {
    /// West (x - 1) and south (z - 1) only
    WestSouth,
    /// West, south and the two visited diagonals (x - 1, z ± 1)
    #[default]
    WestSouthDiagonals,
}

impl NeighborSet {
    /// Neighbour steps for the first pass. Every step points at a column
    /// already visited in x-outer, z-inner order.
    fn visited(self) -> &'static [(i32, i32)] {
        match self {
            NeighborSet::WestSouth => &[(-1, 0), (0, -1)],
            NeighborSet::WestSouthDiagonals => &[(-1, 0), (0, -1), (-1, -1), (-1, 1)],
        }
    }

    /// Neighbour steps for the refinement pass, adding the mirrored
    /// east/north side.
    fn look_ahead(self) -> &'static [(i32, i32)] {
        match self {
            NeighborSet::WestSouth => &[(-1, 0), (0, -1), (1, 0), (0, 1)],
            NeighborSet::WestSouthDiagonals => &[
                (-1, 0),
                (0, -1),
                (-1, -1),
                (-1, 1),
                (1, 0),
                (0, 1),
                (1, 1),
                (1, -1),
            ],
        }
    }
}

/// Upper bound on `width * length * floors` for any height field or grid
pub const MAX_CELLS: usize = 1 << 24;

/// Number of cells in a `width x length x floors` grid, or
/// [`GridError::GridTooLarge`] when it overflows or exceeds [`MAX_CELLS`].
pub(crate) fn checked_cell_count(width: u32, length: u32, floors: u32) -> Result<usize, GridError> {
    (width as usize)
        .checked_mul(length as usize)
        .and_then(|cells| cells.checked_mul(floors as usize))
        .filter(|cells| *cells <= MAX_CELLS)
        .ok_or(GridError::GridTooLarge {
            width,
            length,
            floors,
        })
}

/// Flatten `[floor][x][z]` layers into floor-major storage
fn flatten<T>(layers: Vec<Vec<Vec<T>>>) -> Result<(u32, u32, u32, Vec<T>), GridError> {
    let floors = layers.len();
    let width = layers.first().map_or(0, Vec::len);
    let length = layers
        .first()
        .and_then(|layer| layer.first())
        .map_or(0, Vec::len);

    if floors == 0 || width == 0 || length == 0 {
        return Err(GridError::MalformedHeightField(
            "height field must have at least one floor, row and column".into(),
        ));
    }
    let dimension = |n: usize| u32::try_from(n).unwrap_or(u32::MAX);
    let (width_u32, length_u32, floors_u32) = (dimension(width), dimension(length), dimension(floors));
    let count = checked_cell_count(width_u32, length_u32, floors_u32)?;

    let mut values = Vec::with_capacity(count);
    for (floor, layer) in layers.into_iter().enumerate() {
        if layer.len() != width {
            return Err(GridError::MalformedHeightField(format!(
                "floor {floor} has {} rows, expected {width}",
                layer.len()
            )));
        }
        for (x, row) in layer.into_iter().enumerate() {
            if row.len() != length {
                return Err(GridError::MalformedHeightField(format!(
                    "floor {floor} row {x} has {} columns, expected {length}",
                    row.len()
                )));
            }
            values.extend(row);
        }
    }

    Ok((width_u32, length_u32, floors_u32, values))
}

/// Per-floor thickness values for every column, optionally with an
/// explicit base offset per cell.
///
/// Stored floor-major, then x, then z: `(floor * width + x) * length + z`.
/// Without offsets the grid stacks each floor a fixed gap above the one
/// below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeightField {
    width: u32,
    length: u32,
    floors: u32,
    thickness: Vec<i32>,
    offsets: Option<Vec<i32>>,
}

impl HeightField {
    /// A level where every cell has the same thickness
    pub fn flat(width: u32, length: u32, floors: u32, thickness: i32) -> Result<Self, GridError> {
        let count = checked_cell_count(width, length, floors)?;
        Ok(Self {
            width,
            length,
            floors,
            thickness: vec![thickness; count],
            offsets: None,
        })
    }

    /// Build from explicit thickness layers indexed `[floor][x][z]`
    pub fn from_layers(layers: Vec<Vec<Vec<i32>>>) -> Result<Self, GridError> {
        let (width, length, floors, thickness) = flatten(layers)?;
        Ok(Self {
            width,
            length,
            floors,
            thickness,
            offsets: None,
        })
    }

    /// Build from explicit `(thickness, offset)` layers indexed `[floor][x][z]`.
    ///
    /// Offsets are used as given, so floors may sit any distance apart.
    /// Within every column offsets must strictly increase and no floor may
    /// reach above the offset of the floor on top of it.
    pub fn from_cell_layers(layers: Vec<Vec<Vec<(i32, i32)>>>) -> Result<Self, GridError> {
        let (width, length, floors, cells) = flatten(layers)?;
        let (thickness, offsets) = cells.into_iter().unzip();
        let field = Self {
            width,
            length,
            floors,
            thickness,
            offsets: Some(offsets),
        };
        field.check_columns()?;
        Ok(field)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn length(&self) -> u32 {
        self.length
    }

    #[inline]
    pub fn floors(&self) -> u32 {
        self.floors
    }

    /// Whether cells carry explicit offsets instead of gap stacking
    #[inline]
    pub fn has_offsets(&self) -> bool {
        self.offsets.is_some()
    }

    #[inline]
    fn index(&self, floor: u32, x: u32, z: u32) -> Option<usize> {
        if floor >= self.floors || x >= self.width || z >= self.length {
            return None;
        }
        Some((floor as usize * self.width as usize + x as usize) * self.length as usize + z as usize)
    }

    pub fn get(&self, floor: u32, x: u32, z: u32) -> Option<i32> {
        self.index(floor, x, z).map(|idx| self.thickness[idx])
    }

    /// Explicit offset of a cell; `None` for gap-stacked fields
    pub fn offset(&self, floor: u32, x: u32, z: u32) -> Option<i32> {
        let offsets = self.offsets.as_ref()?;
        self.index(floor, x, z).map(|idx| offsets[idx])
    }

    pub fn set(&mut self, floor: u32, x: u32, z: u32, thickness: i32) {
        if let Some(idx) = self.index(floor, x, z) {
            self.thickness[idx] = thickness;
        }
    }

    /// One floor's values in x-outer, z-inner order
    pub fn layer(&self, floor: u32) -> &[i32] {
        let size = self.width as usize * self.length as usize;
        let start = floor.min(self.floors) as usize * size;
        &self.thickness[start..(start + size).min(self.thickness.len())]
    }

    /// Check explicit offsets against the column invariant: offsets strictly
    /// increase with the floor and each floor's top stays at or below the
    /// next floor's offset. Gap-stacked fields always pass.
    pub(crate) fn check_columns(&self) -> Result<(), GridError> {
        let Some(offsets) = &self.offsets else {
            return Ok(());
        };
        let size = self.width as usize * self.length as usize;
        let length = self.length as usize;

        for column in 0..size {
            for floor in 1..self.floors as usize {
                let below = (floor - 1) * size + column;
                let above = floor * size + column;
                let top = offsets[below] + self.thickness[below].max(0);
                if offsets[above] <= offsets[below] || offsets[above] < top {
                    return Err(GridError::MalformedHeightField(format!(
                        "column ({}, {}) floor {floor} at offset {} overlaps floor {} spanning {}..{top}",
                        column / length,
                        column % length,
                        offsets[above],
                        floor - 1,
                        offsets[below],
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Randomized neighbour-averaging diffusion.
///
/// Floors are generated bottom to top; within a floor columns are visited
/// with x in the outer loop and z in the inner loop. The order is part of
/// the output: the same seed visited differently gives a different field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeightFieldGenerator {
    pub variance: i32,
    pub neighbors: NeighborSet,
    pub refine: bool,
}

impl Default for HeightFieldGenerator {
    fn default() -> Self {
        Self {
            variance: 2,
            neighbors: NeighborSet::WestSouthDiagonals,
            refine: false,
        }
    }
}

impl HeightFieldGenerator {
    pub fn generate(
        &self,
        width: u32,
        length: u32,
        floors: u32,
        rng: &mut impl Rng,
    ) -> Result<HeightField, GridError> {
        if self.variance < 1 {
            return Err(GridError::InvalidVariance(self.variance));
        }
        let mut field = HeightField::flat(width, length, floors, 0)?;
        let size = width as usize * length as usize;

        for floor in 0..floors as usize {
            let layer = &mut field.thickness[floor * size..(floor + 1) * size];
            self.diffuse(layer, width, length, self.neighbors.visited(), rng);
            // the look-ahead pass only starts once the whole layer exists
            if self.refine {
                self.diffuse(layer, width, length, self.neighbors.look_ahead(), rng);
            }
        }

        Ok(field)
    }

    fn diffuse(
        &self,
        layer: &mut [i32],
        width: u32,
        length: u32,
        steps: &[(i32, i32)],
        rng: &mut impl Rng,
    ) {
        let stride = length as usize;
        let mut heights = Vec::with_capacity(steps.len());

        for x in 0..width as i32 {
            for z in 0..length as i32 {
                heights.clear();
                heights.extend(steps.iter().filter_map(|(dx, dz)| {
                    let (nx, nz) = (x + dx, z + dz);
                    if nx < 0 || nz < 0 || nx >= width as i32 || nz >= length as i32 {
                        return None;
                    }
                    Some(layer[nx as usize * stride + nz as usize])
                }));

                layer[x as usize * stride + z as usize] = self.sample(&heights, rng);
            }
        }
    }

    fn sample(&self, neighbors: &[i32], rng: &mut impl Rng) -> i32 {
        let height = if neighbors.len() >= 2 {
            let sum: i32 = neighbors.iter().sum();
            let average = (sum as f32 / neighbors.len() as f32).round() as i32;
            rng.random_range(average - self.variance..=average + self.variance)
        } else {
            rng.random_range(1..2 * self.variance)
        };
        height.max(1)
    }
}
