use bevy::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::cell::Cell;
use super::coords::Coords;
use super::heightfield::{HeightField, HeightFieldGenerator, checked_cell_count};
use super::occlusion::cull_hidden_faces;
use crate::config::GridConfig;
use crate::error::GridError;

/// Read-only view of one column's floors, bottom to top
#[derive(Debug, Clone, Copy)]
pub struct Column<'a> {
    x: u32,
    z: u32,
    cells: &'a [Cell],
}

impl<'a> Column<'a> {
    #[inline]
    pub fn x(&self) -> u32 {
        self.x
    }

    #[inline]
    pub fn z(&self) -> u32 {
        self.z
    }

    #[inline]
    pub fn address(&self) -> IVec2 {
        IVec2::new(self.x as i32, self.z as i32)
    }

    #[inline]
    pub fn cells(&self) -> &'a [Cell] {
        self.cells
    }

    pub fn cell(&self, floor: u32) -> Option<&'a Cell> {
        self.cells.get(floor as usize)
    }

    /// Highest solid top among the column's floors, 0 for an all-hole column
    pub fn top_height(&self) -> i32 {
        self.cells
            .iter()
            .filter(|cell| !cell.is_hole())
            .map(Cell::top_height)
            .max()
            .unwrap_or(0)
    }
}

/// The terrain model: a fixed `width` x `length` grid of columns, each with
/// the same number of floors.
///
/// Cells live in one flat vector, column by column (x outer, z inner), floors
/// contiguous inside a column. Shape, offsets and thicknesses never change
/// after construction.
#[derive(Resource, Debug, Clone)]
pub struct WorldGrid {
    width: u32,
    length: u32,
    floors: u32,
    tile_scale: Vec3,
    cells: Vec<Cell>,
    extents: Vec3,
    seed: Option<u64>,
    culled_faces: usize,
    holes: usize,
}

impl WorldGrid {
    /// Draw extents, generate a height field and build the grid from it
    pub fn generate(config: &GridConfig) -> Result<Self, GridError> {
        config.validate()?;

        let seed = config.seed.unwrap_or_else(rand::random);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let width = rng.random_range(config.width.min..=config.width.max);
        let length = rng.random_range(config.length.min..=config.length.max);

        let generator = HeightFieldGenerator {
            variance: config.variance,
            neighbors: config.neighbors,
            refine: config.refine,
        };
        let field = generator.generate(width, length, config.floors, &mut rng)?;

        let mut grid = Self::from_height_field(&field, config.tile_scale(), config.floor_gap)?;
        grid.seed = Some(seed);

        info!(
            width,
            length,
            floors = config.floors,
            seed,
            culled_faces = grid.culled_faces,
            holes = grid.holes,
            "built world grid"
        );
        Ok(grid)
    }

    /// Materialize one column per (x, z) with one cell per floor.
    ///
    /// Cells take their offsets from the field when it carries them.
    /// Otherwise floor 0 sits at offset 0 and every higher floor starts
    /// `floor_gap` units above the top of the floor below it.
    pub fn from_height_field(
        field: &HeightField,
        tile_scale: Vec3,
        floor_gap: i32,
    ) -> Result<Self, GridError> {
        if field.width() == 0 || field.length() == 0 || field.floors() == 0 {
            return Err(GridError::MalformedHeightField(format!(
                "cannot build a {}x{}x{} grid",
                field.width(),
                field.length(),
                field.floors()
            )));
        }
        if floor_gap < 1 {
            return Err(GridError::InvalidFloorGap(floor_gap));
        }
        if !tile_scale.is_finite() || tile_scale.min_element() <= 0.0 {
            return Err(GridError::InvalidTileScale(tile_scale.to_array()));
        }

        field.check_columns()?;

        let (width, length, floors) = (field.width(), field.length(), field.floors());
        let mut cells = Vec::with_capacity(checked_cell_count(width, length, floors)?);
        let mut holes = 0;
        let mut max_top = 0;

        for x in 0..width {
            for z in 0..length {
                let mut base = 0;
                for floor in 0..floors {
                    let thickness = field.get(floor, x, z).unwrap_or(0);
                    let offset = field.offset(floor, x, z).unwrap_or(base);
                    let cell = Cell::new(x, z, floor, offset, thickness);
                    if cell.is_hole() {
                        holes += 1;
                    }
                    max_top = max_top.max(cell.top_height());
                    base = cell.top_height() + floor_gap;
                    cells.push(cell);
                }
            }
        }

        let culled_faces = cull_hidden_faces(&mut cells, width, length, floors);
        if holes > 0 {
            debug!(holes, "clamped non-positive thickness to holes");
        }

        let extents = Vec3::new(width as f32, max_top as f32, length as f32) * tile_scale;

        Ok(Self {
            width,
            length,
            floors,
            tile_scale,
            cells,
            extents,
            seed: None,
            culled_faces,
            holes,
        })
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

    #[inline]
    pub fn tile_scale(&self) -> Vec3 {
        self.tile_scale
    }

    /// World-space size: columns x tile scale, tallest top x tile scale
    #[inline]
    pub fn extents(&self) -> Vec3 {
        self.extents
    }

    /// Ground-level centre of the grid
    pub fn center(&self) -> Vec3 {
        Vec3::new(self.extents.x / 2.0, 0.0, self.extents.z / 2.0)
    }

    /// Seed used for generation, if the grid was generated
    #[inline]
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    #[inline]
    pub fn culled_faces(&self) -> usize {
        self.culled_faces
    }

    #[inline]
    pub fn hole_count(&self) -> usize {
        self.holes
    }

    #[inline]
    pub fn contains_column(&self, x: i32, z: i32) -> bool {
        x >= 0 && z >= 0 && (x as u32) < self.width && (z as u32) < self.length
    }

    #[inline]
    fn column_start(&self, x: i32, z: i32) -> Option<usize> {
        if !self.contains_column(x, z) {
            return None;
        }
        Some((x as usize * self.length as usize + z as usize) * self.floors as usize)
    }

    /// Bounds-checked column lookup
    pub fn column(&self, x: i32, z: i32) -> Option<Column<'_>> {
        let start = self.column_start(x, z)?;
        Some(Column {
            x: x as u32,
            z: z as u32,
            cells: &self.cells[start..start + self.floors as usize],
        })
    }

    pub(crate) fn column_cells_mut(&mut self, x: i32, z: i32) -> Option<&mut [Cell]> {
        let start = self.column_start(x, z)?;
        let floors = self.floors as usize;
        Some(&mut self.cells[start..start + floors])
    }

    /// All columns in x-outer, z-inner order
    pub fn columns(&self) -> impl Iterator<Item = Column<'_>> {
        let length = self.length as usize;
        self.cells
            .chunks(self.floors as usize)
            .enumerate()
            .map(move |(i, cells)| Column {
                x: (i / length) as u32,
                z: (i % length) as u32,
                cells,
            })
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    pub fn cell_at(&self, x: i32, z: i32, floor: i32) -> Option<&Cell> {
        if floor < 0 {
            return None;
        }
        self.column(x, z)?.cell(floor as u32)
    }

    /// Cell addressed by resolved coordinates; `None` for Empty or out of range
    pub fn cell(&self, coords: &Coords) -> Option<&Cell> {
        if coords.is_empty() {
            return None;
        }
        self.cell_at(coords.x, coords.z, coords.floor)
    }

    /// Hide or show a solid cell. Returns the resulting state, `None` when
    /// the address is out of range.
    pub fn set_cell_active(&mut self, coords: &Coords, active: bool) -> Option<bool> {
        if coords.is_empty() || coords.floor < 0 {
            return None;
        }
        let floor = coords.floor as usize;
        self.column_cells_mut(coords.x, coords.z)?
            .get_mut(floor)
            .map(|cell| cell.set_active(active))
    }

    /// Height units to world y
    #[inline]
    pub fn world_height(&self, height: i32) -> f32 {
        height as f32 * self.tile_scale.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtentRange;
    use crate::world::cell::{Face, face_flags};

    fn config(seed: u64) -> GridConfig {
        GridConfig {
            seed: Some(seed),
            ..default()
        }
    }

    #[test]
    fn test_generate_is_deterministic() {
        let a = WorldGrid::generate(&config(1234)).unwrap();
        let b = WorldGrid::generate(&config(1234)).unwrap();

        assert_eq!((a.width(), a.length()), (b.width(), b.length()));
        assert!(a.cells().eq(b.cells()));
        assert_eq!(a.seed(), Some(1234));
    }

    #[test]
    fn test_extents_drawn_from_ranges() {
        for seed in 0..16 {
            let grid = WorldGrid::generate(&config(seed)).unwrap();
            assert!((10..=19).contains(&grid.width()));
            assert!((10..=19).contains(&grid.length()));
        }
    }

    #[test]
    fn test_column_invariant_holds_on_every_column() {
        let grid = WorldGrid::generate(&GridConfig {
            floors: 4,
            variance: 3,
            refine: true,
            seed: Some(77),
            ..default()
        })
        .unwrap();

        for column in grid.columns() {
            assert_eq!(column.cells().len(), 4);
            for pair in column.cells().windows(2) {
                assert!(pair[0].offset() < pair[1].offset());
                assert!(pair[0].top_height() <= pair[1].offset());
            }
        }
    }

    #[test]
    fn test_single_column_grid() {
        let grid = WorldGrid::generate(&GridConfig {
            width: ExtentRange::fixed(1),
            length: ExtentRange::fixed(1),
            seed: Some(9),
            ..default()
        })
        .unwrap();

        assert_eq!(grid.columns().count(), 1);
        let column = grid.column(0, 0).unwrap();
        assert!(column.cells()[0].thickness() >= 1);
        assert_eq!(column.cells()[0].faces(), face_flags::ALL_SIDES);
    }

    #[test]
    fn test_invalid_config_fails_before_building() {
        let result = WorldGrid::generate(&GridConfig {
            width: ExtentRange::fixed(0),
            ..default()
        });
        assert!(matches!(result, Err(GridError::InvalidExtent { .. })));
    }

    #[test]
    fn test_holes_are_clamped_and_inactive() {
        let field = HeightField::from_layers(vec![
            vec![vec![3, -1], vec![0, 2]],
            vec![vec![1, 1], vec![-4, 1]],
        ])
        .unwrap();
        let grid = WorldGrid::from_height_field(&field, Vec3::ONE, 2).unwrap();

        assert_eq!(grid.hole_count(), 3);
        let hole = grid.cell_at(0, 1, 0).unwrap();
        assert!(hole.is_hole());
        assert!(!hole.is_active());
        // floor above a hole still starts above it
        assert_eq!(grid.cell_at(0, 1, 1).unwrap().offset(), 2);
        assert_eq!(grid.cell_at(1, 0, 1).unwrap().offset(), 2);
        assert!(grid.cell_at(1, 0, 1).unwrap().is_hole());
    }

    #[test]
    fn test_extents_and_center() {
        let mut field = HeightField::flat(10, 6, 1, 1).unwrap();
        field.set(0, 2, 3, 7);
        let grid = WorldGrid::from_height_field(&field, Vec3::new(2.0, 0.5, 3.0), 1).unwrap();

        assert_eq!(grid.extents(), Vec3::new(20.0, 3.5, 18.0));
        assert_eq!(grid.center(), Vec3::new(10.0, 0.0, 9.0));
    }

    #[test]
    fn test_column_lookup_bounds() {
        let grid = WorldGrid::from_height_field(&HeightField::flat(4, 5, 2, 1).unwrap(), Vec3::ONE, 1).unwrap();

        assert!(grid.column(-1, 0).is_none());
        assert!(grid.column(0, 5).is_none());
        assert!(grid.column(4, 0).is_none());

        let column = grid.column(3, 4).unwrap();
        assert_eq!(column.address(), IVec2::new(3, 4));
        assert_eq!(column.cells()[1].floor(), 1);
        assert!(grid.cell_at(3, 4, 2).is_none());
        assert!(grid.cell(&Coords::EMPTY).is_none());
    }

    #[test]
    fn test_columns_iterate_in_generation_order() {
        let grid = WorldGrid::from_height_field(&HeightField::flat(3, 2, 1, 1).unwrap(), Vec3::ONE, 1).unwrap();
        let order: Vec<_> = grid.columns().map(|c| (c.x(), c.z())).collect();
        assert_eq!(order, vec![(0, 0), (0, 1), (1, 0), (1, 1), (2, 0), (2, 1)]);
    }

    #[test]
    fn test_set_cell_active() {
        let field = HeightField::from_layers(vec![vec![vec![2, 0]]]).unwrap();
        let mut grid = WorldGrid::from_height_field(&field, Vec3::ONE, 1).unwrap();
        let solid = Coords::new(0, 0, 2, 0);
        let hole = Coords::new(0, 1, 0, 0);

        assert_eq!(grid.set_cell_active(&solid, false), Some(false));
        assert!(!grid.cell(&solid).unwrap().is_active());
        assert_eq!(grid.set_cell_active(&solid, true), Some(true));
        assert_eq!(grid.set_cell_active(&hole, true), Some(false));
        assert_eq!(grid.set_cell_active(&Coords::EMPTY, true), None);
    }

    #[test]
    fn test_occlusion_removes_covered_faces() {
        // 3x1 strip: tall, short, tall
        let field = HeightField::from_layers(vec![vec![vec![5], vec![2], vec![5]]]).unwrap();
        let grid = WorldGrid::from_height_field(&field, Vec3::ONE, 1).unwrap();

        let short = grid.cell_at(1, 0, 0).unwrap();
        assert!(!short.has_face(Face::West));
        assert!(!short.has_face(Face::East));
        // nothing north or south of a single-row strip
        assert!(short.has_face(Face::North));
        assert!(short.has_face(Face::South));

        let tall = grid.cell_at(0, 0, 0).unwrap();
        assert_eq!(tall.faces(), face_flags::ALL_SIDES);
        assert_eq!(grid.culled_faces(), 2);
    }

    #[test]
    fn test_equal_neighbours_hide_each_other() {
        let grid = WorldGrid::from_height_field(&HeightField::flat(3, 3, 1, 2).unwrap(), Vec3::ONE, 1).unwrap();
        assert_eq!(grid.cell_at(1, 1, 0).unwrap().faces(), face_flags::NONE);
        let corner = grid.cell_at(0, 0, 0).unwrap();
        assert!(corner.has_face(Face::West));
        assert!(corner.has_face(Face::South));
        assert!(!corner.has_face(Face::North));
        assert!(!corner.has_face(Face::East));
    }

    #[test]
    fn test_occlusion_matches_floors_across_stacked_columns() {
        // west column spans 0..2 and 4..6, east column spans 0..1 and 3..7
        let field = HeightField::from_cell_layers(vec![
            vec![vec![(2, 0)], vec![(1, 0)]],
            vec![vec![(2, 4)], vec![(4, 3)]],
        ])
        .unwrap();
        let grid = WorldGrid::from_height_field(&field, Vec3::ONE, 1).unwrap();

        // the east column's upper floor covers the west upper floor only
        assert!(grid.cell_at(0, 0, 0).unwrap().has_face(Face::East));
        assert!(!grid.cell_at(0, 0, 1).unwrap().has_face(Face::East));
        // the west ground floor covers the short east ground floor
        assert!(!grid.cell_at(1, 0, 0).unwrap().has_face(Face::West));
        assert!(grid.cell_at(1, 0, 1).unwrap().has_face(Face::West));
        assert_eq!(grid.culled_faces(), 2);
    }

    #[test]
    fn test_explicit_offsets_replace_floor_gap() {
        let field = HeightField::from_cell_layers(vec![
            vec![vec![(3, 0), (1, 2)]],
            vec![vec![(2, 10), (0, 4)]],
        ])
        .unwrap();
        let grid = WorldGrid::from_height_field(&field, Vec3::ONE, 5).unwrap();

        let upper = grid.cell_at(0, 0, 1).unwrap();
        assert_eq!((upper.offset(), upper.top_height()), (10, 12));
        let ground = grid.cell_at(0, 1, 0).unwrap();
        assert_eq!((ground.offset(), ground.top_height()), (2, 3));
        assert!(grid.cell_at(0, 1, 1).unwrap().is_hole());
        assert_eq!(grid.extents().y, 12.0);
    }

    #[test]
    fn test_overlapping_offsets_are_rejected() {
        let mut field = HeightField::from_cell_layers(vec![vec![vec![(1, 0)]], vec![vec![(1, 3)]]]).unwrap();
        assert!(WorldGrid::from_height_field(&field, Vec3::ONE, 1).is_ok());

        // floor 0 now reaches 0..5, past floor 1's offset
        field.set(0, 0, 0, 5);
        let err = WorldGrid::from_height_field(&field, Vec3::ONE, 1).unwrap_err();
        assert!(matches!(err, GridError::MalformedHeightField(_)));
    }

    #[test]
    fn test_column_top_height() {
        let field = HeightField::from_layers(vec![vec![vec![4, 1]], vec![vec![0, 2]]]).unwrap();
        let grid = WorldGrid::from_height_field(&field, Vec3::ONE, 2).unwrap();
        // the hole stacked above 0..4 does not raise the surface
        assert_eq!(grid.column(0, 0).unwrap().top_height(), 4);
        assert_eq!(grid.column(0, 1).unwrap().top_height(), 5);

        let empty = HeightField::from_layers(vec![vec![vec![0]]]).unwrap();
        let grid = WorldGrid::from_height_field(&empty, Vec3::ONE, 1).unwrap();
        assert_eq!(grid.column(0, 0).unwrap().top_height(), 0);
    }

    #[test]
    fn test_holes_do_not_occlude() {
        let field = HeightField::from_layers(vec![vec![vec![0], vec![0]]]).unwrap();
        let grid = WorldGrid::from_height_field(&field, Vec3::ONE, 1).unwrap();
        assert_eq!(grid.culled_faces(), 0);
    }
}
