use bevy::prelude::*;

use super::coords::Coords;
use super::grid::WorldGrid;

/// Grid-bucket index of the columns near at least one actor.
///
/// Each actor stamps its Manhattan diamond into a per-column bitmap, so a
/// refresh costs O(actors x radius^2 + columns) instead of
/// O(columns x actors).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProximityMask {
    width: u32,
    length: u32,
    marked: Vec<bool>,
}

impl ProximityMask {
    pub fn new(width: u32, length: u32) -> Self {
        Self {
            width,
            length,
            marked: vec![false; width as usize * length as usize],
        }
    }

    /// Mask of every column within `radius` of any non-empty actor coordinate
    pub fn from_actors(grid: &WorldGrid, actors: &[Coords], radius: u32) -> Self {
        let mut mask = Self::new(grid.width(), grid.length());
        for actor in actors.iter().filter(|a| !a.is_empty()) {
            mask.stamp(grid, actor.column(), radius);
        }
        mask
    }

    pub fn stamp(&mut self, grid: &WorldGrid, center: IVec2, radius: u32) {
        for column in grid.columns_within_radius(center, radius) {
            self.mark(column.address());
        }
    }

    pub fn mark(&mut self, column: IVec2) {
        if let Some(idx) = self.index(column) {
            self.marked[idx] = true;
        }
    }

    #[inline]
    fn index(&self, column: IVec2) -> Option<usize> {
        if column.x < 0 || column.y < 0 || column.x as u32 >= self.width || column.y as u32 >= self.length {
            return None;
        }
        Some(column.x as usize * self.length as usize + column.y as usize)
    }

    pub fn contains(&self, column: IVec2) -> bool {
        self.index(column).is_some_and(|idx| self.marked[idx])
    }

    pub fn marked_count(&self) -> usize {
        self.marked.iter().filter(|m| **m).count()
    }
}
