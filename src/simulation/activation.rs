use bevy::ecs::query::QuerySingleError;
use bevy::prelude::*;
use serde::Deserialize;

use super::tracking::{ActivationReference, GridCoords, TrackedActor};
use crate::config::GridConfig;
use crate::world::{Coords, ProximityMask, WorldGrid};

/// How the per-column activation predicate is evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationStrategy {
    /// Test every column against every actor, O(columns x actors)
    #[default]
    RosterScan,
    /// Stamp each actor's diamond into a [`ProximityMask`]
    Mask,
}

/// Flag transitions produced by one refresh
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivationStats {
    pub activated: usize,
    pub deactivated: usize,
    pub active_columns: usize,
}

impl ActivationStats {
    pub fn changed(&self) -> bool {
        self.activated + self.deactivated > 0
    }
}

/// Proximity policy for cell colliders.
///
/// A column is in range when some tracked actor's column lies within
/// `tracking_radius` Manhattan steps. Solid, visible cells of in-range
/// columns carry a collider; everything else does not. Only the
/// collider-present flag is ever written.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProximityActivation {
    pub tracking_radius: u32,
    pub strategy: ActivationStrategy,
}

impl Default for ProximityActivation {
    fn default() -> Self {
        Self {
            tracking_radius: 2,
            strategy: ActivationStrategy::RosterScan,
        }
    }
}

impl ProximityActivation {
    pub fn new(tracking_radius: u32) -> Self {
        Self {
            tracking_radius,
            ..default()
        }
    }

    pub fn from_config(config: &GridConfig) -> Self {
        Self {
            tracking_radius: config.tracking_radius,
            strategy: config.activation_strategy,
        }
    }

    /// Whether any resolved actor is within the tracking radius of `column`
    pub fn in_range(&self, column: IVec2, actors: &[Coords]) -> bool {
        actors.iter().filter(|a| !a.is_empty()).any(|actor| {
            column.x.abs_diff(actor.x) + column.y.abs_diff(actor.z) <= self.tracking_radius
        })
    }

    /// Switch on the colliders of the reference column's own cells.
    /// Returns the number of cells that changed.
    pub fn activate_near(&self, grid: &mut WorldGrid, reference: Coords) -> usize {
        if reference.is_empty() {
            return 0;
        }
        grid.column_cells_mut(reference.x, reference.z)
            .map_or(0, |cells| {
                cells
                    .iter_mut()
                    .map(|cell| cell.set_collider(true))
                    .filter(|changed| *changed)
                    .count()
            })
    }

    /// Re-evaluate every cell against the roster
    pub fn refresh(&self, grid: &mut WorldGrid, actors: &[Coords]) -> ActivationStats {
        self.refresh_with_reference(grid, None, actors)
    }

    /// Re-evaluate every cell, activating the reference column first and
    /// leaving it out of the roster scan.
    ///
    /// The wanted state of every column is computed before any flag is
    /// written.
    pub fn refresh_with_reference(
        &self,
        grid: &mut WorldGrid,
        reference: Option<Coords>,
        actors: &[Coords],
    ) -> ActivationStats {
        let mut stats = ActivationStats::default();
        let reference = reference.filter(|r| !r.is_empty());
        if let Some(reference) = reference {
            stats.activated += self.activate_near(grid, reference);
        }
        let reference_column = reference.map(|r| r.column());

        let wanted: Vec<bool> = match self.strategy {
            ActivationStrategy::RosterScan => grid
                .columns()
                .map(|column| {
                    let address = column.address();
                    Some(address) == reference_column || self.in_range(address, actors)
                })
                .collect(),
            ActivationStrategy::Mask => {
                let mask = ProximityMask::from_actors(grid, actors, self.tracking_radius);
                grid.columns()
                    .map(|column| {
                        let address = column.address();
                        Some(address) == reference_column || mask.contains(address)
                    })
                    .collect()
            }
        };

        let floors = grid.floors() as usize;
        for (cells, wanted) in grid.cells_mut().chunks_mut(floors).zip(wanted) {
            if wanted {
                stats.active_columns += 1;
            }
            for cell in cells {
                if cell.set_collider(wanted) {
                    if cell.collider_present() {
                        stats.activated += 1;
                    } else {
                        stats.deactivated += 1;
                    }
                }
            }
        }

        stats
    }
}

/// Per-tick refresh driven by the tracked-actor roster
pub fn refresh_activation(
    mut grid: ResMut<WorldGrid>,
    manager: Res<ProximityActivation>,
    roster: Query<&GridCoords, With<TrackedActor>>,
    reference: Query<&GridCoords, With<ActivationReference>>,
) {
    let actors: Vec<Coords> = roster.iter().map(|coords| coords.0).collect();
    let reference = match reference.single() {
        Ok(coords) => Some(coords.0),
        Err(QuerySingleError::NoEntities(_)) => None,
        Err(QuerySingleError::MultipleEntities(_)) => {
            warn!(
                references = reference.iter().count(),
                "more than one ActivationReference; refreshing from the roster only"
            );
            None
        }
    };

    let stats = manager.refresh_with_reference(grid.bypass_change_detection(), reference, &actors);
    if stats.changed() {
        grid.set_changed();
        debug!(
            activated = stats.activated,
            deactivated = stats.deactivated,
            active_columns = stats.active_columns,
            actors = actors.len(),
            "refreshed tile colliders"
        );
    }
}
