use bevy::prelude::*;

use super::activation::{ProximityActivation, refresh_activation};
use super::tracking::{CoordsChanged, resolve_tracked_actors};
use crate::config::GridConfig;
use crate::world::WorldGrid;

/// Written once the grid resource exists and may be queried
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct GridReady {
    pub extents: Vec3,
    pub center: Vec3,
}

/// Per-tick ordering: actors are resolved before colliders are refreshed
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridSet {
    Resolve,
    Activate,
}

/// Builds the world grid at startup and runs proximity activation every
/// tick.
///
/// Per-tick systems wait for the [`WorldGrid`] resource; until it exists the
/// grid is simply not available yet.
#[derive(Default)]
pub struct WorldGridPlugin {
    pub config: GridConfig,
    /// Use this grid instead of generating one from `config`
    pub prebuilt: Option<WorldGrid>,
}

impl WorldGridPlugin {
    pub fn new(config: GridConfig) -> Self {
        Self {
            config,
            prebuilt: None,
        }
    }

    pub fn with_grid(grid: WorldGrid, tracking_radius: u32) -> Self {
        Self {
            config: GridConfig {
                tracking_radius,
                ..default()
            },
            prebuilt: Some(grid),
        }
    }
}

impl Plugin for WorldGridPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.config.clone())
            .insert_resource(ProximityActivation::from_config(&self.config))
            .add_event::<GridReady>()
            .add_event::<CoordsChanged>()
            .configure_sets(Update, (GridSet::Resolve, GridSet::Activate).chain())
            .add_systems(Startup, build_world_grid)
            .add_systems(
                Update,
                (
                    resolve_tracked_actors.in_set(GridSet::Resolve),
                    refresh_activation.in_set(GridSet::Activate),
                )
                    .run_if(resource_exists::<WorldGrid>),
            );

        if let Some(grid) = &self.prebuilt {
            app.insert_resource(grid.clone());
        }
    }
}

fn build_world_grid(
    mut commands: Commands,
    config: Res<GridConfig>,
    existing: Option<Res<WorldGrid>>,
    mut ready: EventWriter<GridReady>,
    mut exit: EventWriter<AppExit>,
) {
    if let Some(grid) = existing {
        info!(width = grid.width(), length = grid.length(), "using prebuilt world grid");
        ready.write(GridReady {
            extents: grid.extents(),
            center: grid.center(),
        });
        return;
    }

    match WorldGrid::generate(&config) {
        Ok(grid) => {
            ready.write(GridReady {
                extents: grid.extents(),
                center: grid.center(),
            });
            commands.insert_resource(grid);
        }
        Err(err) => {
            error!("failed to build world grid: {err}");
            exit.write(AppExit::error());
        }
    }
}
