use bevy::prelude::*;

use crate::world::{Coords, WorldGrid};

/// Marks an entity as part of the tracked-actor roster.
/// Its resolved grid address is kept in [`GridCoords`].
#[derive(Component, Debug, Default, Clone, Copy)]
#[require(GridCoords)]
pub struct TrackedActor;

/// The entity whose column is activated directly before the roster scan,
/// usually the controlled character
#[derive(Component, Debug, Default, Clone, Copy)]
#[require(TrackedActor)]
pub struct ActivationReference;

/// Last resolved coordinates of a tracked actor; Empty until resolved
#[derive(Component, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GridCoords(pub Coords);

/// Written when a tracked actor's resolved coordinates change
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordsChanged {
    pub entity: Entity,
    pub previous: Coords,
    pub current: Coords,
}

/// Yaw of a transform in degrees; 0 faces +z and 90 faces +x
pub fn facing_degrees(transform: &Transform) -> f32 {
    let (yaw, _, _) = transform.rotation.to_euler(EulerRot::YXZ);
    yaw.to_degrees()
}

/// Re-resolve every tracked actor against the grid
pub fn resolve_tracked_actors(
    grid: Res<WorldGrid>,
    mut actors: Query<(Entity, &Transform, &mut GridCoords), With<TrackedActor>>,
    mut changes: EventWriter<CoordsChanged>,
) {
    for (entity, transform, mut coords) in &mut actors {
        let current = grid.resolve(transform.translation);
        if coords.0 == current {
            continue;
        }

        trace!(?entity, previous = %coords.0, %current, "tracked actor changed tile");
        changes.write(CoordsChanged {
            entity,
            previous: coords.0,
            current,
        });
        coords.0 = current;
    }
}
