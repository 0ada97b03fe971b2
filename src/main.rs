use std::time::Duration;

use bevy::{app::ScheduleRunnerPlugin, log::LogPlugin, prelude::*};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tile_world::{
    GridConfig,
    simulation::{
        ActivationReference, GridCoords, GridReady, GridSet, TrackedActor, WorldGridPlugin,
        facing_degrees,
    },
    world::WorldGrid,
};

const NPC_COUNT: usize = 3;

fn main() -> AppExit {
    let config = match std::env::args().nth(1) {
        Some(path) => match GridConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("{err}");
                return AppExit::error();
            }
        },
        None => GridConfig::default(),
    };

    App::new()
        .add_plugins(
            MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(1.0 / 60.0))),
        )
        .add_plugins(LogPlugin::default())
        .add_plugins(WorldGridPlugin::new(config))
        .insert_resource(HudTimer(Timer::from_seconds(1.0, TimerMode::Repeating)))
        .add_systems(Update, spawn_actors.run_if(on_event::<GridReady>))
        .add_systems(
            Update,
            (
                wander.before(GridSet::Resolve),
                report_hud.after(GridSet::Activate),
            )
                .run_if(resource_exists::<WorldGrid>),
        )
        .run()
}

/// Moves an actor along its facing and turns it at a fixed rate
#[derive(Component)]
struct Wanderer {
    speed: f32,
    turn_rate: f32,
}

#[derive(Resource)]
struct HudTimer(Timer);

fn spawn_actors(mut commands: Commands, grid: Res<WorldGrid>) {
    let mut rng = ChaCha8Rng::seed_from_u64(grid.seed().unwrap_or_default());
    let extents = grid.extents();

    commands.spawn((
        ActivationReference,
        Wanderer {
            speed: 1.5,
            turn_rate: 20.0,
        },
        Transform::from_translation(grid.center()),
    ));

    for _ in 0..NPC_COUNT {
        let position = Vec3::new(
            rng.random_range(0.0..extents.x),
            0.0,
            rng.random_range(0.0..extents.z),
        );
        commands.spawn((
            TrackedActor,
            Wanderer {
                speed: rng.random_range(0.5..2.0),
                turn_rate: rng.random_range(-45.0..45.0),
            },
            Transform::from_translation(position)
                .with_rotation(Quat::from_rotation_y(rng.random_range(0.0..std::f32::consts::TAU))),
        ));
    }

    info!(npcs = NPC_COUNT, "spawned tracked actors");
}

fn wander(time: Res<Time>, grid: Res<WorldGrid>, mut actors: Query<(&Wanderer, &mut Transform)>) {
    let dt = time.delta_secs();
    let extents = grid.extents();

    for (wanderer, mut transform) in &mut actors {
        transform.rotate_y(wanderer.turn_rate.to_radians() * dt);

        let heading = transform.rotation * Vec3::Z;
        let mut next = transform.translation + heading * wanderer.speed * dt;
        if next.x < 0.0 || next.z < 0.0 || next.x >= extents.x || next.z >= extents.z {
            // turn around at the edge of the world
            transform.rotate_y(std::f32::consts::PI);
            next = transform.translation;
        }

        // stand on the highest surface of the column
        let scale = grid.tile_scale();
        let (x, z) = ((next.x / scale.x).floor() as i32, (next.z / scale.z).floor() as i32);
        if let Some(column) = grid.column(x, z) {
            next.y = grid.world_height(column.top_height()) + 0.1;
        }
        transform.translation = next;
    }
}

fn report_hud(
    time: Res<Time>,
    mut timer: ResMut<HudTimer>,
    grid: Res<WorldGrid>,
    player: Query<(&Transform, &GridCoords), With<ActivationReference>>,
) {
    if !timer.0.tick(time.delta()).just_finished() {
        return;
    }

    if let Ok((transform, coords)) = player.single() {
        let ahead = grid.forward(facing_degrees(transform), transform.translation);
        let colliders = grid.cells().filter(|cell| cell.collider_present()).count();
        info!("current {} | forward {} | colliders {}", coords.0, ahead, colliders);
    }
}
