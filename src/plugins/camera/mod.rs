//! Camera plugin (render only).
//!
//! Spawns the 2D camera and, once its viewport is known, measures the visible world
//! rectangle and hands it to the director as the playfield. The measurement happens once;
//! later window resizes keep the original playfield so spawn geometry stays stable within
//! a run.
//!
//! ```text
//! Startup:    spawn MainCamera
//! PostUpdate: capture_playfield_bounds (until the first successful measurement)
//! ```

use bevy::prelude::*;

use crate::common::tunables::Tunables;
use crate::director::{PlayfieldBounds, SpawnDirector};

#[derive(Component)]
pub struct MainCamera;

pub fn plugin(app: &mut App) {
    app.add_systems(Startup, spawn_camera).add_systems(
        PostUpdate,
        capture_playfield_bounds.after(TransformSystems::Propagate),
    );
}

fn spawn_camera(mut commands: Commands) {
    commands.spawn((
        Name::new("MainCamera"),
        Camera2d,
        MainCamera,
        Transform::from_xyz(0.0, 0.0, 999.0),
    ));
}

fn capture_playfield_bounds(
    mut captured: Local<bool>,
    tunables: Res<Tunables>,
    q_cam: Query<(&Camera, &GlobalTransform, Option<&Projection>), With<MainCamera>>,
    mut director: ResMut<SpawnDirector>,
) {
    if *captured {
        return;
    }
    let Ok((camera, cam_tf, projection)) = q_cam.single() else {
        return;
    };
    let Some(viewport) = camera.logical_viewport_size() else {
        return;
    };

    let scale = match projection {
        Some(Projection::Orthographic(ortho)) => ortho.scale,
        _ => 1.0,
    };
    let half = viewport * 0.5 * scale;
    let center = cam_tf.translation().truncate();

    let bounds = PlayfieldBounds::from_center(center, half, tunables.spawn_margin);
    info!(
        "playfield captured: {:?}..{:?} (margin {})",
        bounds.min, bounds.max, bounds.margin
    );
    director.set_bounds(bounds);
    *captured = true;
}
