//! Feature plugins.

use bevy::prelude::*;

pub mod core;
pub mod effects;
pub mod enemies;
pub mod spawning;

// Render-only
pub mod camera;

/// Register gameplay plugins that work in headless tests.
///
/// `core` goes first: the others size their resources from `Tunables`.
pub fn register_gameplay(app: &mut App) {
    core::plugin(app);
    enemies::plugin(app);
    effects::plugin(app);
    spawning::plugin(app);
}

/// Register render-only plugins (requires DefaultPlugins / render infra).
pub fn register_render(app: &mut App) {
    camera::plugin(app);
}

/// Register all plugins (full app).
pub fn register_all(app: &mut App) {
    register_gameplay(app);
    register_render(app);
}
