//! Game composition root.
//!
//! Provides two public configuration functions:
//! - `configure_full`: includes DefaultPlugins (window/render) + game plugins.
//! - `configure_headless`: minimal configuration for integration tests.

use bevy::prelude::*;
use bevy::window::WindowResolution;

use crate::common::state::{GameState, PauseState};
use crate::common::tunables::{Tunables, CONFIG_PATH};
use crate::plugins;
use crate::plugins::core::ConfigLoadFailure;

#[cfg(target_os = "windows")]
use bevy::render::{
    settings::{Backends, PowerPreference, WgpuSettings},
    RenderPlugin,
};

pub fn run() {
    let mut app = App::new();

    // Inserted before plugins so core's init_resource keeps it.
    match Tunables::from_toml_file(CONFIG_PATH) {
        Ok(tunables) => {
            app.insert_resource(tunables);
        }
        Err(err) => {
            app.insert_resource(ConfigLoadFailure(err));
        }
    }

    app.add_plugins(configure_full).run();
}

/// Full configuration for `cargo run`.
pub fn configure_full(app: &mut App) {
    let default_plugins = DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "Horde Director".into(),
            resolution: WindowResolution::new(1280, 720),
            ..default()
        }),
        ..default()
    });

    // DX12 on Windows; Vulkan is unreliable on some hybrid-GPU laptops.
    #[cfg(target_os = "windows")]
    let default_plugins = default_plugins.set(RenderPlugin {
        render_creation: WgpuSettings {
            backends: Some(Backends::DX12),
            power_preference: PowerPreference::HighPerformance,
            ..default()
        }
        .into(),
        ..default()
    });

    app.add_plugins(default_plugins);

    configure_game(app);
    plugins::register_render(app);
    app.add_systems(Update, toggle_pause.run_if(in_state(GameState::InGame)));
}

/// Headless configuration for integration tests.
///
/// Notes:
/// - Do NOT add DefaultPlugins.
/// - Do NOT add render-only plugins (camera).
pub fn configure_headless(app: &mut App) {
    configure_game(app);
}

/// Configuration shared by both full and headless apps.
fn configure_game(app: &mut App) {
    app.init_state::<GameState>();
    app.init_state::<PauseState>();
    plugins::register_gameplay(app);
}

fn toggle_pause(
    keys: Res<ButtonInput<KeyCode>>,
    state: Res<State<PauseState>>,
    mut next: ResMut<NextState<PauseState>>,
) {
    if !keys.just_pressed(KeyCode::Escape) {
        return;
    }
    next.set(match state.get() {
        PauseState::Running => PauseState::Paused,
        PauseState::Paused => PauseState::Running,
    });
}
