//! Integration test harness.
//!
//! Keep integration tests headless:
//! - `MinimalPlugins` provides core ECS runtime.
//! - `StatesPlugin` drives `GameState` / `PauseState` transitions.
//! - we then call `horde_director::game::configure_headless` to install gameplay plugins.
//!
//! Time is stepped manually so a number of updates maps to a known amount of game time.

use std::time::Duration;

use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use bevy::time::TimeUpdateStrategy;

/// Game time per `app.update()`.
pub const FRAME: Duration = Duration::from_millis(100);

pub fn app_headless() -> App {
    let mut app = App::new();

    app.add_plugins((MinimalPlugins, StatesPlugin));
    app.insert_resource(TimeUpdateStrategy::ManualDuration(FRAME));

    horde_director::game::configure_headless(&mut app);
    app
}

/// Run `frames` updates.
pub fn run_frames(app: &mut App, frames: usize) {
    for _ in 0..frames {
        app.update();
    }
}
