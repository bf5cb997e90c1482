//! Core plugin: shared resources and global settings.
//!
//! `Tunables` is only initialised here, never overwritten, so a composition root can
//! insert file-loaded values before plugins are registered.

use bevy::prelude::*;

use crate::common::error::ConfigError;
use crate::common::tunables::Tunables;

/// Why the config file was not used, reported once the log subscriber is up.
#[derive(Resource, Debug)]
pub struct ConfigLoadFailure(pub ConfigError);

pub fn plugin(app: &mut App) {
    app.init_resource::<Tunables>();
    app.insert_resource(ClearColor(Color::srgb(0.05, 0.05, 0.07)));
    app.add_systems(Startup, report_config);
}

fn report_config(tunables: Res<Tunables>, failure: Option<Res<ConfigLoadFailure>>) {
    if let Some(failure) = failure {
        warn!("using default tunables: {}", failure.0);
    }
    debug!(
        "tunables: global_max {} default_max {} seed {:#x} time_scale {}",
        tunables.global_max, tunables.default_max, tunables.seed, tunables.time_scale
    );
}

#[cfg(test)]
mod tests;
