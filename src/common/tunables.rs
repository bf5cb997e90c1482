//! Tunable spawning constants.
//!
//! `Default` is the shipped tuning. A TOML file can override any subset of it; missing
//! keys keep their defaults, and categories missing from `[enemies]` / `[effects]` keep
//! their default sizing.
//!
//! ```toml
//! global_max = 120
//! seed = 7
//!
//! [enemies.tank]
//! prewarm = 1
//! max = 4
//! expand = false
//!
//! [effects.boss_warning]
//! bypass = true
//! bypass_lifetime = 2.5
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use bevy::prelude::*;
use serde::Deserialize;

use crate::common::error::ConfigError;
use crate::common::kinds::{EffectKind, EnemyKind};
use crate::pooling::{EffectSettings, MAX_EFFECT_SECONDS, PoolSettings};

/// Where `game::run` looks for overrides.
pub const CONFIG_PATH: &str = "config/spawning.toml";

#[derive(Resource, Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Tunables {
    /// Cap on live enemies across every category.
    pub global_max: usize,
    /// Per-category max for categories that do not name one.
    pub default_max: usize,
    pub seed: u64,
    /// Director clock speed relative to frame time.
    pub time_scale: f32,
    /// Half-size of the playfield used until (or instead of) a camera measurement.
    pub view_half_extents: [f32; 2],
    /// Distance outside the view where enemies appear.
    pub spawn_margin: f32,
    pub frenzy_speed: f32,
    pub frenzy_interval_scale: f32,
    pub enemies: BTreeMap<EnemyKind, PoolSettings>,
    pub effects: BTreeMap<EffectKind, EffectSettings>,
}

impl Default for Tunables {
    fn default() -> Self {
        let pool = |prewarm, max| PoolSettings {
            prewarm,
            max: Some(max),
            expand: true,
        };
        let effect = |prewarm, max, fallback_duration| EffectSettings {
            pool: pool(prewarm, max),
            fallback_duration,
            ..default()
        };

        Self {
            global_max: 160,
            default_max: 32,
            seed: 0x5EED_D1EC,
            time_scale: 1.0,
            view_half_extents: [640.0, 360.0],
            spawn_margin: 48.0,
            frenzy_speed: 1.5,
            frenzy_interval_scale: 0.75,
            enemies: BTreeMap::from([
                (EnemyKind::Drifter, pool(24, 64)),
                (EnemyKind::Dasher, pool(8, 32)),
                (EnemyKind::Swarmer, pool(32, 96)),
                (EnemyKind::Tank, pool(2, 8)),
                (EnemyKind::Splitter, pool(4, 16)),
            ]),
            effects: BTreeMap::from([
                (EffectKind::Explosion, effect(8, 32, 1.0)),
                (EffectKind::Sparks, effect(16, 64, 0.5)),
                (EffectKind::Shockwave, effect(2, 8, 1.5)),
                (
                    EffectKind::BossWarning,
                    EffectSettings {
                        bypass: true,
                        fallback_duration: 3.0,
                        bypass_lifetime: Some(3.0),
                        ..default()
                    },
                ),
            ]),
        }
    }
}

impl Tunables {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let mut tunables: Tunables = toml::from_str(contents)?;

        let defaults = Tunables::default();
        for (kind, settings) in defaults.enemies {
            tunables.enemies.entry(kind).or_insert(settings);
        }
        for (kind, settings) in defaults.effects {
            tunables.effects.entry(kind).or_insert(settings);
        }

        tunables.validate()?;
        Ok(tunables)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Reject values that would make the director or registry misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field, reason: &str| ConfigError::InvalidValue {
            field,
            reason: reason.to_owned(),
        };

        if self.global_max == 0 {
            return Err(invalid("global_max", "must be at least 1"));
        }
        if !(self.time_scale.is_finite() && self.time_scale >= 0.0) {
            return Err(invalid("time_scale", "must be finite and non-negative"));
        }
        if !(self.frenzy_speed.is_finite() && self.frenzy_speed > 0.0) {
            return Err(invalid("frenzy_speed", "must be finite and positive"));
        }
        if !(self.frenzy_interval_scale.is_finite() && self.frenzy_interval_scale > 0.0) {
            return Err(invalid("frenzy_interval_scale", "must be finite and positive"));
        }
        if self.view_half_extents.iter().any(|v| !(v.is_finite() && *v > 0.0)) {
            return Err(invalid("view_half_extents", "must be finite and positive"));
        }
        let seconds_ok = |v: f32| v.is_finite() && (0.0..=MAX_EFFECT_SECONDS).contains(&v);
        if self.effects.values().any(|e| !seconds_ok(e.fallback_duration)) {
            return Err(invalid(
                "effects.fallback_duration",
                "must be between 0 and MAX_EFFECT_SECONDS",
            ));
        }
        if self
            .effects
            .values()
            .filter_map(|e| e.bypass_lifetime)
            .any(|v| !seconds_ok(v))
        {
            return Err(invalid(
                "effects.bypass_lifetime",
                "must be between 0 and MAX_EFFECT_SECONDS",
            ));
        }
        Ok(())
    }

    #[inline]
    pub fn enemy_settings(&self, kind: EnemyKind) -> PoolSettings {
        self.enemies.get(&kind).copied().unwrap_or_default()
    }

    #[inline]
    pub fn effect_settings(&self, kind: EffectKind) -> EffectSettings {
        self.effects.get(&kind).copied().unwrap_or_default()
    }

    #[inline]
    pub fn view_half_extents(&self) -> Vec2 {
        Vec2::from(self.view_half_extents)
    }
}
