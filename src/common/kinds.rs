//! Closed category tags for everything the pools manage.

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    Drifter,
    Dasher,
    Swarmer,
    Tank,
    Splitter,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 5] = [
        EnemyKind::Drifter,
        EnemyKind::Dasher,
        EnemyKind::Swarmer,
        EnemyKind::Tank,
        EnemyKind::Splitter,
    ];

    /// Cruise speed in pixels per second before any phase modifier.
    pub fn base_speed(self) -> f32 {
        match self {
            EnemyKind::Drifter => 90.0,
            EnemyKind::Dasher => 220.0,
            EnemyKind::Swarmer => 140.0,
            EnemyKind::Tank => 45.0,
            EnemyKind::Splitter => 110.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    Explosion,
    Sparks,
    Shockwave,
    BossWarning,
}

impl EffectKind {
    pub const ALL: [EffectKind; 4] = [
        EffectKind::Explosion,
        EffectKind::Sparks,
        EffectKind::Shockwave,
        EffectKind::BossWarning,
    ];
}
