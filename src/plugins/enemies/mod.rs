//! Enemies plugin: pooled enemy bodies and their session lifecycle.
//!
//! Enemies are plain data owned by the [`EnemyPools`] registry. Gameplay code receives
//! handles from the director's spawns and gives them back with a [`DespawnEnemy`]
//! message when an enemy is done (killed, escaped, ...). This plugin is the single
//! writer that applies those returns.
//!
//! ```text
//! OnEnter(InGame): configure one pool per EnemyKind from Tunables
//! Update:          advance live enemies -> recycle escaped -> apply DespawnEnemy
//! OnExit(InGame):  despawn_all + teardown
//! ```

use bevy::ecs::message::MessageReader;
use bevy::prelude::*;

use crate::common::kinds::EnemyKind;
use crate::common::state::{GameState, PauseState};
use crate::common::tunables::Tunables;
use crate::director::SpawnDirector;
use crate::pooling::{CategoryConfig, PoolHandle, PoolRegistry, Pose, Recyclable, SpeedScaled};

/// How far past the spawn ring an enemy may wander before it counts as escaped,
/// in multiples of the spawn margin.
const ESCAPE_SLACK: f32 = 3.0;

// -----------------------------------------------------------------------------
// Pooled body
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct EnemyBody {
    kind: EnemyKind,
    pub pose: Pose,
    speed_multiplier: f32,
    active: bool,
    activations: u32,
}

impl EnemyBody {
    pub fn new(kind: EnemyKind) -> Self {
        Self {
            kind,
            pose: Pose::ORIGIN,
            speed_multiplier: 1.0,
            active: false,
            activations: 0,
        }
    }

    #[inline]
    pub fn kind(&self) -> EnemyKind {
        self.kind
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.kind.base_speed() * self.speed_multiplier
    }

    #[inline]
    pub fn speed_multiplier(&self) -> f32 {
        self.speed_multiplier
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// How many times this body has been handed out.
    #[inline]
    pub fn activations(&self) -> u32 {
        self.activations
    }

    #[inline]
    pub fn heading(&self) -> Vec2 {
        self.pose.rotation * Vec2::X
    }

    /// Straight-line cruise along the heading.
    pub fn advance(&mut self, dt: f32) {
        let step = self.heading() * self.speed() * dt;
        self.pose.position += step;
    }
}

impl Recyclable for EnemyBody {
    type Category = EnemyKind;

    fn activate(&mut self, pose: Pose) {
        self.pose = pose;
        self.speed_multiplier = 1.0;
        self.active = true;
        self.activations += 1;
    }

    fn deactivate(&mut self) {
        self.active = false;
    }

    fn category(&self) -> EnemyKind {
        self.kind
    }
}

impl SpeedScaled for EnemyBody {
    fn set_speed_multiplier(&mut self, multiplier: f32) {
        self.speed_multiplier = multiplier.max(0.0);
    }
}

// -----------------------------------------------------------------------------
// Resources + messages
// -----------------------------------------------------------------------------

/// The session's enemy registry.
#[derive(Resource, Deref, DerefMut)]
pub struct EnemyPools(pub PoolRegistry<EnemyBody>);

impl EnemyPools {
    pub fn from_tunables(tunables: &Tunables) -> Self {
        Self(PoolRegistry::new(tunables.global_max, tunables.default_max))
    }
}

/// Gameplay is done with this enemy.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DespawnEnemy(pub PoolHandle<EnemyKind>);

/// One declaration per kind, sized from `tunables`.
pub fn enemy_pool_configs(tunables: &Tunables) -> Vec<CategoryConfig<EnemyBody>> {
    EnemyKind::ALL
        .into_iter()
        .map(|kind| {
            CategoryConfig::new(kind, move || Some(EnemyBody::new(kind)))
                .with_settings(tunables.enemy_settings(kind))
        })
        .collect()
}

// -----------------------------------------------------------------------------
// Plugin wiring
// -----------------------------------------------------------------------------

pub fn plugin(app: &mut App) {
    let pools = EnemyPools::from_tunables(app.world().resource::<Tunables>());
    app.insert_resource(pools);
    app.add_message::<DespawnEnemy>();

    app.add_systems(OnEnter(GameState::InGame), configure_enemy_pools);
    app.add_systems(OnExit(GameState::InGame), teardown_enemy_pools);

    app.add_systems(
        Update,
        (
            advance_enemies,
            recycle_escaped_enemies.after(advance_enemies),
            despawn_requested_enemies.after(recycle_escaped_enemies),
        )
            .run_if(in_state(GameState::InGame))
            .run_if(in_state(PauseState::Running)),
    );
}

// -----------------------------------------------------------------------------
// Session lifecycle
// -----------------------------------------------------------------------------

pub fn configure_enemy_pools(tunables: Res<Tunables>, mut pools: ResMut<EnemyPools>) {
    pools.set_global_max(tunables.global_max);
    pools.set_default_max(tunables.default_max);

    let report = pools.configure(enemy_pool_configs(&tunables));
    if !report.is_clean() {
        warn!(
            "{} enemy categories skipped, {} configured",
            report.skipped.len(),
            report.configured.len()
        );
    }
}

pub fn teardown_enemy_pools(mut pools: ResMut<EnemyPools>) {
    pools.despawn_all();
    pools.teardown();
}

// -----------------------------------------------------------------------------
// Per-frame rules
// -----------------------------------------------------------------------------

pub fn advance_enemies(time: Res<Time>, mut pools: ResMut<EnemyPools>) {
    let dt = time.delta_secs();
    if dt <= 0.0 {
        return;
    }
    pools.for_each_active_mut(|_, enemy| enemy.advance(dt));
}

/// Enemies that flew well past the playfield go back to their pool.
pub fn recycle_escaped_enemies(director: Res<SpawnDirector>, mut pools: ResMut<EnemyPools>) {
    let bounds = *director.bounds();
    let slack = bounds.margin * ESCAPE_SLACK;

    let escaped: Vec<_> = pools
        .iter_active()
        .filter(|(_, enemy)| !bounds.contains_with_slack(enemy.pose.position, slack))
        .map(|(handle, _)| handle)
        .collect();

    for handle in escaped {
        pools.despawn(handle);
    }
}

/// Single writer for gameplay-driven returns.
pub fn despawn_requested_enemies(
    mut reader: MessageReader<DespawnEnemy>,
    mut pools: ResMut<EnemyPools>,
) {
    for DespawnEnemy(handle) in reader.read() {
        pools.despawn(*handle);
    }
}
