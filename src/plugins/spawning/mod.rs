//! Spawning plugin: drives the [`SpawnDirector`] from frame time.
//!
//! ```text
//! OnEnter(InGame):        reset + retune director, reseed rng, start
//! OnEnter(Paused):        director.pause()     OnExit(Paused): director.resume()
//! Update (InGame):        tick_director -> forward events as messages -> announce_boss
//! PostUpdate (InGame):    refresh SpawnStats
//! OnExit(InGame):         stop
//! ```
//!
//! The director is ticked even while paused so that its own pause gate is what freezes
//! the clock; a paused tick is a no-op.

use bevy::ecs::message::{MessageReader, MessageWriter};
use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::common::kinds::{EffectKind, EnemyKind};
use crate::common::state::{GameState, PauseState};
use crate::common::tunables::Tunables;
use crate::director::{
    DirectorEvent, FrenzyTuning, Phase, PhaseTimeline, PlayfieldBounds, SpawnDirector,
};
use crate::plugins::effects::PlayEffect;
use crate::plugins::enemies::EnemyPools;
use crate::pooling::Pose;

// -----------------------------------------------------------------------------
// Resources + messages
// -----------------------------------------------------------------------------

/// Seeded source for zone resolution. Reseeded at the start of every session so a
/// given seed replays the same spawn positions.
#[derive(Resource, Deref, DerefMut)]
pub struct DirectorRng(pub ChaCha8Rng);

impl DirectorRng {
    pub fn from_seed(seed: u64) -> Self {
        Self(ChaCha8Rng::seed_from_u64(seed))
    }
}

/// Read-only snapshot for HUDs and tests.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct SpawnStats {
    pub phase: Option<Phase>,
    pub clock: String,
    pub frenzy: bool,
    pub live_total: usize,
    pub live_by_kind: Vec<(EnemyKind, usize)>,
    pub spawned_total: u64,
    pub skipped_total: u64,
}

#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseChanged {
    pub from: Phase,
    pub to: Phase,
}

#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrenzyChanged {
    pub active: bool,
}

#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BossTriggered;

pub fn director_from_tunables(tunables: &Tunables) -> SpawnDirector {
    SpawnDirector::new(PhaseTimeline::standard(), playfield_from_tunables(tunables))
        .with_time_scale(tunables.time_scale)
        .with_frenzy_tuning(frenzy_tuning(tunables))
}

fn frenzy_tuning(tunables: &Tunables) -> FrenzyTuning {
    FrenzyTuning {
        speed: tunables.frenzy_speed,
        interval_scale: tunables.frenzy_interval_scale,
    }
}

/// Playfield assumed until the camera reports the real one.
pub fn playfield_from_tunables(tunables: &Tunables) -> PlayfieldBounds {
    PlayfieldBounds::from_center(
        Vec2::ZERO,
        tunables.view_half_extents(),
        tunables.spawn_margin,
    )
}

// -----------------------------------------------------------------------------
// Plugin wiring
// -----------------------------------------------------------------------------

pub fn plugin(app: &mut App) {
    let (director, seed) = {
        let tunables = app.world().resource::<Tunables>();
        (director_from_tunables(tunables), tunables.seed)
    };
    app.insert_resource(director);
    app.insert_resource(DirectorRng::from_seed(seed));
    app.init_resource::<SpawnStats>();

    app.add_message::<PhaseChanged>();
    app.add_message::<FrenzyChanged>();
    app.add_message::<BossTriggered>();

    app.add_systems(OnEnter(GameState::InGame), begin_session);
    app.add_systems(OnExit(GameState::InGame), end_session);
    app.add_systems(OnEnter(PauseState::Paused), pause_director);
    app.add_systems(OnExit(PauseState::Paused), resume_director);

    app.add_systems(
        Update,
        (tick_director, announce_boss.after(tick_director))
            .run_if(in_state(GameState::InGame)),
    );
    app.add_systems(
        PostUpdate,
        refresh_spawn_stats.run_if(in_state(GameState::InGame)),
    );
}

// -----------------------------------------------------------------------------
// Session lifecycle
// -----------------------------------------------------------------------------

pub fn begin_session(
    tunables: Res<Tunables>,
    pause: Option<Res<State<PauseState>>>,
    mut director: ResMut<SpawnDirector>,
    mut rng: ResMut<DirectorRng>,
    mut stats: ResMut<SpawnStats>,
) {
    director.reset();
    director.set_time_scale(tunables.time_scale);
    director.set_frenzy_tuning(frenzy_tuning(&tunables));
    *rng = DirectorRng::from_seed(tunables.seed);
    *stats = SpawnStats::default();

    director.start();
    // A session can begin with the pause menu already open.
    if pause.is_some_and(|p| *p.get() == PauseState::Paused) {
        director.pause();
    }
    info!("session started (seed {:#x})", tunables.seed);
}

pub fn end_session(mut director: ResMut<SpawnDirector>) {
    director.stop();
}

pub fn pause_director(mut director: ResMut<SpawnDirector>) {
    director.pause();
}

pub fn resume_director(mut director: ResMut<SpawnDirector>) {
    director.resume();
}

// -----------------------------------------------------------------------------
// Per-frame
// -----------------------------------------------------------------------------

pub fn tick_director(
    time: Res<Time>,
    mut director: ResMut<SpawnDirector>,
    mut pools: ResMut<EnemyPools>,
    mut rng: ResMut<DirectorRng>,
    mut stats: ResMut<SpawnStats>,
    mut phase_changed: MessageWriter<PhaseChanged>,
    mut frenzy_changed: MessageWriter<FrenzyChanged>,
    mut boss: MessageWriter<BossTriggered>,
) {
    let report = director.tick(time.delta_secs(), &mut pools.0, &mut rng.0);
    stats.spawned_total += report.spawned.len() as u64;
    stats.skipped_total += u64::from(report.skipped);

    for event in director.take_events() {
        match event {
            DirectorEvent::PhaseChanged { from, to } => {
                phase_changed.write(PhaseChanged { from, to });
            }
            DirectorEvent::FrenzyStarted => {
                frenzy_changed.write(FrenzyChanged { active: true });
            }
            DirectorEvent::FrenzyEnded => {
                frenzy_changed.write(FrenzyChanged { active: false });
            }
            DirectorEvent::BossTriggered => {
                boss.write(BossTriggered);
            }
        }
    }
}

/// The boss entrance gets its warning effect in the middle of the playfield.
pub fn announce_boss(
    mut reader: MessageReader<BossTriggered>,
    director: Res<SpawnDirector>,
    mut effects: MessageWriter<PlayEffect>,
) {
    for _ in reader.read() {
        effects.write(PlayEffect {
            kind: EffectKind::BossWarning,
            pose: Pose::at(director.bounds().center()),
        });
    }
}

pub fn refresh_spawn_stats(
    director: Res<SpawnDirector>,
    pools: Res<EnemyPools>,
    mut stats: ResMut<SpawnStats>,
) {
    stats.phase = Some(director.phase());
    stats.clock = director.formatted_time();
    stats.frenzy = director.is_frenzy();
    stats.live_total = pools.global_active_count();
    stats.live_by_kind = EnemyKind::ALL
        .into_iter()
        .map(|kind| (kind, pools.active_count_of(kind)))
        .collect();
}
