//! Effects plugin: self-expiring visual effects behind pooled and bypass categories.
//!
//! Producers write [`PlayEffect`] / [`StopEffect`]; this plugin is the single consumer
//! that touches [`EffectPools`]. Self-release timers are serviced once per frame from
//! virtual time, so they freeze with the pause menu like everything else in the session.

use bevy::ecs::message::MessageReader;
use bevy::prelude::*;

use crate::common::kinds::EffectKind;
use crate::common::state::{GameState, PauseState};
use crate::common::tunables::Tunables;
use crate::pooling::{
    EffectCategoryConfig, EffectRegistry, EmitterTiming, PlayedEffect, Pose, Recyclable,
    TimedEffect,
};

// -----------------------------------------------------------------------------
// Pooled body
// -----------------------------------------------------------------------------

/// Emitter layout per kind. `BossWarning` has none and runs on its fallback duration.
fn emitters_for(kind: EffectKind) -> Vec<EmitterTiming> {
    match kind {
        EffectKind::Explosion => vec![
            EmitterTiming::once(0.0, 0.1, 0.25),
            EmitterTiming::once(0.05, 0.3, 0.6),
            // Lingering smoke loops until the effect is released.
            EmitterTiming::looping(0.2, 1.5),
        ],
        EffectKind::Sparks => vec![EmitterTiming::once(0.0, 0.15, 0.3)],
        EffectKind::Shockwave => vec![
            EmitterTiming::once(0.0, 0.05, 0.6),
            EmitterTiming::once(0.1, 0.05, 0.5),
        ],
        EffectKind::BossWarning => Vec::new(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EffectBody {
    kind: EffectKind,
    emitters: Vec<EmitterTiming>,
    pub pose: Pose,
    emitting: bool,
    active: bool,
    plays: u32,
}

impl EffectBody {
    pub fn new(kind: EffectKind) -> Self {
        Self {
            kind,
            emitters: emitters_for(kind),
            pose: Pose::ORIGIN,
            emitting: false,
            active: false,
            plays: 0,
        }
    }

    #[inline]
    pub fn kind(&self) -> EffectKind {
        self.kind
    }

    #[inline]
    pub fn is_emitting(&self) -> bool {
        self.emitting
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Emission restarts so far.
    #[inline]
    pub fn plays(&self) -> u32 {
        self.plays
    }
}

impl Recyclable for EffectBody {
    type Category = EffectKind;

    fn activate(&mut self, pose: Pose) {
        self.pose = pose;
        self.active = true;
    }

    fn deactivate(&mut self) {
        self.emitting = false;
        self.active = false;
    }

    fn category(&self) -> EffectKind {
        self.kind
    }
}

impl TimedEffect for EffectBody {
    fn emitters(&self) -> &[EmitterTiming] {
        &self.emitters
    }

    fn restart_emission(&mut self) {
        self.emitting = true;
        self.plays += 1;
    }

    fn halt_emission(&mut self) {
        self.emitting = false;
    }
}

// -----------------------------------------------------------------------------
// Resources + messages
// -----------------------------------------------------------------------------

#[derive(Resource, Deref, DerefMut)]
pub struct EffectPools(pub EffectRegistry<EffectBody>);

impl EffectPools {
    pub fn from_tunables(tunables: &Tunables) -> Self {
        Self(EffectRegistry::new(tunables.default_max))
    }
}

#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct PlayEffect {
    pub kind: EffectKind,
    pub pose: Pose,
}

#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopEffect(pub PlayedEffect<EffectKind>);

/// Play an effect that is still running again instead of acquiring a second one.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct ReplayEffect {
    pub played: PlayedEffect<EffectKind>,
    pub pose: Pose,
}

pub fn effect_pool_configs(tunables: &Tunables) -> Vec<EffectCategoryConfig<EffectBody>> {
    EffectKind::ALL
        .into_iter()
        .map(|kind| {
            EffectCategoryConfig::new(kind, move || Some(EffectBody::new(kind)))
                .with_settings(tunables.effect_settings(kind))
        })
        .collect()
}

// -----------------------------------------------------------------------------
// Plugin wiring
// -----------------------------------------------------------------------------

pub fn plugin(app: &mut App) {
    let pools = EffectPools::from_tunables(app.world().resource::<Tunables>());
    app.insert_resource(pools);
    app.add_message::<PlayEffect>();
    app.add_message::<StopEffect>();
    app.add_message::<ReplayEffect>();

    app.add_systems(OnEnter(GameState::InGame), configure_effect_pools);
    app.add_systems(OnExit(GameState::InGame), teardown_effect_pools);

    app.add_systems(
        Update,
        (
            stop_requested_effects,
            replay_requested_effects.after(stop_requested_effects),
            play_requested_effects.after(replay_requested_effects),
            update_effect_timers.after(play_requested_effects),
        )
            .run_if(in_state(GameState::InGame))
            .run_if(in_state(PauseState::Running)),
    );
}

pub fn configure_effect_pools(tunables: Res<Tunables>, mut pools: ResMut<EffectPools>) {
    let skipped = pools.configure(effect_pool_configs(&tunables));
    if !skipped.is_empty() {
        warn!("{} effect categories skipped", skipped.len());
    }
}

pub fn teardown_effect_pools(mut pools: ResMut<EffectPools>) {
    pools.stop_all();
    pools.teardown();
}

pub fn play_requested_effects(
    mut reader: MessageReader<PlayEffect>,
    mut pools: ResMut<EffectPools>,
) {
    for req in reader.read() {
        // Exhaustion just means no effect this time.
        if pools.play(req.kind, req.pose).is_none() {
            debug!("{:?} effect dropped", req.kind);
        }
    }
}

pub fn stop_requested_effects(
    mut reader: MessageReader<StopEffect>,
    mut pools: ResMut<EffectPools>,
) {
    for StopEffect(played) in reader.read() {
        pools.stop(*played);
    }
}

pub fn replay_requested_effects(
    mut reader: MessageReader<ReplayEffect>,
    mut pools: ResMut<EffectPools>,
) {
    for req in reader.read() {
        pools.restart(req.played, req.pose);
    }
}

pub fn update_effect_timers(time: Res<Time>, mut pools: ResMut<EffectPools>) {
    let released = pools.update(time.delta_secs());
    if released > 0 {
        trace!("{released} effects expired");
    }
}

#[cfg(test)]
mod tests;
