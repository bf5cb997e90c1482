use super::*;

use std::time::Duration;

use bevy::ecs::message::Messages;
use bevy::prelude::*;

use crate::common::test_utils::run_system_once;
use crate::pooling::{running_duration, SAFETY_MARGIN};

fn time_with_delta(dt: f32) -> Time {
    let mut t = Time::<()>::default();
    t.advance_by(Duration::from_secs_f32(dt));
    t
}

fn world_with_effects() -> World {
    let mut world = World::new();
    let tunables = Tunables::default();
    world.insert_resource(EffectPools::from_tunables(&tunables));
    world.insert_resource(tunables);
    world.init_resource::<Messages<PlayEffect>>();
    world.init_resource::<Messages<StopEffect>>();
    world.init_resource::<Messages<ReplayEffect>>();
    run_system_once(&mut world, configure_effect_pools);
    world
}

fn request(world: &mut World, kind: EffectKind) {
    world
        .resource_mut::<Messages<PlayEffect>>()
        .write(PlayEffect {
            kind,
            pose: Pose::ORIGIN,
        });
}

#[test]
fn emitter_tables_give_expected_durations() {
    let explosion = EffectBody::new(EffectKind::Explosion);
    // The looping smoke emitter does not count.
    let d = running_duration(explosion.emitters(), 0.0);
    assert!((d - (0.95 + SAFETY_MARGIN)).abs() < 1e-5, "{d}");

    let warning = EffectBody::new(EffectKind::BossWarning);
    assert!(warning.emitters().is_empty());
    assert!((running_duration(warning.emitters(), 3.0) - 3.1).abs() < 1e-5);
}

#[test]
fn body_tracks_emission() {
    let mut body = EffectBody::new(EffectKind::Sparks);
    body.activate(Pose::at(Vec2::new(4.0, 5.0)));
    body.restart_emission();
    assert!(body.is_active() && body.is_emitting());
    assert_eq!(body.plays(), 1);

    body.halt_emission();
    assert!(!body.is_emitting());
    body.deactivate();
    assert!(!body.is_active());
    assert_eq!(body.kind(), EffectKind::Sparks);
}

#[test]
fn configure_pools_every_kind_and_bypasses_warning() {
    let world = world_with_effects();
    let pools = world.resource::<EffectPools>();

    for kind in EffectKind::ALL {
        assert!(pools.has_category(kind), "{kind:?}");
    }
    assert!(pools.is_bypassed(EffectKind::BossWarning));
    assert!(!pools.is_bypassed(EffectKind::Explosion));
    assert_eq!(pools.available_count_of(EffectKind::Sparks), 16);
}

#[test]
fn play_requests_start_effects_and_timers_expire_them() {
    let mut world = world_with_effects();
    request(&mut world, EffectKind::Explosion);
    request(&mut world, EffectKind::BossWarning);

    run_system_once(&mut world, play_requested_effects);
    {
        let pools = world.resource::<EffectPools>();
        assert_eq!(pools.active_count_of(EffectKind::Explosion), 1);
        assert_eq!(pools.active_count_of(EffectKind::BossWarning), 1);
        assert_eq!(pools.transient_count(), 1);
    }

    // Explosion runs 1.05 s, the warning 3 s.
    world.insert_resource(time_with_delta(1.5));
    run_system_once(&mut world, update_effect_timers);
    {
        let pools = world.resource::<EffectPools>();
        assert_eq!(pools.active_count_of(EffectKind::Explosion), 0);
        assert_eq!(pools.active_count_of(EffectKind::BossWarning), 1);
    }

    world.insert_resource(time_with_delta(2.0));
    run_system_once(&mut world, update_effect_timers);
    assert_eq!(world.resource::<EffectPools>().transient_count(), 0);
}

#[test]
fn stop_requests_cut_effects_short() {
    let mut world = world_with_effects();
    let played = world
        .resource_mut::<EffectPools>()
        .play(EffectKind::Shockwave, Pose::ORIGIN)
        .expect("prewarmed");

    world
        .resource_mut::<Messages<StopEffect>>()
        .write(StopEffect(played));
    run_system_once(&mut world, stop_requested_effects);

    let pools = world.resource::<EffectPools>();
    assert_eq!(pools.active_count_of(EffectKind::Shockwave), 0);
    assert_eq!(pools.available_count_of(EffectKind::Shockwave), 2);
}

#[test]
fn replay_requests_rearm_instead_of_acquiring_again() {
    let mut world = world_with_effects();
    let played = world
        .resource_mut::<EffectPools>()
        .play(EffectKind::Explosion, Pose::ORIGIN)
        .expect("prewarmed");
    let tick = |world: &mut World, dt: f32| {
        world.insert_resource(time_with_delta(dt));
        run_system_once(world, update_effect_timers);
    };

    tick(&mut world, 0.8);
    world
        .resource_mut::<Messages<ReplayEffect>>()
        .write(ReplayEffect {
            played,
            pose: Pose::at(Vec2::new(10.0, 0.0)),
        });
    run_system_once(&mut world, replay_requested_effects);

    // Explosion runs 1.05 s: the first run would have ended at 1.05.
    tick(&mut world, 0.8);
    {
        let pools = world.resource::<EffectPools>();
        assert_eq!(pools.active_count_of(EffectKind::Explosion), 1);
        let PlayedEffect::Pooled(handle) = played else {
            panic!("explosions are pooled");
        };
        let body = pools.pool(EffectKind::Explosion).unwrap().get(handle).unwrap();
        assert_eq!(body.plays(), 2);
        assert_eq!(body.pose.position, Vec2::new(10.0, 0.0));
    }

    tick(&mut world, 0.5);
    assert_eq!(
        world
            .resource::<EffectPools>()
            .active_count_of(EffectKind::Explosion),
        0
    );
}

#[test]
fn teardown_clears_everything() {
    let mut world = world_with_effects();
    request(&mut world, EffectKind::Sparks);
    run_system_once(&mut world, play_requested_effects);

    run_system_once(&mut world, teardown_effect_pools);

    let pools = world.resource::<EffectPools>();
    for kind in EffectKind::ALL {
        assert!(!pools.has_category(kind));
    }
}
