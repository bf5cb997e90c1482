mod common;

use bevy::prelude::*;
use horde_director::common::kinds::{EffectKind, EnemyKind};
use horde_director::common::state::{GameState, PauseState};
use horde_director::director::{Phase, SpawnDirector};
use horde_director::plugins::effects::EffectPools;
use horde_director::plugins::enemies::{DespawnEnemy, EnemyPools};
use horde_director::plugins::spawning::SpawnStats;

use common::{app_headless, run_frames};

fn game_time(app: &App) -> f32 {
    app.world().resource::<SpawnDirector>().game_time()
}

fn set_game_state(app: &mut App, state: GameState) {
    app.world_mut()
        .resource_mut::<NextState<GameState>>()
        .set(state);
    app.update();
}

fn set_pause_state(app: &mut App, state: PauseState) {
    app.world_mut()
        .resource_mut::<NextState<PauseState>>()
        .set(state);
    app.update();
}

#[test]
fn boots_and_ticks() {
    let mut app = app_headless();
    run_frames(&mut app, 3);
}

#[test]
fn session_starts_on_boot() {
    let mut app = app_headless();
    app.update();

    let director = app.world().resource::<SpawnDirector>();
    assert!(director.is_running());
    assert_eq!(director.phase(), Phase::Warmup);

    let enemies = app.world().resource::<EnemyPools>();
    for kind in EnemyKind::ALL {
        assert!(enemies.has_category(kind), "{kind:?} pool missing");
    }
    let effects = app.world().resource::<EffectPools>();
    assert!(effects.is_bypassed(EffectKind::BossWarning));
}

#[test]
fn warmup_spawns_drifters_over_time() {
    let mut app = app_headless();
    // ~5 s of game time: Warmup fires every 2 s.
    run_frames(&mut app, 52);

    assert!(game_time(&app) > 4.5);
    let pools = app.world().resource::<EnemyPools>();
    assert!(pools.active_count_of(EnemyKind::Drifter) >= 2);
    assert_eq!(pools.active_count_of(EnemyKind::Tank), 0);

    let stats = app.world().resource::<SpawnStats>();
    assert_eq!(stats.phase, Some(Phase::Warmup));
    assert_eq!(stats.live_total, pools.global_active_count());
}

#[test]
fn despawn_message_returns_enemy_to_its_pool() {
    let mut app = app_headless();
    run_frames(&mut app, 25);

    let handle = {
        let pools = app.world().resource::<EnemyPools>();
        pools
            .iter_active()
            .map(|(h, _)| h)
            .next()
            .expect("something spawned by now")
    };
    app.world_mut().write_message(DespawnEnemy(handle));
    app.update();

    let pools = app.world().resource::<EnemyPools>();
    assert!(pools.get(handle).is_none());
}

#[test]
fn pause_freezes_the_director() {
    let mut app = app_headless();
    run_frames(&mut app, 10);

    set_pause_state(&mut app, PauseState::Paused);
    assert!(app.world().resource::<SpawnDirector>().is_paused());
    let frozen = game_time(&app);
    let live = app.world().resource::<EnemyPools>().global_active_count();

    run_frames(&mut app, 50);
    assert_eq!(game_time(&app), frozen);
    assert_eq!(
        app.world().resource::<EnemyPools>().global_active_count(),
        live
    );

    set_pause_state(&mut app, PauseState::Running);
    run_frames(&mut app, 5);
    assert!(game_time(&app) > frozen);
}

#[test]
fn game_over_tears_down_and_retry_starts_fresh() {
    let mut app = app_headless();
    run_frames(&mut app, 40);
    assert!(app.world().resource::<EnemyPools>().global_active_count() > 0);

    set_game_state(&mut app, GameState::GameOver);
    {
        let director = app.world().resource::<SpawnDirector>();
        assert!(!director.is_running());
        let pools = app.world().resource::<EnemyPools>();
        assert_eq!(pools.global_active_count(), 0);
        assert_eq!(pools.categories().count(), 0);
        let effects = app.world().resource::<EffectPools>();
        assert!(!effects.has_category(EffectKind::Explosion));
    }

    let stopped_at = game_time(&app);
    run_frames(&mut app, 10);
    assert_eq!(game_time(&app), stopped_at);

    set_game_state(&mut app, GameState::InGame);
    let director = app.world().resource::<SpawnDirector>();
    assert!(director.is_running());
    assert!(director.game_time() < 1.0, "retry must start from zero");
    assert!(!director.boss_fired());
    assert!(app
        .world()
        .resource::<EnemyPools>()
        .has_category(EnemyKind::Drifter));
}

#[test]
fn despawn_from_previous_session_leaves_retry_enemies_alone() {
    let mut app = app_headless();
    run_frames(&mut app, 25);
    let old = {
        let pools = app.world().resource::<EnemyPools>();
        pools
            .iter_active()
            .map(|(h, _)| h)
            .next()
            .expect("something spawned by now")
    };

    set_game_state(&mut app, GameState::GameOver);
    set_game_state(&mut app, GameState::InGame);
    run_frames(&mut app, 24);

    let fresh = {
        let pools = app.world().resource::<EnemyPools>();
        pools
            .iter_active()
            .map(|(h, _)| h)
            .find(|h| h.slot() == old.slot() && h.generation() == old.generation())
            .expect("same seed replays the same first spawn")
    };
    assert_eq!(fresh.category(), old.category());
    assert_ne!(fresh.epoch(), old.epoch());

    app.world_mut().write_message(DespawnEnemy(old));
    app.update();

    let pools = app.world().resource::<EnemyPools>();
    assert!(pools.get(fresh).is_some());
}
