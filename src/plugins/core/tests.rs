use bevy::prelude::*;

use crate::common::error::ConfigError;
use crate::common::kinds::{EffectKind, EnemyKind};
use crate::common::tunables::Tunables;
use crate::plugins::core;

#[test]
fn inserts_resources() {
    let mut app = App::new();
    core::plugin(&mut app);
    assert!(app.world().get_resource::<Tunables>().is_some());
    assert!(app.world().get_resource::<ClearColor>().is_some());
}

#[test]
fn keeps_tunables_inserted_before_registration() {
    let mut app = App::new();
    app.insert_resource(Tunables {
        global_max: 7,
        ..default()
    });
    core::plugin(&mut app);
    assert_eq!(app.world().resource::<Tunables>().global_max, 7);
}

#[test]
fn default_tunables_are_valid_and_cover_every_kind() {
    let t = Tunables::default();
    t.validate().expect("defaults must validate");
    for kind in EnemyKind::ALL {
        assert!(t.enemies.contains_key(&kind), "{kind:?} missing");
    }
    for kind in EffectKind::ALL {
        assert!(t.effects.contains_key(&kind), "{kind:?} missing");
    }
    assert!(t.effect_settings(EffectKind::BossWarning).bypass);
}

#[test]
fn toml_overrides_subset_and_keeps_other_defaults() {
    let t = Tunables::from_toml_str(
        r#"
        global_max = 12
        seed = 99

        [enemies.tank]
        prewarm = 1
        max = 3
        expand = false
        "#,
    )
    .expect("parses");

    let d = Tunables::default();
    assert_eq!(t.global_max, 12);
    assert_eq!(t.seed, 99);
    assert_eq!(t.default_max, d.default_max);

    let tank = t.enemy_settings(EnemyKind::Tank);
    assert_eq!((tank.prewarm, tank.max, tank.expand), (1, Some(3), false));
    // Untouched kinds keep their shipped sizing.
    assert_eq!(t.enemy_settings(EnemyKind::Drifter), d.enemy_settings(EnemyKind::Drifter));
    assert_eq!(t.effects, d.effects);
}

#[test]
fn toml_effect_settings_flatten_pool_fields() {
    let t = Tunables::from_toml_str(
        r#"
        [effects.sparks]
        prewarm = 2
        max = 4
        fallback_duration = 0.25
        "#,
    )
    .expect("parses");

    let sparks = t.effect_settings(EffectKind::Sparks);
    assert_eq!(sparks.pool.prewarm, 2);
    assert_eq!(sparks.pool.max, Some(4));
    assert!(!sparks.bypass);
    assert!((sparks.fallback_duration - 0.25).abs() < 1e-6);
}

#[test]
fn invalid_values_are_rejected() {
    let cases = [
        ("global_max = 0", "global_max"),
        ("time_scale = -1.0", "time_scale"),
        ("frenzy_speed = 0.0", "frenzy_speed"),
        ("frenzy_interval_scale = -0.5", "frenzy_interval_scale"),
        ("view_half_extents = [0.0, 360.0]", "view_half_extents"),
        ("[effects.boss_warning]\nbypass_lifetime = 1e20", "effects.bypass_lifetime"),
        ("[effects.sparks]\nfallback_duration = inf", "effects.fallback_duration"),
        ("[effects.sparks]\nfallback_duration = -1.0", "effects.fallback_duration"),
    ];

    for (src, expected) in cases {
        match Tunables::from_toml_str(src) {
            Err(ConfigError::InvalidValue { field, .. }) => assert_eq!(field, expected, "{src}"),
            other => panic!("{src}: expected InvalidValue, got {other:?}"),
        }
    }
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let err = Tunables::from_toml_str("global_max = \"lots\"").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)), "{err:?}");

    let err = Tunables::from_toml_str("[enemies.dragon]\nmax = 1").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)), "{err:?}");
}

#[test]
fn missing_file_is_an_io_error() {
    let err = Tunables::from_toml_file("does/not/exist.toml").unwrap_err();
    match err {
        ConfigError::Io { path, .. } => assert!(path.contains("exist.toml")),
        other => panic!("expected Io, got {other:?}"),
    }
}
