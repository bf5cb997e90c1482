//! Time-driven spawn director.
//!
//! The director owns a game clock and a timeline. It never stores the current phase as
//! truth: every tick recomputes `phase_of(game_time)` and reacts when the answer differs
//! from the previous tick. On a change, entry side effects run first, then the new
//! phase's rules, so a freshly entered phase never spawns with stale modifiers.
//!
//! ```text
//! tick(dt) ─ paused/stopped? ─> nothing
//!          └ game_time += dt * time_scale
//!            phase = phase_of(game_time)
//!            phase changed? ─> enter_phase (cooldowns zeroed, frenzy, boss hook)
//!            each rule: cooldown += scaled dt; due? ─> registry.spawn(kind, zone) × count
//! ```

use bevy::prelude::*;
use rand::Rng;

use crate::common::kinds::EnemyKind;
use crate::pooling::{PoolHandle, PoolRegistry, Pose, Recyclable, SpeedScaled};

use super::timeline::{Phase, PhaseTimeline, SpawnRule};
use super::zones::PlayfieldBounds;

/// Modifier strengths applied while frenzy is on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrenzyTuning {
    /// Speed multiplier given to everything spawned during frenzy.
    pub speed: f32,
    /// Rule intervals are multiplied by this during frenzy.
    pub interval_scale: f32,
}

impl Default for FrenzyTuning {
    fn default() -> Self {
        Self {
            speed: 1.5,
            interval_scale: 0.75,
        }
    }
}

/// Things the director wants the outside world to know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectorEvent {
    PhaseChanged { from: Phase, to: Phase },
    FrenzyStarted,
    FrenzyEnded,
    /// Entry into the final phase. Fires once per session.
    BossTriggered,
}

/// Outcome of one tick, for telemetry and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub spawned: Vec<PoolHandle<EnemyKind>>,
    /// Spawn attempts refused by a closed gate.
    pub skipped: u32,
}

#[derive(Resource)]
pub struct SpawnDirector {
    timeline: PhaseTimeline,
    bounds: PlayfieldBounds,
    frenzy_tuning: FrenzyTuning,
    time_scale: f32,
    game_time: f32,
    running: bool,
    paused: bool,
    last_phase: Phase,
    cooldowns: Vec<f32>,
    frenzy: bool,
    boss_fired: bool,
    events: Vec<DirectorEvent>,
}

impl SpawnDirector {
    pub fn new(timeline: PhaseTimeline, bounds: PlayfieldBounds) -> Self {
        let first = timeline.first_phase();
        let cooldowns = vec![0.0; timeline.rules_of(first).len()];
        Self {
            timeline,
            bounds,
            frenzy_tuning: FrenzyTuning::default(),
            time_scale: 1.0,
            game_time: 0.0,
            running: false,
            paused: false,
            last_phase: first,
            cooldowns,
            frenzy: false,
            boss_fired: false,
            events: Vec::new(),
        }
    }

    pub fn with_frenzy_tuning(mut self, tuning: FrenzyTuning) -> Self {
        self.frenzy_tuning = tuning;
        self
    }

    pub fn with_time_scale(mut self, scale: f32) -> Self {
        self.set_time_scale(scale);
        self
    }

    // -------------------------------------------------------------------------
    // Session control
    // -------------------------------------------------------------------------

    /// Begin (or continue after `stop`) advancing. Starting twice is a no-op.
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.paused = false;
        info!("director started at {}", self.formatted_time());
    }

    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.paused = false;
        info!("director stopped at {}", self.formatted_time());
    }

    /// Freeze the clock and every cooldown. Returns `false` if nothing changed.
    pub fn pause(&mut self) -> bool {
        if !self.running || self.paused {
            return false;
        }
        self.paused = true;
        debug!("director paused at {}", self.formatted_time());
        true
    }

    pub fn resume(&mut self) -> bool {
        if !self.paused {
            return false;
        }
        self.paused = false;
        debug!("director resumed at {}", self.formatted_time());
        true
    }

    /// Back to zero and the first phase, all cooldowns cleared, boss hook re-armed.
    /// Running and paused flags are left alone.
    pub fn reset(&mut self) {
        self.game_time = 0.0;
        self.last_phase = self.timeline.first_phase();
        self.reset_cooldowns();
        self.frenzy = false;
        self.boss_fired = false;
        self.events.clear();
    }

    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = if scale.is_finite() { scale.max(0.0) } else { 1.0 };
    }

    /// Playfield used for zone resolution. Normally captured once from the camera.
    pub fn set_bounds(&mut self, bounds: PlayfieldBounds) {
        self.bounds = bounds;
    }

    pub fn set_frenzy_tuning(&mut self, tuning: FrenzyTuning) {
        self.frenzy_tuning = tuning;
    }

    // -------------------------------------------------------------------------
    // Tick
    // -------------------------------------------------------------------------

    pub fn tick<T, R>(
        &mut self,
        real_dt: f32,
        registry: &mut PoolRegistry<T>,
        rng: &mut R,
    ) -> TickReport
    where
        T: Recyclable<Category = EnemyKind> + SpeedScaled,
        R: Rng,
    {
        if !self.running || self.paused || !real_dt.is_finite() {
            return TickReport::default();
        }

        let dt = real_dt.max(0.0) * self.time_scale;
        self.game_time += dt;

        let phase = self.phase();
        if phase != self.last_phase {
            self.enter_phase(phase);
        }

        self.run_rules(phase, dt, registry, rng)
    }

    fn enter_phase(&mut self, phase: Phase) {
        let from = self.last_phase;
        self.last_phase = phase;
        self.reset_cooldowns();

        info!("phase {from} -> {phase} at {}", self.formatted_time());
        self.events.push(DirectorEvent::PhaseChanged { from, to: phase });

        match phase {
            Phase::Frenzy if !self.frenzy => {
                self.frenzy = true;
                self.events.push(DirectorEvent::FrenzyStarted);
            }
            // Normally Silence; a large step can jump straight past it.
            _ if phase != Phase::Frenzy && self.frenzy => {
                self.frenzy = false;
                self.events.push(DirectorEvent::FrenzyEnded);
            }
            _ => {}
        }

        if phase == self.timeline.final_phase() && !self.boss_fired {
            self.boss_fired = true;
            info!("final phase reached, triggering boss");
            self.events.push(DirectorEvent::BossTriggered);
        }
    }

    fn reset_cooldowns(&mut self) {
        let rules = self.timeline.rules_of(self.last_phase).len();
        self.cooldowns.clear();
        self.cooldowns.resize(rules, 0.0);
    }

    fn run_rules<T, R>(
        &mut self,
        phase: Phase,
        dt: f32,
        registry: &mut PoolRegistry<T>,
        rng: &mut R,
    ) -> TickReport
    where
        T: Recyclable<Category = EnemyKind> + SpeedScaled,
        R: Rng,
    {
        let mut report = TickReport::default();
        let interval_scale = if self.frenzy {
            self.frenzy_tuning.interval_scale
        } else {
            1.0
        };
        let speed = if self.frenzy {
            self.frenzy_tuning.speed
        } else {
            1.0
        };

        let rules = self.timeline.rules_of(phase);
        for (rule, cooldown) in rules.iter().zip(self.cooldowns.iter_mut()) {
            *cooldown += dt;
            if *cooldown < rule.interval * interval_scale {
                continue;
            }
            *cooldown = 0.0;
            fire_rule(rule, &self.bounds, speed, registry, rng, &mut report);
        }

        report
    }

    // -------------------------------------------------------------------------
    // Read-only accessors
    // -------------------------------------------------------------------------

    /// Current phase, always derived from the clock.
    #[inline]
    pub fn phase(&self) -> Phase {
        self.timeline.phase_of(self.game_time)
    }

    #[inline]
    pub fn game_time(&self) -> f32 {
        self.game_time
    }

    /// Elapsed game time as `MM:SS`.
    pub fn formatted_time(&self) -> String {
        format_clock(self.game_time)
    }

    #[inline]
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[inline]
    pub fn is_frenzy(&self) -> bool {
        self.frenzy
    }

    #[inline]
    pub fn boss_fired(&self) -> bool {
        self.boss_fired
    }

    /// Per-rule cooldown accumulators of the current phase, in rule order.
    #[inline]
    pub fn cooldowns(&self) -> &[f32] {
        &self.cooldowns
    }

    #[inline]
    pub fn timeline(&self) -> &PhaseTimeline {
        &self.timeline
    }

    #[inline]
    pub fn bounds(&self) -> &PlayfieldBounds {
        &self.bounds
    }

    /// Hand over everything queued since the last call.
    pub fn take_events(&mut self) -> Vec<DirectorEvent> {
        std::mem::take(&mut self.events)
    }
}

impl Default for SpawnDirector {
    fn default() -> Self {
        Self::new(PhaseTimeline::standard(), PlayfieldBounds::default())
    }
}

fn fire_rule<T, R>(
    rule: &SpawnRule,
    bounds: &PlayfieldBounds,
    speed: f32,
    registry: &mut PoolRegistry<T>,
    rng: &mut R,
    report: &mut TickReport,
) where
    T: Recyclable<Category = EnemyKind> + SpeedScaled,
    R: Rng,
{
    for _ in 0..rule.count {
        let position = rule.zone.resolve(bounds, rng);
        let pose = Pose::facing(position, bounds.center());

        // A refused spawn is just skipped; the next interval tries again.
        let Some(handle) = registry.spawn(rule.category, pose) else {
            report.skipped += 1;
            continue;
        };
        if let Some(enemy) = registry.get_mut(handle) {
            enemy.set_speed_multiplier(speed);
        }
        report.spawned.push(handle);
    }
}

/// `MM:SS` with minutes allowed past 59.
pub fn format_clock(seconds: f32) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}
