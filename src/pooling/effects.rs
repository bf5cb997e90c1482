//! Self-expiring effect pools.
//!
//! An effect computes how long it runs from its own emitter timings, and the pool arms a
//! one-shot release for it. Pending releases sit in a min-heap keyed by fire time and are
//! serviced by [`EffectPool::update`] once per frame. Each arm gets a fresh ticket; the
//! handle's current ticket lives in `armed`, so re-arming or stopping simply makes the old
//! heap entry stale and it is skipped when popped.
//!
//! [`EffectRegistry`] adds per-category bypass: those categories are never pooled, every
//! play builds a throwaway instance that is dropped when its `Timer` finishes.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Duration;

use bevy::platform::collections::HashMap;
use bevy::prelude::*;
use serde::Deserialize;

use crate::common::error::ConfigError;

use super::pool::{EntityPool, PoolHandle, PoolSettings};
use super::recyclable::{Factory, Pose, Recyclable};

/// Added to every computed running duration so the tail of the last particle is not cut.
pub const SAFETY_MARGIN: f32 = 0.1;

/// Longest an effect may run before it is released, in seconds.
pub const MAX_EFFECT_SECONDS: f32 = 3600.0;

/// Timing of one sub-emitter, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmitterTiming {
    pub start_delay: f32,
    pub duration: f32,
    pub lifetime: f32,
    pub looping: bool,
}

impl EmitterTiming {
    pub const fn once(start_delay: f32, duration: f32, lifetime: f32) -> Self {
        Self {
            start_delay,
            duration,
            lifetime,
            looping: false,
        }
    }

    pub const fn looping(start_delay: f32, lifetime: f32) -> Self {
        Self {
            start_delay,
            duration: 0.0,
            lifetime,
            looping: true,
        }
    }

    #[inline]
    fn span(&self) -> f32 {
        self.start_delay + self.duration + self.lifetime
    }
}

/// Longest non-looping emitter span plus [`SAFETY_MARGIN`], or `fallback` plus the margin
/// when nothing has a finite span.
pub fn running_duration(emitters: &[EmitterTiming], fallback: f32) -> f32 {
    let duration = emitters
        .iter()
        .filter(|e| !e.looping)
        .map(EmitterTiming::span)
        .reduce(f32::max)
        .unwrap_or(fallback)
        + SAFETY_MARGIN;
    clamp_seconds(duration)
}

/// Clamp into `0..=MAX_EFFECT_SECONDS`; NaN becomes zero.
fn clamp_seconds(seconds: f32) -> f32 {
    if seconds.is_nan() {
        0.0
    } else {
        seconds.clamp(0.0, MAX_EFFECT_SECONDS)
    }
}

/// Effect capabilities on top of [`Recyclable`].
pub trait TimedEffect: Recyclable {
    fn emitters(&self) -> &[EmitterTiming];
    fn restart_emission(&mut self);
    fn halt_emission(&mut self);
}

#[derive(Debug, Clone, Copy)]
struct PendingRelease<C> {
    fire_at: f32,
    ticket: u64,
    handle: PoolHandle<C>,
}

impl<C> PartialEq for PendingRelease<C> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<C> Eq for PendingRelease<C> {}

impl<C> PartialOrd for PendingRelease<C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<C> Ord for PendingRelease<C> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.fire_at
            .total_cmp(&other.fire_at)
            .then(self.ticket.cmp(&other.ticket))
    }
}

pub struct EffectPool<T: TimedEffect> {
    pool: EntityPool<T>,
    fallback_duration: f32,
    durations: HashMap<u32, f32>,
    armed: HashMap<PoolHandle<T::Category>, u64>,
    pending: BinaryHeap<Reverse<PendingRelease<T::Category>>>,
    next_ticket: u64,
    now: f32,
}

impl<T: TimedEffect> EffectPool<T> {
    pub fn new(
        category: T::Category,
        factory: Factory<T>,
        initial_size: usize,
        max_size: usize,
        allow_expand: bool,
        fallback_duration: f32,
    ) -> Self {
        Self {
            pool: EntityPool::new(category, factory, initial_size, max_size, allow_expand),
            fallback_duration,
            durations: HashMap::default(),
            armed: HashMap::default(),
            pending: BinaryHeap::new(),
            next_ticket: 0,
            now: 0.0,
        }
    }

    /// Stamp handles with `epoch`, see [`EntityPool::with_epoch`].
    pub fn with_epoch(mut self, epoch: u32) -> Self {
        self.pool = self.pool.with_epoch(epoch);
        self
    }

    /// Acquire, start emitting and arm the self-release.
    pub fn play(&mut self, pose: Pose) -> Option<PoolHandle<T::Category>> {
        let handle = self.pool.acquire(pose)?;
        self.start(handle);
        Some(handle)
    }

    /// Play an already-active instance again: new pose, emission restarted, timer
    /// re-armed. The previous timer is superseded, not doubled.
    pub fn restart(&mut self, handle: PoolHandle<T::Category>, pose: Pose) -> bool {
        let Some(effect) = self.pool.get_mut(handle) else {
            warn!("restart of inactive {:?} effect", handle.category());
            return false;
        };
        effect.activate(pose);
        self.start(handle);
        true
    }

    fn start(&mut self, handle: PoolHandle<T::Category>) {
        let fallback = self.fallback_duration;
        let Some(effect) = self.pool.get_mut(handle) else {
            return;
        };
        effect.restart_emission();
        let duration = *self
            .durations
            .entry(handle.slot())
            .or_insert_with(|| running_duration(effect.emitters(), fallback));
        self.arm(handle, duration);
    }

    fn arm(&mut self, handle: PoolHandle<T::Category>, duration: f32) {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.armed.insert(handle, ticket);
        self.pending.push(Reverse(PendingRelease {
            fire_at: self.now + duration,
            ticket,
            handle,
        }));
    }

    /// Cancel the pending release, halt emission and return the instance now.
    ///
    /// Stopping something that is not playing is a logged no-op.
    pub fn stop(&mut self, handle: PoolHandle<T::Category>) -> bool {
        self.armed.remove(&handle);
        let Some(effect) = self.pool.get_mut(handle) else {
            warn!("stop of inactive {:?} effect", handle.category());
            return false;
        };
        effect.halt_emission();
        self.pool.release(handle)
    }

    /// Advance the pool clock and release everything whose timer has run out.
    pub fn update(&mut self, dt: f32) -> usize {
        self.now += dt.max(0.0);
        let mut released = 0;

        while let Some(Reverse(next)) = self.pending.peek() {
            if next.fire_at > self.now {
                break;
            }
            let Some(Reverse(due)) = self.pending.pop() else {
                break;
            };
            if self.armed.get(&due.handle) != Some(&due.ticket) {
                continue;
            }
            self.armed.remove(&due.handle);
            if let Some(effect) = self.pool.get_mut(due.handle) {
                effect.halt_emission();
            }
            if self.pool.release(due.handle) {
                released += 1;
            }
        }

        released
    }

    /// Stop everything that is playing.
    pub fn stop_all(&mut self) -> usize {
        self.armed.clear();
        self.pending.clear();
        for handle in self.pool.active_handles() {
            if let Some(effect) = self.pool.get_mut(handle) {
                effect.halt_emission();
            }
        }
        self.pool.release_all()
    }

    pub fn destroy(&mut self) {
        self.armed.clear();
        self.pending.clear();
        self.durations.clear();
        self.pool.destroy();
    }

    /// Seconds until `handle` releases itself, if it is armed.
    pub fn remaining(&self, handle: PoolHandle<T::Category>) -> Option<f32> {
        let ticket = self.armed.get(&handle)?;
        self.pending
            .iter()
            .find(|Reverse(p)| p.ticket == *ticket)
            .map(|Reverse(p)| (p.fire_at - self.now).max(0.0))
    }

    /// Running duration cached for the slot behind `handle`.
    pub fn running_duration_of(&self, handle: PoolHandle<T::Category>) -> Option<f32> {
        self.durations.get(&handle.slot()).copied()
    }

    pub fn get(&self, handle: PoolHandle<T::Category>) -> Option<&T> {
        self.pool.get(handle)
    }

    #[inline]
    pub fn is_playing(&self, handle: PoolHandle<T::Category>) -> bool {
        self.pool.is_active(handle)
    }

    #[inline]
    pub fn entities(&self) -> &EntityPool<T> {
        &self.pool
    }

    #[inline]
    pub fn active_count(&self) -> usize {
        self.pool.active_count()
    }

    #[inline]
    pub fn available_count(&self) -> usize {
        self.pool.available_count()
    }

    #[inline]
    pub fn factory_failed(&self) -> bool {
        self.pool.factory_failed()
    }
}

/// Sizing and routing for one effect category.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct EffectSettings {
    #[serde(flatten)]
    pub pool: PoolSettings,
    /// Skip pooling: build, play and drop each instance.
    pub bypass: bool,
    /// Running duration used when no emitter has a finite span.
    pub fallback_duration: f32,
    /// Delay before a bypass instance is dropped. `None` uses its running duration.
    pub bypass_lifetime: Option<f32>,
}

impl Default for EffectSettings {
    fn default() -> Self {
        Self {
            pool: PoolSettings::default(),
            bypass: false,
            fallback_duration: 1.0,
            bypass_lifetime: None,
        }
    }
}

pub struct EffectCategoryConfig<T: TimedEffect> {
    pub category: T::Category,
    pub factory: Option<Factory<T>>,
    pub settings: EffectSettings,
}

impl<T: TimedEffect> EffectCategoryConfig<T> {
    pub fn new(
        category: T::Category,
        factory: impl FnMut() -> Option<T> + Send + Sync + 'static,
    ) -> Self {
        Self {
            category,
            factory: Some(Box::new(factory)),
            settings: EffectSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: EffectSettings) -> Self {
        self.settings = settings;
        self
    }
}

/// Result of a registry `play`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayedEffect<C> {
    Pooled(PoolHandle<C>),
    Transient { category: C, id: u64 },
}

struct BypassCategory<T> {
    factory: Factory<T>,
    settings: EffectSettings,
}

struct Transient<T: TimedEffect> {
    id: u64,
    effect: T,
    lifetime: Timer,
}

pub struct EffectRegistry<T: TimedEffect> {
    pools: HashMap<T::Category, EffectPool<T>>,
    bypass: HashMap<T::Category, BypassCategory<T>>,
    transients: Vec<Transient<T>>,
    default_max: usize,
    next_transient: u64,
    epoch: u32,
}

impl<T: TimedEffect> EffectRegistry<T> {
    pub fn new(default_max: usize) -> Self {
        Self {
            pools: HashMap::default(),
            bypass: HashMap::default(),
            transients: Vec::new(),
            default_max,
            next_transient: 0,
            epoch: 0,
        }
    }

    /// Same contract as the entity registry: bad entries are logged and reported.
    pub fn configure(
        &mut self,
        configs: impl IntoIterator<Item = EffectCategoryConfig<T>>,
    ) -> Vec<ConfigError> {
        let mut skipped = Vec::new();

        for config in configs {
            let category = config.category;
            if let Err(err) = self.register(config) {
                error!("skipping effect {category:?}: {err}");
                skipped.push(err);
            }
        }

        skipped
    }

    fn register(&mut self, config: EffectCategoryConfig<T>) -> Result<(), ConfigError> {
        let EffectCategoryConfig {
            category,
            factory,
            settings,
        } = config;
        let name = || ConfigError::category(category);

        if self.has_category(category) {
            return Err(ConfigError::DuplicateCategory { category: name() });
        }
        let Some(factory) = factory else {
            return Err(ConfigError::MissingFactory { category: name() });
        };

        if settings.bypass {
            info!("effect {category:?}: bypassing pool");
            self.bypass
                .insert(category, BypassCategory { factory, settings });
            return Ok(());
        }

        let max = settings.pool.max.unwrap_or(self.default_max);
        if max == 0 {
            return Err(ConfigError::ZeroCapacity { category: name() });
        }
        if settings.pool.prewarm > max {
            warn!(
                "effect pool {category:?}: prewarm {} exceeds max {max}, clamping",
                settings.pool.prewarm
            );
        }

        let pool = EffectPool::new(
            category,
            factory,
            settings.pool.prewarm,
            max,
            settings.pool.expand,
            settings.fallback_duration,
        )
        .with_epoch(self.epoch);
        if pool.factory_failed() {
            return Err(ConfigError::FactoryFailed { category: name() });
        }

        info!(
            "effect pool {category:?}: prewarmed {} / max {max}",
            pool.entities().total_created()
        );
        self.pools.insert(category, pool);
        Ok(())
    }

    pub fn play(&mut self, category: T::Category, pose: Pose) -> Option<PlayedEffect<T::Category>> {
        if let Some(pool) = self.pools.get_mut(&category) {
            return pool.play(pose).map(PlayedEffect::Pooled);
        }

        let Some(bypass) = self.bypass.get_mut(&category) else {
            error!("play requested for unconfigured effect {category:?}");
            return None;
        };

        let Some(mut effect) = (bypass.factory)() else {
            error!("factory for bypass effect {category:?} produced no instance");
            return None;
        };
        effect.activate(pose);
        effect.restart_emission();

        let lifetime = transient_lifetime(&effect, &bypass.settings);

        let id = self.next_transient;
        self.next_transient += 1;
        self.transients.push(Transient {
            id,
            effect,
            lifetime: Timer::from_seconds(lifetime, TimerMode::Once),
        });
        Some(PlayedEffect::Transient { category, id })
    }

    /// Play something that is already playing again, at `pose`.
    ///
    /// Pooled effects re-arm their single release timer; transients restart their
    /// lifetime. Anything that already finished is a logged no-op.
    pub fn restart(&mut self, played: PlayedEffect<T::Category>, pose: Pose) -> bool {
        match played {
            PlayedEffect::Pooled(handle) => match self.pools.get_mut(&handle.category()) {
                Some(pool) => pool.restart(handle, pose),
                None => {
                    warn!("restart for {:?} which has no effect pool", handle.category());
                    false
                }
            },
            PlayedEffect::Transient { category, id } => {
                let Some(transient) = self.transients.iter_mut().find(|t| t.id == id) else {
                    warn!("restart of finished {category:?} transient {id}");
                    return false;
                };
                transient.effect.activate(pose);
                transient.effect.restart_emission();
                transient.lifetime.reset();
                true
            }
        }
    }

    /// Stop early. Transients are dropped on the spot.
    pub fn stop(&mut self, played: PlayedEffect<T::Category>) -> bool {
        match played {
            PlayedEffect::Pooled(handle) => match self.pools.get_mut(&handle.category()) {
                Some(pool) => pool.stop(handle),
                None => {
                    warn!("stop for {:?} which has no effect pool", handle.category());
                    false
                }
            },
            PlayedEffect::Transient { id, .. } => {
                let before = self.transients.len();
                self.transients.retain(|t| t.id != id);
                self.transients.len() != before
            }
        }
    }

    /// Service every pool timer and drop expired transients.
    pub fn update(&mut self, dt: f32) -> usize {
        let dt = dt.max(0.0);
        let mut released: usize = self.pools.values_mut().map(|pool| pool.update(dt)).sum();

        let delta = Duration::try_from_secs_f32(dt).unwrap_or(Duration::ZERO);
        let before = self.transients.len();
        self.transients.retain_mut(|t| {
            t.lifetime.tick(delta);
            !t.lifetime.is_finished()
        });
        released += before - self.transients.len();
        released
    }

    pub fn stop_all(&mut self) {
        for pool in self.pools.values_mut() {
            pool.stop_all();
        }
        self.transients.clear();
    }

    pub fn teardown(&mut self) {
        for pool in self.pools.values_mut() {
            pool.destroy();
        }
        self.pools.clear();
        self.bypass.clear();
        self.transients.clear();
        self.epoch = self.epoch.wrapping_add(1);
    }

    pub fn pool(&self, category: T::Category) -> Option<&EffectPool<T>> {
        self.pools.get(&category)
    }

    #[inline]
    pub fn has_category(&self, category: T::Category) -> bool {
        self.pools.contains_key(&category) || self.bypass.contains_key(&category)
    }

    #[inline]
    pub fn is_bypassed(&self, category: T::Category) -> bool {
        self.bypass.contains_key(&category)
    }

    /// Playing instances, pooled or transient.
    pub fn active_count_of(&self, category: T::Category) -> usize {
        match self.pools.get(&category) {
            Some(pool) => pool.active_count(),
            None => self
                .transients
                .iter()
                .filter(|t| t.effect.category() == category)
                .count(),
        }
    }

    pub fn available_count_of(&self, category: T::Category) -> usize {
        self.pools.get(&category).map_or(0, |pool| pool.available_count())
    }

    #[inline]
    pub fn transient_count(&self) -> usize {
        self.transients.len()
    }
}

/// Seconds a bypass instance lives, clamped to [`MAX_EFFECT_SECONDS`].
fn transient_lifetime<T: TimedEffect>(effect: &T, settings: &EffectSettings) -> f32 {
    let lifetime = settings
        .bypass_lifetime
        .unwrap_or_else(|| running_duration(effect.emitters(), settings.fallback_duration));
    clamp_seconds(lifetime)
}
