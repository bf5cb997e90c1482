//! Single-category entity pool.
//!
//! # Invariants
//! - `available.len() + active.len() == slots.len()` (== total created) after every call.
//! - `slots.len() <= max_size`.
//! - A slot index is in `available` or its current handle is in `active`, never both.
//!
//! Instances live in a slot arena owned by the pool. Callers hold a [`PoolHandle`] whose
//! generation is bumped on every acquire, so a handle from an earlier activation can never
//! release (or mutate) a later one. The handle also carries the pool's epoch: a rebuilt
//! pool restarts its generations, but under a new epoch, so handles minted before a
//! teardown stay dead.

use std::collections::VecDeque;

use bevy::platform::collections::HashSet;
use bevy::prelude::*;
use serde::Deserialize;

use super::recyclable::{CategoryKey, Factory, Pose, Recyclable};

/// Ticket for one activation of one pooled instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolHandle<C> {
    category: C,
    epoch: u32,
    slot: u32,
    generation: u32,
}

impl<C: CategoryKey> PoolHandle<C> {
    #[inline]
    pub fn category(&self) -> C {
        self.category
    }

    /// Which build of the pool minted this handle.
    #[inline]
    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    #[inline]
    pub fn slot(&self) -> u32 {
        self.slot
    }

    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// Sizing for one pool as it appears in config.
///
/// `max: None` defers to the registry-wide default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PoolSettings {
    pub prewarm: usize,
    pub max: Option<usize>,
    pub expand: bool,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            prewarm: 0,
            max: None,
            expand: true,
        }
    }
}

struct Slot<T> {
    value: T,
    generation: u32,
}

pub struct EntityPool<T: Recyclable> {
    category: T::Category,
    factory: Factory<T>,
    slots: Vec<Slot<T>>,
    available: VecDeque<u32>,
    active: HashSet<PoolHandle<T::Category>>,
    max_size: usize,
    allow_expand: bool,
    epoch: u32,
    factory_failed: bool,
    destroyed: bool,
}

impl<T: Recyclable> EntityPool<T> {
    /// Build a pool and prewarm `min(initial_size, max_size)` deactivated instances.
    ///
    /// A factory that returns `None` (or an instance of another category) stops the
    /// prewarm; the failure is logged and visible through [`EntityPool::factory_failed`].
    pub fn new(
        category: T::Category,
        factory: Factory<T>,
        initial_size: usize,
        max_size: usize,
        allow_expand: bool,
    ) -> Self {
        let mut pool = Self {
            category,
            factory,
            slots: Vec::with_capacity(initial_size.min(max_size)),
            available: VecDeque::with_capacity(initial_size.min(max_size)),
            active: HashSet::default(),
            max_size,
            allow_expand,
            epoch: 0,
            factory_failed: false,
            destroyed: false,
        };

        for _ in 0..initial_size.min(max_size) {
            let Some(slot) = pool.create_instance() else {
                break;
            };
            pool.slots[slot as usize].value.deactivate();
            pool.available.push_back(slot);
        }

        pool
    }

    /// Stamp every handle this pool mints with `epoch`. Set before the first acquire.
    pub fn with_epoch(mut self, epoch: u32) -> Self {
        self.epoch = epoch;
        self
    }

    fn create_instance(&mut self) -> Option<u32> {
        let Some(value) = (self.factory)() else {
            error!("factory for {:?} produced no instance", self.category);
            self.factory_failed = true;
            return None;
        };

        if value.category() != self.category {
            error!(
                "factory for {:?} produced an instance of {:?}",
                self.category,
                value.category()
            );
            self.factory_failed = true;
            return None;
        }

        let slot = self.slots.len() as u32;
        self.slots.push(Slot {
            value,
            generation: 0,
        });
        Some(slot)
    }

    /// Hand out an instance, recycled first, created if expansion allows.
    ///
    /// `None` is exhaustion: expected under load, never an error.
    pub fn acquire(&mut self, pose: Pose) -> Option<PoolHandle<T::Category>> {
        if self.destroyed {
            warn!("acquire on destroyed {:?} pool", self.category);
            return None;
        }

        let slot = match self.available.pop_front() {
            Some(slot) => slot,
            None if self.allow_expand && self.slots.len() < self.max_size => {
                self.create_instance()?
            }
            None => {
                debug!("{:?} pool exhausted ({} live)", self.category, self.active.len());
                return None;
            }
        };

        let entry = &mut self.slots[slot as usize];
        entry.generation = entry.generation.wrapping_add(1);
        entry.value.activate(pose);

        let handle = PoolHandle {
            category: self.category,
            epoch: self.epoch,
            slot,
            generation: entry.generation,
        };
        self.active.insert(handle);
        Some(handle)
    }

    /// Return an instance. Unknown, stale and already-released handles are a logged no-op.
    pub fn release(&mut self, handle: PoolHandle<T::Category>) -> bool {
        if !self.active.contains(&handle) {
            warn!(
                "release of {:?} epoch {} slot {} gen {} which is not active",
                handle.category, handle.epoch, handle.slot, handle.generation
            );
            return false;
        }

        self.slots[handle.slot as usize].value.deactivate();
        self.active.remove(&handle);
        self.available.push_back(handle.slot);
        true
    }

    /// Release every active instance. Returns how many were released.
    pub fn release_all(&mut self) -> usize {
        let live: Vec<_> = self.active.iter().copied().collect();
        live.into_iter().filter(|h| self.release(*h)).count()
    }

    /// Drop every instance, active or not. The pool refuses to acquire afterwards.
    pub fn destroy(&mut self) {
        self.active.clear();
        self.available.clear();
        self.slots.clear();
        self.destroyed = true;
    }

    #[inline]
    pub fn is_active(&self, handle: PoolHandle<T::Category>) -> bool {
        self.active.contains(&handle)
    }

    pub fn get(&self, handle: PoolHandle<T::Category>) -> Option<&T> {
        self.is_active(handle)
            .then(|| &self.slots[handle.slot as usize].value)
    }

    pub fn get_mut(&mut self, handle: PoolHandle<T::Category>) -> Option<&mut T> {
        if !self.is_active(handle) {
            return None;
        }
        Some(&mut self.slots[handle.slot as usize].value)
    }

    /// Active instances with their handles, in no particular order.
    pub fn iter_active(&self) -> impl Iterator<Item = (PoolHandle<T::Category>, &T)> + '_ {
        self.active
            .iter()
            .map(|h| (*h, &self.slots[h.slot as usize].value))
    }

    /// Visit every active instance mutably.
    pub fn for_each_active_mut(&mut self, mut f: impl FnMut(PoolHandle<T::Category>, &mut T)) {
        for handle in &self.active {
            f(*handle, &mut self.slots[handle.slot as usize].value);
        }
    }

    /// Snapshot of the current active handles.
    pub fn active_handles(&self) -> Vec<PoolHandle<T::Category>> {
        self.active.iter().copied().collect()
    }

    #[inline]
    pub fn category(&self) -> T::Category {
        self.category
    }

    #[inline]
    pub fn available_count(&self) -> usize {
        self.available.len()
    }

    #[inline]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    #[inline]
    pub fn total_created(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    #[inline]
    pub fn is_at_capacity(&self) -> bool {
        self.slots.len() >= self.max_size
    }

    #[inline]
    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    #[inline]
    pub fn factory_failed(&self) -> bool {
        self.factory_failed
    }

    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}
