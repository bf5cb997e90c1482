//! One pool per category, behind a registry-wide cap on live instances.
//!
//! Two independent gates compose on every spawn:
//! 1. `global_active >= global_max` closes the registry for every category.
//! 2. The category pool's own `max_size` / expand policy.
//!
//! The global gate is always checked first, so no category can slip past it by having
//! spare per-pool capacity. `global_active` is only touched by `spawn` and `despawn`
//! (and zeroed by the bulk operations), never by a pool.

use bevy::platform::collections::HashMap;
use bevy::prelude::*;

use crate::common::error::ConfigError;

use super::pool::{EntityPool, PoolHandle, PoolSettings};
use super::recyclable::{Factory, Pose, Recyclable};

/// Declaration of one category, validated by [`PoolRegistry::configure`].
pub struct CategoryConfig<T: Recyclable> {
    pub category: T::Category,
    pub factory: Option<Factory<T>>,
    pub settings: PoolSettings,
}

impl<T: Recyclable> CategoryConfig<T> {
    pub fn new(
        category: T::Category,
        factory: impl FnMut() -> Option<T> + Send + Sync + 'static,
    ) -> Self {
        Self {
            category,
            factory: Some(Box::new(factory)),
            settings: PoolSettings::default(),
        }
    }

    /// A declaration with no factory. Always rejected at configure time.
    pub fn without_factory(category: T::Category) -> Self {
        Self {
            category,
            factory: None,
            settings: PoolSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: PoolSettings) -> Self {
        self.settings = settings;
        self
    }
}

/// What `configure` built and what it had to skip.
#[derive(Debug)]
pub struct ConfigReport<C> {
    pub configured: Vec<C>,
    pub skipped: Vec<ConfigError>,
}

impl<C> Default for ConfigReport<C> {
    fn default() -> Self {
        Self {
            configured: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

impl<C> ConfigReport<C> {
    #[inline]
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

pub struct PoolRegistry<T: Recyclable> {
    pools: HashMap<T::Category, EntityPool<T>>,
    global_max: usize,
    default_max: usize,
    global_active: usize,
    /// Bumped on teardown so handles from a previous build never match a rebuilt pool.
    epoch: u32,
}

impl<T: Recyclable> PoolRegistry<T> {
    pub fn new(global_max: usize, default_max: usize) -> Self {
        Self {
            pools: HashMap::default(),
            global_max,
            default_max,
            global_active: 0,
            epoch: 0,
        }
    }

    /// Build a pool for every valid declaration.
    ///
    /// Invalid entries are logged and reported, never fatal: the registry keeps serving
    /// every category that did configure.
    pub fn configure(
        &mut self,
        configs: impl IntoIterator<Item = CategoryConfig<T>>,
    ) -> ConfigReport<T::Category> {
        let mut report = ConfigReport::default();

        for config in configs {
            match self.build_pool(config) {
                Ok(pool) => {
                    info!(
                        "pool {:?}: prewarmed {} / max {}",
                        pool.category(),
                        pool.total_created(),
                        pool.max_size()
                    );
                    report.configured.push(pool.category());
                    self.pools.insert(pool.category(), pool);
                }
                Err(err) => {
                    error!("skipping pool: {err}");
                    report.skipped.push(err);
                }
            }
        }

        report
    }

    fn build_pool(&self, config: CategoryConfig<T>) -> Result<EntityPool<T>, ConfigError> {
        let CategoryConfig {
            category,
            factory,
            settings,
        } = config;
        let name = || ConfigError::category(category);

        if self.pools.contains_key(&category) {
            return Err(ConfigError::DuplicateCategory { category: name() });
        }
        let Some(factory) = factory else {
            return Err(ConfigError::MissingFactory { category: name() });
        };

        let max = settings.max.unwrap_or(self.default_max);
        if max == 0 {
            return Err(ConfigError::ZeroCapacity { category: name() });
        }
        if settings.prewarm > max {
            warn!(
                "pool {category:?}: prewarm {} exceeds max {max}, clamping",
                settings.prewarm
            );
        }

        let pool = EntityPool::new(category, factory, settings.prewarm, max, settings.expand)
            .with_epoch(self.epoch);
        if pool.factory_failed() {
            return Err(ConfigError::FactoryFailed { category: name() });
        }
        Ok(pool)
    }

    /// Activate an instance of `category`, or `None` when either gate is closed.
    pub fn spawn(&mut self, category: T::Category, pose: Pose) -> Option<PoolHandle<T::Category>> {
        if self.global_active >= self.global_max {
            debug!("global cap {} reached, {category:?} spawn skipped", self.global_max);
            return None;
        }

        let Some(pool) = self.pools.get_mut(&category) else {
            error!("spawn requested for unconfigured category {category:?}");
            return None;
        };

        let handle = pool.acquire(pose)?;
        self.global_active += 1;
        Some(handle)
    }

    /// Return an instance to its pool.
    ///
    /// A handle the owning pool does not consider active is a logged no-op and leaves the
    /// global count untouched. A handle whose category has no pool any more (torn down or
    /// never configured) takes the degraded path: the instance is already gone with its
    /// pool, so only the global count is settled.
    pub fn despawn(&mut self, handle: PoolHandle<T::Category>) -> bool {
        match self.pools.get_mut(&handle.category()) {
            Some(pool) => {
                if !pool.release(handle) {
                    return false;
                }
                self.global_active = self.global_active.saturating_sub(1);
                true
            }
            None => {
                warn!(
                    "despawn for {:?} which has no pool, settling global count only",
                    handle.category()
                );
                self.global_active = self.global_active.saturating_sub(1);
                false
            }
        }
    }

    pub fn despawn_all(&mut self) {
        for pool in self.pools.values_mut() {
            pool.release_all();
        }
        self.global_active = 0;
    }

    /// Destroy every pool. The registry can be configured again afterwards.
    pub fn teardown(&mut self) {
        for pool in self.pools.values_mut() {
            pool.destroy();
        }
        self.pools.clear();
        self.global_active = 0;
        self.epoch = self.epoch.wrapping_add(1);
    }

    pub fn get(&self, handle: PoolHandle<T::Category>) -> Option<&T> {
        self.pools.get(&handle.category())?.get(handle)
    }

    pub fn get_mut(&mut self, handle: PoolHandle<T::Category>) -> Option<&mut T> {
        self.pools.get_mut(&handle.category())?.get_mut(handle)
    }

    pub fn pool(&self, category: T::Category) -> Option<&EntityPool<T>> {
        self.pools.get(&category)
    }

    /// Active instances across every pool.
    pub fn iter_active(&self) -> impl Iterator<Item = (PoolHandle<T::Category>, &T)> + '_ {
        self.pools.values().flat_map(|pool| pool.iter_active())
    }

    pub fn for_each_active_mut(&mut self, mut f: impl FnMut(PoolHandle<T::Category>, &mut T)) {
        for pool in self.pools.values_mut() {
            pool.for_each_active_mut(&mut f);
        }
    }

    pub fn active_handles(&self) -> Vec<PoolHandle<T::Category>> {
        self.pools
            .values()
            .flat_map(|pool| pool.active_handles())
            .collect()
    }

    pub fn categories(&self) -> impl Iterator<Item = T::Category> + '_ {
        self.pools.keys().copied()
    }

    #[inline]
    pub fn has_category(&self, category: T::Category) -> bool {
        self.pools.contains_key(&category)
    }

    pub fn active_count_of(&self, category: T::Category) -> usize {
        self.pools.get(&category).map_or(0, EntityPool::active_count)
    }

    pub fn available_count_of(&self, category: T::Category) -> usize {
        self.pools.get(&category).map_or(0, EntityPool::available_count)
    }

    #[inline]
    pub fn global_active_count(&self) -> usize {
        self.global_active
    }

    #[inline]
    pub fn global_max(&self) -> usize {
        self.global_max
    }

    #[inline]
    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    #[inline]
    pub fn default_max(&self) -> usize {
        self.default_max
    }

    /// Change the registry-wide cap. Live instances above a lowered cap stay live; new
    /// spawns wait until enough of them are despawned.
    pub fn set_global_max(&mut self, global_max: usize) {
        self.global_max = global_max;
    }

    pub fn set_default_max(&mut self, default_max: usize) {
        self.default_max = default_max;
    }
}
