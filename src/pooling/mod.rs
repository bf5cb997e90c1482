//! Entity recycling core.
//!
//! ```text
//!   PoolRegistry<T> ── global cap ──┐
//!     ├─ EntityPool<T> (Drifter)    │  spawn: global gate first, then the pool
//!     ├─ EntityPool<T> (Dasher)     │  despawn: pool release, then global count
//!     └─ ...                        ┘
//!
//!   EffectRegistry<T>
//!     ├─ EffectPool<T> (pooled, self-releasing on a timer heap)
//!     └─ bypass categories (build, play, drop after a delay)
//! ```
//!
//! Nothing here touches a Bevy `World`. Plugins wrap these types in resources and drive
//! them from systems.

pub mod effects;
pub mod pool;
pub mod recyclable;
pub mod registry;

pub use effects::{
    running_duration, EffectCategoryConfig, EffectPool, EffectRegistry, EffectSettings,
    EmitterTiming, PlayedEffect, TimedEffect, MAX_EFFECT_SECONDS, SAFETY_MARGIN,
};
pub use pool::{EntityPool, PoolHandle, PoolSettings};
pub use recyclable::{CategoryKey, Factory, Pose, Recyclable, SpeedScaled};
pub use registry::{CategoryConfig, ConfigReport, PoolRegistry};
