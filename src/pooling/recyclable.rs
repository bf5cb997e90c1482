//! The capability surface every pooled instance exposes.

use std::fmt::Debug;
use std::hash::Hash;

use bevy::math::Rot2;
use bevy::prelude::*;

/// Tag type used to key pools. A small closed enum in practice.
pub trait CategoryKey: Copy + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> CategoryKey for T where T: Copy + Eq + Hash + Debug + Send + Sync + 'static {}

/// Where and facing which way an instance comes to life.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec2,
    pub rotation: Rot2,
}

impl Pose {
    pub const ORIGIN: Pose = Pose {
        position: Vec2::ZERO,
        rotation: Rot2::IDENTITY,
    };

    #[inline]
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            rotation: Rot2::IDENTITY,
        }
    }

    /// Pose at `position`, rotated so local +X points at `target`.
    pub fn facing(position: Vec2, target: Vec2) -> Self {
        let dir = target - position;
        let rotation = if dir.length_squared() < 1e-6 {
            Rot2::IDENTITY
        } else {
            Rot2::radians(dir.y.atan2(dir.x))
        };
        Self { position, rotation }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::ORIGIN
    }
}

/// Minimal contract for anything a pool can recycle.
///
/// Instances are created by a factory, owned by exactly one pool, and cycle through
/// `activate` / `deactivate` until the pool is destroyed, at which point they are dropped.
pub trait Recyclable: Send + Sync + 'static {
    type Category: CategoryKey;

    fn activate(&mut self, pose: Pose);
    fn deactivate(&mut self);
    fn category(&self) -> Self::Category;
}

/// Post-spawn modifier surface used by the director during frenzy.
pub trait SpeedScaled {
    fn set_speed_multiplier(&mut self, multiplier: f32);
}

/// Builds new instances for one category. `None` means the factory is broken.
pub type Factory<T> = Box<dyn FnMut() -> Option<T> + Send + Sync>;
