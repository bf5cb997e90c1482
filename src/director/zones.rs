//! Declarative spawn zones resolved against the playfield rectangle.
//!
//! Simple zones are strips just outside one edge of the view. Composite zones pick one of
//! their parts uniformly at random on every call, which keeps the phase table declarative.

use bevy::prelude::*;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Zone {
    TopLeft,
    TopCenter,
    TopRight,
    Top,
    Left,
    Right,
    Bottom,
    /// One of the three top thirds.
    TopAny,
    /// Left or right edge.
    EitherSide,
    /// Top, left, right or bottom edge.
    AllEdges,
}

impl Zone {
    pub fn parts(self) -> &'static [Zone] {
        match self {
            Zone::TopAny => &[Zone::TopLeft, Zone::TopCenter, Zone::TopRight],
            Zone::EitherSide => &[Zone::Left, Zone::Right],
            Zone::AllEdges => &[Zone::Top, Zone::Left, Zone::Right, Zone::Bottom],
            _ => &[],
        }
    }

    #[inline]
    pub fn is_composite(self) -> bool {
        !self.parts().is_empty()
    }

    pub fn resolve(self, bounds: &PlayfieldBounds, rng: &mut impl Rng) -> Vec2 {
        match self.parts() {
            [] => self.resolve_simple(bounds, rng),
            parts => parts[rng.gen_range(0..parts.len())].resolve(bounds, rng),
        }
    }

    fn resolve_simple(self, b: &PlayfieldBounds, rng: &mut impl Rng) -> Vec2 {
        let third = b.width() / 3.0;
        let above = b.max.y + b.margin;
        let below = b.min.y - b.margin;

        match self {
            Zone::TopLeft => Vec2::new(span(rng, b.min.x, b.min.x + third), above),
            Zone::TopCenter => Vec2::new(span(rng, b.min.x + third, b.max.x - third), above),
            Zone::TopRight => Vec2::new(span(rng, b.max.x - third, b.max.x), above),
            Zone::Top => Vec2::new(span(rng, b.min.x, b.max.x), above),
            Zone::Bottom => Vec2::new(span(rng, b.min.x, b.max.x), below),
            Zone::Left => Vec2::new(b.min.x - b.margin, span(rng, b.min.y, b.max.y)),
            Zone::Right => Vec2::new(b.max.x + b.margin, span(rng, b.min.y, b.max.y)),
            Zone::TopAny | Zone::EitherSide | Zone::AllEdges => {
                unreachable!("composite zone {self:?} resolved as simple")
            }
        }
    }
}

#[inline]
fn span(rng: &mut impl Rng, lo: f32, hi: f32) -> f32 {
    if hi > lo { rng.gen_range(lo..hi) } else { lo }
}

/// Visible playfield in world units, plus how far outside it things appear.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayfieldBounds {
    pub min: Vec2,
    pub max: Vec2,
    pub margin: f32,
}

impl PlayfieldBounds {
    pub fn from_center(center: Vec2, half_extents: Vec2, margin: f32) -> Self {
        let half = half_extents.abs();
        Self {
            min: center - half,
            max: center + half,
            margin: margin.max(0.0),
        }
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// The view grown by `extra` on every side.
    #[inline]
    pub fn contains_with_slack(&self, p: Vec2, extra: f32) -> bool {
        let slack = Vec2::splat(extra.max(0.0));
        p.cmpge(self.min - slack).all() && p.cmple(self.max + slack).all()
    }
}

impl Default for PlayfieldBounds {
    fn default() -> Self {
        Self::from_center(Vec2::ZERO, Vec2::new(640.0, 360.0), 48.0)
    }
}
