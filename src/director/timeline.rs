//! Phase windows and their spawn rules: the authored difficulty curve.
//!
//! Windows are ordered by start time and contiguous; each ends where the next begins and
//! the last is open-ended. [`PhaseTimeline::phase_of`] is a pure lookup over that table.

use std::fmt;

use crate::common::error::ConfigError;
use crate::common::kinds::EnemyKind;

use super::zones::Zone;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    Warmup,
    Trickle,
    Flank,
    Pincer,
    Bulwark,
    Swarm,
    Crossfire,
    Frenzy,
    Silence,
    Boss,
}

impl Phase {
    pub fn name(self) -> &'static str {
        match self {
            Phase::Warmup => "Warmup",
            Phase::Trickle => "Trickle",
            Phase::Flank => "Flank",
            Phase::Pincer => "Pincer",
            Phase::Bulwark => "Bulwark",
            Phase::Swarm => "Swarm",
            Phase::Crossfire => "Crossfire",
            Phase::Frenzy => "Frenzy",
            Phase::Silence => "Silence",
            Phase::Boss => "Boss",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Every `interval` seconds, spawn `count` of `category` somewhere in `zone`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnRule {
    pub category: EnemyKind,
    pub interval: f32,
    pub count: u32,
    pub zone: Zone,
}

impl SpawnRule {
    pub const fn new(category: EnemyKind, interval: f32, count: u32, zone: Zone) -> Self {
        Self {
            category,
            interval,
            count,
            zone,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhaseWindow {
    pub phase: Phase,
    pub start: f32,
    pub rules: Vec<SpawnRule>,
}

impl PhaseWindow {
    pub fn new(phase: Phase, start: f32, rules: impl Into<Vec<SpawnRule>>) -> Self {
        Self {
            phase,
            start,
            rules: rules.into(),
        }
    }

    /// A window with nothing to spawn.
    pub fn quiet(phase: Phase, start: f32) -> Self {
        Self::new(phase, start, Vec::new())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhaseTimeline {
    windows: Vec<PhaseWindow>,
}

impl PhaseTimeline {
    /// Validate and build a timeline.
    ///
    /// Rejects: no windows, a first window not starting at 0, starts that are not strictly
    /// increasing, a phase appearing twice, and rules with a non-positive interval.
    pub fn new(windows: Vec<PhaseWindow>) -> Result<Self, ConfigError> {
        let Some(first) = windows.first() else {
            return Err(ConfigError::InvalidTimeline("no windows".into()));
        };
        if first.start != 0.0 {
            return Err(ConfigError::InvalidTimeline(format!(
                "first window {} starts at {} instead of 0",
                first.phase, first.start
            )));
        }

        for pair in windows.windows(2) {
            if !(pair[1].start > pair[0].start) {
                return Err(ConfigError::InvalidTimeline(format!(
                    "{} starts at {} which is not after {} at {}",
                    pair[1].phase, pair[1].start, pair[0].phase, pair[0].start
                )));
            }
        }

        for (i, w) in windows.iter().enumerate() {
            if windows[..i].iter().any(|other| other.phase == w.phase) {
                return Err(ConfigError::InvalidTimeline(format!(
                    "{} appears more than once",
                    w.phase
                )));
            }
            if let Some(rule) = w.rules.iter().find(|r| !(r.interval > 0.0)) {
                return Err(ConfigError::InvalidTimeline(format!(
                    "{} rule for {:?} has interval {}",
                    w.phase, rule.category, rule.interval
                )));
            }
        }

        Ok(Self { windows })
    }

    /// The shipped ten-phase curve.
    pub fn standard() -> Self {
        use EnemyKind::*;
        use Zone::*;

        let windows = vec![
            PhaseWindow::new(Phase::Warmup, 0.0, [SpawnRule::new(Drifter, 2.0, 1, TopCenter)]),
            PhaseWindow::new(Phase::Trickle, 30.0, [SpawnRule::new(Drifter, 1.5, 1, TopAny)]),
            PhaseWindow::new(
                Phase::Flank,
                60.0,
                [
                    SpawnRule::new(Drifter, 1.2, 1, TopAny),
                    SpawnRule::new(Dasher, 4.0, 1, EitherSide),
                ],
            ),
            PhaseWindow::new(
                Phase::Pincer,
                90.0,
                [
                    SpawnRule::new(Drifter, 1.0, 2, TopAny),
                    SpawnRule::new(Dasher, 3.0, 2, EitherSide),
                ],
            ),
            PhaseWindow::new(
                Phase::Bulwark,
                120.0,
                [
                    SpawnRule::new(Drifter, 1.0, 2, AllEdges),
                    SpawnRule::new(Tank, 8.0, 1, TopCenter),
                ],
            ),
            PhaseWindow::new(
                Phase::Swarm,
                150.0,
                [
                    SpawnRule::new(Swarmer, 0.5, 3, AllEdges),
                    SpawnRule::new(Dasher, 2.5, 1, EitherSide),
                ],
            ),
            PhaseWindow::new(
                Phase::Crossfire,
                180.0,
                [
                    SpawnRule::new(Drifter, 0.8, 2, AllEdges),
                    SpawnRule::new(Dasher, 2.0, 2, EitherSide),
                    SpawnRule::new(Tank, 6.0, 1, TopAny),
                ],
            ),
            PhaseWindow::new(
                Phase::Frenzy,
                210.0,
                [
                    SpawnRule::new(Swarmer, 0.4, 4, AllEdges),
                    SpawnRule::new(Dasher, 1.5, 2, EitherSide),
                    SpawnRule::new(Tank, 5.0, 1, TopAny),
                    SpawnRule::new(Splitter, 3.0, 1, TopAny),
                ],
            ),
            PhaseWindow::quiet(Phase::Silence, 240.0),
            PhaseWindow::quiet(Phase::Boss, 255.0),
        ];

        // Authored constant data: a failure here is a bug in the table above.
        Self::new(windows).expect("standard timeline must be well formed")
    }

    /// Index of the window containing `time`. Times before zero map to the first window.
    pub fn index_of(&self, time: f32) -> usize {
        self.windows
            .partition_point(|w| w.start <= time)
            .saturating_sub(1)
    }

    #[inline]
    pub fn phase_of(&self, time: f32) -> Phase {
        self.windows[self.index_of(time)].phase
    }

    pub fn window(&self, phase: Phase) -> Option<&PhaseWindow> {
        self.windows.iter().find(|w| w.phase == phase)
    }

    pub fn rules_of(&self, phase: Phase) -> &[SpawnRule] {
        self.window(phase).map(|w| w.rules.as_slice()).unwrap_or(&[])
    }

    /// `[start, end)` of `phase`; the final window ends at infinity.
    pub fn bounds_of(&self, phase: Phase) -> Option<(f32, f32)> {
        let i = self.windows.iter().position(|w| w.phase == phase)?;
        let end = self.windows.get(i + 1).map_or(f32::INFINITY, |next| next.start);
        Some((self.windows[i].start, end))
    }

    #[inline]
    pub fn first_phase(&self) -> Phase {
        self.windows[0].phase
    }

    #[inline]
    pub fn final_phase(&self) -> Phase {
        self.windows[self.windows.len() - 1].phase
    }

    #[inline]
    pub fn windows(&self) -> &[PhaseWindow] {
        &self.windows
    }
}

impl Default for PhaseTimeline {
    fn default() -> Self {
        Self::standard()
    }
}
