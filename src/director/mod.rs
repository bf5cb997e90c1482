//! Phase timeline scheduler.
//!
//! - `timeline`: ordered phase windows and their spawn rules.
//! - `zones`: where things appear, resolved against the playfield.
//! - `scheduler`: the clock, the phase reaction and the rule firing.

pub mod scheduler;
pub mod timeline;
pub mod zones;

pub use scheduler::{format_clock, DirectorEvent, FrenzyTuning, SpawnDirector, TickReport};
pub use timeline::{Phase, PhaseTimeline, PhaseWindow, SpawnRule};
pub use zones::{PlayfieldBounds, Zone};
