//! Global state machines.
//!
//! `GameState` bounds a session: entering `InGame` configures the pools and starts the
//! director, leaving it tears everything down. `PauseState` is kept separate so that
//! opening the pause menu never looks like the end of a session.

use bevy::prelude::*;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, States, Default)]
pub enum GameState {
    #[default]
    InGame,
    GameOver,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, States, Default)]
pub enum PauseState {
    #[default]
    Running,
    Paused,
}
