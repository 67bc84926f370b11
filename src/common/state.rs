//! Global state machine.

use bevy::prelude::*;

/// `Menu` is the idle state between runs; entering `InGame` starts a run and
/// leaving it walks every character off and resets the run configuration.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, States, Default)]
pub enum GameState {
    #[default]
    Menu,
    InGame,
}
