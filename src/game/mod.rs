//! Game composition root.
//!
//! Provides two public configuration functions:
//! - `configure_headless`: gameplay plugins on top of whatever the caller
//!   installed (tests use `MinimalPlugins` + `StatesPlugin`).
//! - `run`: a self-driving headless app that loads tunables, enters a run and
//!   ticks at the configured simulation step.

use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::state::app::StatesPlugin;

use crate::common::clock::SimClock;
use crate::common::state::GameState;
use crate::common::tunables::Tunables;
use crate::plugins;

/// Environment variable naming a TOML file of tunables.
pub const TUNABLES_ENV: &str = "VOLLEY_TUNABLES";

pub fn run() {
    let mut app = App::new();
    app.add_plugins(LogPlugin::default());

    let tunables = load_tunables();
    let step = Duration::from_secs_f32(SimClock::with_step(tunables.sim_step).step());
    app.add_plugins((
        MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(step)),
        StatesPlugin,
    ))
    .insert_resource(tunables)
    .add_plugins(configure_headless)
    .add_systems(Startup, enter_run)
    .run();
}

/// Tunables from `$VOLLEY_TUNABLES`, falling back to defaults.
fn load_tunables() -> Tunables {
    let Ok(path) = std::env::var(TUNABLES_ENV) else {
        return Tunables::default();
    };
    match Tunables::load(&path) {
        Ok(t) => {
            info!("loaded tunables from {path}");
            t
        }
        Err(err) => {
            warn!("{err}; using default tunables");
            Tunables::default()
        }
    }
}

fn enter_run(mut next: ResMut<NextState<GameState>>) {
    next.set(GameState::InGame);
}

/// Headless configuration for integration tests.
///
/// Notes:
/// - Do NOT add DefaultPlugins.
/// - The caller provides `StatesPlugin`.
pub fn configure_headless(app: &mut App) {
    configure_game(app);
}

/// Configuration shared by every app flavour.
fn configure_game(app: &mut App) {
    app.init_state::<GameState>();
    plugins::register_gameplay(app);
}
