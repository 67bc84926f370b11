//! Integration test harness.
//!
//! Keep integration tests headless:
//! - `MinimalPlugins` provides core ECS runtime.
//! - we then call `volley::game::configure_headless` to install gameplay plugins.
//!
//! `FixedUpdate` normally runs on wall-clock accumulation; tests call
//! [`sim_ticks`] instead so every run sees the same number of ticks.

#![allow(dead_code)]

use bevy::ecs::message::Messages;
use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use volley::common::state::GameState;
use volley::common::tunables::Tunables;
use volley::plugins::drivers::ShotFired;

pub fn app_headless() -> App {
    app_with(Tunables::default())
}

/// Headless app using `tunables` instead of the built-in defaults.
pub fn app_with(tunables: Tunables) -> App {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, StatesPlugin));
    app.insert_resource(tunables);

    volley::game::configure_headless(&mut app);
    app
}

pub fn set_state(app: &mut App, state: GameState) {
    app.world_mut()
        .resource_mut::<NextState<GameState>>()
        .set(state);
    app.update();
}

/// Run the fixed simulation schedule `n` times.
pub fn sim_ticks(app: &mut App, n: usize) {
    for _ in 0..n {
        app.world_mut().run_schedule(FixedUpdate);
    }
}

pub fn take_shots(app: &mut App) -> Vec<ShotFired> {
    app.world_mut()
        .resource_mut::<Messages<ShotFired>>()
        .drain()
        .collect()
}
