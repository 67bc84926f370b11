//! Core plugin: shared resources and global settings.
//!
//! Inserts `Tunables` (unless the app already carries one, e.g. loaded from a
//! file) and derives the run config, simulation clock, play bounds and the
//! fixed timestep from it.

use bevy::prelude::*;

use crate::common::clock::SimClock;
use crate::common::tunables::{GameData, Tunables};

pub fn plugin(app: &mut App) {
    let tunables = app
        .world()
        .get_resource::<Tunables>()
        .cloned()
        .unwrap_or_default();

    let clock = SimClock::with_step(tunables.sim_step);
    app.insert_resource(GameData::from_tunables(&tunables))
        .insert_resource(tunables.clone())
        .insert_resource(clock)
        .insert_resource(tunables.bounds())
        .insert_resource(Time::<Fixed>::from_seconds(f64::from(clock.step())));
}
