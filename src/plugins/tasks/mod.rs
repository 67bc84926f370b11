//! Scoped cooperative tasks.
//!
//! Every behavior an entity runs over time (moving, firing, bursts) is a
//! [`Task`] scheduled under one of the entity's named [`TaskScopes`]. Starting
//! a task under a name supersedes whatever ran there before; releasing an
//! entity to its pool cancels every scope it owns.
//!
//! ```text
//!   FixedUpdate (one tick)
//! ┌──────────────────────────────────────────────────────────────┐
//! │ tick_clock   SimClock.elapsed += step                        │
//! │ run_tasks    for each scheduled task (start order):          │
//! │                signal cancelled? -> drop (normal exit)       │
//! │                asleep?           -> keep                     │
//! │                step(world)       -> Yield | Sleep | Done     │
//! │                                  -> Err: log, cancel scope   │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use bevy::prelude::*;

use crate::common::clock::{SimClock, tick_clock};

mod runner;
mod scope;
mod signal;

pub use runner::{ScopeName, Step, Task, TaskCx, TaskExit, TaskFault, TaskId, TaskRunner, run_tasks};
pub use scope::{TaskScopes, TaskWorldExt};
pub use signal::CancelSignal;

/// Ordering for the per-tick simulation systems.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimSet {
    Clock,
    Tasks,
}

pub fn plugin(app: &mut App) {
    app.init_resource::<SimClock>()
        .init_resource::<TaskRunner>()
        .configure_sets(FixedUpdate, (SimSet::Clock, SimSet::Tasks).chain())
        .add_systems(FixedUpdate, tick_clock.in_set(SimSet::Clock))
        .add_systems(FixedUpdate, run_tasks.in_set(SimSet::Tasks));
}

#[cfg(test)]
mod tests;
