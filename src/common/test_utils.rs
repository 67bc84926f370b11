//! Test helpers.
//!
//! Bevy provides `World::run_system_once` (via the `RunSystemOnce` trait) for quickly
//! executing a system in tests without building a full schedule.
//!
//! Systems that use `Commands` enqueue structural changes; we call `world.flush()`
//! after running so queued commands are applied before assertions.
//!
//! Simulation helpers drive the clock and the task runner directly, one tick per
//! call, so timing assertions do not depend on `Time<Fixed>` accumulation.

use bevy::ecs::message::Messages;
use bevy::ecs::system::{IntoSystem, RunSystemOnce};
use bevy::prelude::*;

use crate::common::bounds::PlayBounds;
use crate::common::clock::SimClock;
use crate::common::tunables::GameData;
use crate::plugins::drivers::{MoveArrived, ShotFired};
use crate::plugins::pool::PoolRegistry;
use crate::plugins::tasks::{TaskRunner, run_tasks};

/// Run a system once on the given world, then flush deferred commands.
/// Returns the system output.
pub fn run_system_once<T, Out, Marker>(world: &mut World, system: T) -> Out
where
    T: IntoSystem<(), Out, Marker>,
{
    let out = world.run_system_once(system).expect("system run failed");
    world.flush();
    out
}

/// A bare world with everything pools and drivers need, ticking `step` per tick.
pub fn sim_world(step: f32) -> World {
    let mut world = World::new();
    world.insert_resource(SimClock::with_step(step));
    world.init_resource::<TaskRunner>();
    world.init_resource::<PoolRegistry>();
    world.init_resource::<GameData>();
    world.insert_resource(PlayBounds::default());
    world.init_resource::<Messages<ShotFired>>();
    world.init_resource::<Messages<MoveArrived>>();
    world
}

/// One simulation tick: advance the clock, then step every due task.
pub fn tick(world: &mut World) {
    world.resource_mut::<SimClock>().advance();
    run_tasks(world);
}

pub fn tick_n(world: &mut World, n: usize) {
    for _ in 0..n {
        tick(world);
    }
}

pub fn now(world: &World) -> f64 {
    world.resource::<SimClock>().elapsed()
}

/// Drain every `ShotFired` written so far.
pub fn drain_shots(world: &mut World) -> Vec<ShotFired> {
    world.resource_mut::<Messages<ShotFired>>().drain().collect()
}

pub fn drain_arrivals(world: &mut World) -> Vec<MoveArrived> {
    world.resource_mut::<Messages<MoveArrived>>().drain().collect()
}
