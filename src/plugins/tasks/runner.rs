//! Cooperative task runner.
//!
//! # Model
//! Every task is a small state machine stepped at most once per simulation
//! tick by the exclusive system [`run_tasks`]. A step runs to completion with
//! full `&mut World` access, so nothing else observes a task half-way through
//! a step. Between steps a task is suspended: either until the next tick
//! ([`Step::Yield`]) or for a number of simulation seconds ([`Step::Sleep`]).
//!
//! # Cancellation
//! Each scheduled task holds a [`CancelSignal`] owned by the entity's
//! [`TaskScopes`](super::TaskScopes). The runner checks it before *every*
//! step, including resumption from a sleep, and drops the task as soon as it
//! is triggered. Cancellation is a normal exit: it is logged at `debug` and
//! never surfaces as an error.
//!
//! # Faults
//! A step returning `Err(TaskFault)` is logged at `error`, its scope signal is
//! triggered (so siblings in the same scope stop too) and the task is dropped.
//! Other entities' tasks keep running.
//!
//! # Iteration
//! The live list is moved out of the resource before stepping. Tasks started
//! during a pass land in the (now empty) resource list and are appended after
//! the pass, so they take their first step on the following tick.

use std::fmt;

use bevy::prelude::*;
use thiserror::Error;

use crate::common::clock::SimClock;
use crate::plugins::pool::PoolError;

use super::signal::CancelSignal;

/// Name of a behavior slot on an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScopeName(pub &'static str);

impl ScopeName {
    pub const MOVE: Self = Self("move");
    pub const FIRE: Self = Self("fire");
    pub const BURST: Self = Self("burst");
}

impl fmt::Display for ScopeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

/// What a task wants after a step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Step {
    /// Resume on the next tick.
    Yield,
    /// Resume once this many simulation seconds have elapsed.
    Sleep(f32),
    /// Finished normally.
    Done,
}

/// How a task left the runner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskExit {
    Completed,
    Cancelled,
    Faulted,
}

/// A driver failure other than cancellation.
#[derive(Debug, Error)]
pub enum TaskFault {
    #[error("entity {0} no longer exists")]
    MissingEntity(Entity),
    #[error("entity {entity} has no {component} component")]
    MissingComponent {
        entity: Entity,
        component: &'static str,
    },
    #[error("resource {0} is not present")]
    MissingResource(&'static str),
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error("{0}")]
    Other(String),
}

/// Execution context handed to [`Task::step`].
pub struct TaskCx<'a> {
    pub world: &'a mut World,
    /// Entity whose scope owns the task.
    pub owner: Entity,
    /// Simulation seconds per tick.
    pub dt: f32,
    /// Simulation time of the current tick.
    pub now: f64,
    signal: &'a CancelSignal,
}

impl<'a> TaskCx<'a> {
    pub fn new(
        world: &'a mut World,
        owner: Entity,
        dt: f32,
        now: f64,
        signal: &'a CancelSignal,
    ) -> Self {
        Self {
            world,
            owner,
            dt,
            now,
            signal,
        }
    }

    /// Has this task's scope been cancelled since the step began?
    ///
    /// Steps that emit several things in a row check this between emissions.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.signal.is_cancelled()
    }

    /// The owner's `Transform`, or a fault if the owner lost it.
    pub fn owner_transform(&self) -> Result<Transform, TaskFault> {
        let entity = self
            .world
            .get_entity(self.owner)
            .map_err(|_| TaskFault::MissingEntity(self.owner))?;
        entity
            .get::<Transform>()
            .copied()
            .ok_or(TaskFault::MissingComponent {
                entity: self.owner,
                component: "Transform",
            })
    }

    pub fn owner_transform_mut(&mut self) -> Result<Mut<'_, Transform>, TaskFault> {
        let owner = self.owner;
        self.world
            .get_mut::<Transform>(owner)
            .ok_or(TaskFault::MissingComponent {
                entity: owner,
                component: "Transform",
            })
    }
}

/// A cooperative unit of work bound to one entity scope.
pub trait Task: Send + Sync + 'static {
    /// Advance by one iteration. Called only while the scope is live.
    fn step(&mut self, cx: &mut TaskCx) -> Result<Step, TaskFault>;

    /// Called exactly once when the task leaves the runner.
    fn finish(&mut self, _exit: TaskExit) {}

    fn label(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

struct ScheduledTask {
    id: TaskId,
    owner: Entity,
    scope: ScopeName,
    signal: CancelSignal,
    wake_at: f64,
    task: Box<dyn Task>,
}

impl ScheduledTask {
    fn retire(mut self, exit: TaskExit) {
        debug!(
            "task {:?} {} on {} ({}) exited: {:?}",
            self.id,
            self.task.label(),
            self.owner,
            self.scope,
            exit
        );
        self.task.finish(exit);
    }
}

/// Every live cooperative task in the app.
#[derive(Resource, Default)]
pub struct TaskRunner {
    live: Vec<ScheduledTask>,
    next_id: u64,
}

impl TaskRunner {
    pub(crate) fn schedule(
        &mut self,
        owner: Entity,
        scope: ScopeName,
        signal: CancelSignal,
        task: Box<dyn Task>,
    ) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.live.push(ScheduledTask {
            id,
            owner,
            scope,
            signal,
            wake_at: f64::NEG_INFINITY,
            task,
        });
        id
    }

    /// Scheduled tasks, including cancelled ones not yet swept.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Tasks for `(owner, scope)` whose signal has not been triggered.
    pub fn live_count(&self, owner: Entity, scope: ScopeName) -> usize {
        self.live
            .iter()
            .filter(|t| t.owner == owner && t.scope == scope && !t.signal.is_cancelled())
            .count()
    }

    /// Cancel and drop every task. Used at teardown.
    pub fn clear(&mut self) {
        for task in self.live.drain(..) {
            task.signal.cancel();
            task.retire(TaskExit::Cancelled);
        }
    }
}

/// Step every due task once. Runs after [`tick_clock`](crate::common::clock::tick_clock).
pub fn run_tasks(world: &mut World) {
    let clock = world.get_resource::<SimClock>().copied().unwrap_or_default();
    let (now, dt) = (clock.elapsed(), clock.step());

    let Some(mut runner) = world.get_resource_mut::<TaskRunner>() else {
        return;
    };
    let batch = std::mem::take(&mut runner.live);
    let mut kept = Vec::with_capacity(batch.len());

    for mut sched in batch {
        if sched.signal.is_cancelled() {
            sched.retire(TaskExit::Cancelled);
            continue;
        }
        if sched.wake_at > now {
            kept.push(sched);
            continue;
        }

        let result = {
            let mut cx = TaskCx::new(world, sched.owner, dt, now, &sched.signal);
            sched.task.step(&mut cx)
        };

        match result {
            Ok(Step::Yield) => kept.push(sched),
            Ok(Step::Sleep(secs)) => {
                sched.wake_at = now + f64::from(secs.max(0.0));
                kept.push(sched);
            }
            Ok(Step::Done) => sched.retire(TaskExit::Completed),
            Err(fault) => {
                error!(
                    "task {} on {} ({}) faulted: {fault}",
                    sched.task.label(),
                    sched.owner,
                    sched.scope
                );
                sched.signal.cancel();
                sched.retire(TaskExit::Faulted);
            }
        }
    }

    let mut runner = world.get_resource_or_init::<TaskRunner>();
    kept.append(&mut runner.live);
    runner.live = kept;
}
