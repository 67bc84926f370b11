use bevy::prelude::*;

use super::runner::{ScopeName, Task, TaskFault, TaskRunner};
use super::signal::CancelSignal;

/// Named cancellation scopes owned by one entity.
///
/// Invariant: at most one live signal per name. `start` triggers the previous
/// signal before the new task is scheduled, and the runner checks signals in
/// schedule order, so a superseded task always observes its cancellation
/// before its replacement takes a step.
///
/// Dropping the component (entity despawn, component removal) triggers every
/// signal.
#[derive(Component, Debug, Default)]
pub struct TaskScopes {
    slots: Vec<(ScopeName, CancelSignal)>,
}

impl TaskScopes {
    pub fn signal(&self, name: ScopeName) -> Option<&CancelSignal> {
        self.slots.iter().find(|(n, _)| *n == name).map(|(_, s)| s)
    }

    pub fn is_live(&self, name: ScopeName) -> bool {
        self.signal(name).is_some_and(|s| !s.is_cancelled())
    }

    /// Supersede whatever runs under `name` and schedule `work` under a fresh signal.
    pub fn start<T: Task>(
        &mut self,
        runner: &mut TaskRunner,
        owner: Entity,
        name: ScopeName,
        work: T,
    ) -> CancelSignal {
        let signal = CancelSignal::new();
        match self.slots.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => {
                slot.cancel();
                *slot = signal.clone();
            }
            None => self.slots.push((name, signal.clone())),
        }
        runner.schedule(owner, name, signal.clone(), Box::new(work));
        signal
    }

    /// Schedule `work` alongside the task already live under `name`, sharing
    /// its signal. Starts a fresh scope when nothing is live.
    pub fn attach<T: Task>(
        &mut self,
        runner: &mut TaskRunner,
        owner: Entity,
        name: ScopeName,
        work: T,
    ) -> CancelSignal {
        match self.signal(name).filter(|s| !s.is_cancelled()).cloned() {
            Some(signal) => {
                runner.schedule(owner, name, signal.clone(), Box::new(work));
                signal
            }
            None => self.start(runner, owner, name, work),
        }
    }

    /// Trigger the signal for `name`. Returns whether a live signal was triggered.
    pub fn cancel(&mut self, name: ScopeName) -> bool {
        match self.signal(name) {
            Some(signal) if !signal.is_cancelled() => {
                signal.cancel();
                true
            }
            _ => false,
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, signal) in &self.slots {
            signal.cancel();
        }
    }
}

impl Drop for TaskScopes {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

/// Scope operations on a `World`, for exclusive systems and task steps.
pub trait TaskWorldExt {
    fn start_task<T: Task>(
        &mut self,
        owner: Entity,
        name: ScopeName,
        work: T,
    ) -> Result<CancelSignal, TaskFault>;

    fn attach_task<T: Task>(
        &mut self,
        owner: Entity,
        name: ScopeName,
        work: T,
    ) -> Result<CancelSignal, TaskFault>;

    /// No-op (returns `false`) when the entity or scope is missing.
    fn cancel_task(&mut self, owner: Entity, name: ScopeName) -> bool;

    fn cancel_all_tasks(&mut self, owner: Entity);
}

enum Mode {
    Start,
    Attach,
}

fn schedule<T: Task>(
    world: &mut World,
    owner: Entity,
    name: ScopeName,
    work: T,
    mode: Mode,
) -> Result<CancelSignal, TaskFault> {
    world.init_resource::<TaskRunner>();
    world.resource_scope(|world, mut runner: Mut<TaskRunner>| {
        let mut entity = world
            .get_entity_mut(owner)
            .map_err(|_| TaskFault::MissingEntity(owner))?;
        if !entity.contains::<TaskScopes>() {
            entity.insert(TaskScopes::default());
        }
        let mut scopes = entity
            .get_mut::<TaskScopes>()
            .ok_or(TaskFault::MissingComponent {
                entity: owner,
                component: "TaskScopes",
            })?;
        Ok(match mode {
            Mode::Start => scopes.start(&mut runner, owner, name, work),
            Mode::Attach => scopes.attach(&mut runner, owner, name, work),
        })
    })
}

impl TaskWorldExt for World {
    fn start_task<T: Task>(
        &mut self,
        owner: Entity,
        name: ScopeName,
        work: T,
    ) -> Result<CancelSignal, TaskFault> {
        schedule(self, owner, name, work, Mode::Start)
    }

    fn attach_task<T: Task>(
        &mut self,
        owner: Entity,
        name: ScopeName,
        work: T,
    ) -> Result<CancelSignal, TaskFault> {
        schedule(self, owner, name, work, Mode::Attach)
    }

    fn cancel_task(&mut self, owner: Entity, name: ScopeName) -> bool {
        self.get_mut::<TaskScopes>(owner)
            .is_some_and(|mut scopes| scopes.cancel(name))
    }

    fn cancel_all_tasks(&mut self, owner: Entity) {
        if let Some(mut scopes) = self.get_mut::<TaskScopes>(owner) {
            scopes.cancel_all();
        }
    }
}
