use std::sync::{Arc, Mutex};

use bevy::prelude::*;

use crate::common::clock::SimClock;
use crate::common::test_utils::{sim_world, tick, tick_n};

use super::*;

type Log = Arc<Mutex<Vec<String>>>;

/// Records each step as `"{tag}:{n}"` and each exit as `"{tag}:{exit:?}"`.
struct Recorder {
    tag: &'static str,
    log: Log,
    steps: u32,
    plan: Vec<Step>,
}

impl Recorder {
    fn new(tag: &'static str, log: &Log) -> Self {
        Self {
            tag,
            log: log.clone(),
            steps: 0,
            plan: Vec::new(),
        }
    }

    /// Return these steps in order, then `Yield` forever.
    fn with_plan(mut self, plan: impl IntoIterator<Item = Step>) -> Self {
        self.plan = plan.into_iter().collect();
        self.plan.reverse();
        self
    }
}

impl Task for Recorder {
    fn step(&mut self, _cx: &mut TaskCx) -> Result<Step, TaskFault> {
        self.steps += 1;
        self.log
            .lock()
            .unwrap()
            .push(format!("{}:{}", self.tag, self.steps));
        Ok(self.plan.pop().unwrap_or(Step::Yield))
    }

    fn finish(&mut self, exit: TaskExit) {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}:{exit:?}", self.tag));
    }
}

struct Faulty;

impl Task for Faulty {
    fn step(&mut self, _cx: &mut TaskCx) -> Result<Step, TaskFault> {
        Err(TaskFault::Other("boom".into()))
    }
}

fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

const S: ScopeName = ScopeName("test");
const OTHER: ScopeName = ScopeName("other");

#[test]
fn started_task_steps_on_next_tick() {
    let mut world = sim_world(0.1);
    let log = Log::default();
    let e = world.spawn_empty().id();

    world.start_task(e, S, Recorder::new("a", &log)).unwrap();
    assert!(entries(&log).is_empty());

    tick_n(&mut world, 2);
    assert_eq!(entries(&log), ["a:1", "a:2"]);
}

#[test]
fn restart_cancels_previous_before_new_steps() {
    let mut world = sim_world(0.1);
    let log = Log::default();
    let e = world.spawn_empty().id();

    let first = world.start_task(e, S, Recorder::new("a", &log)).unwrap();
    tick(&mut world);
    let second = world.start_task(e, S, Recorder::new("b", &log)).unwrap();

    assert!(first.is_cancelled());
    assert!(!second.is_cancelled());
    assert!(!first.same_as(&second));

    tick(&mut world);
    // `a` never takes another step; its exit comes before `b` runs.
    assert_eq!(entries(&log), ["a:1", "a:Cancelled", "b:1"]);
    assert_eq!(world.resource::<TaskRunner>().live_count(e, S), 1);
}

#[test]
fn cancel_stops_only_that_scope() {
    let mut world = sim_world(0.1);
    let log = Log::default();
    let e = world.spawn_empty().id();

    world.start_task(e, S, Recorder::new("a", &log)).unwrap();
    world.start_task(e, OTHER, Recorder::new("b", &log)).unwrap();
    tick(&mut world);

    assert!(world.cancel_task(e, S));
    assert!(!world.cancel_task(e, S), "second cancel is a no-op");
    tick(&mut world);

    assert_eq!(entries(&log), ["a:1", "b:1", "a:Cancelled", "b:2"]);
    let scopes = world.get::<TaskScopes>(e).unwrap();
    assert!(!scopes.is_live(S));
    assert!(scopes.is_live(OTHER));
}

#[test]
fn cancel_on_missing_entity_or_scope_is_noop() {
    let mut world = sim_world(0.1);
    let e = world.spawn_empty().id();
    assert!(!world.cancel_task(e, S));

    world.despawn(e);
    assert!(!world.cancel_task(e, S));
    world.cancel_all_tasks(e);
}

#[test]
fn start_on_missing_entity_faults() {
    let mut world = sim_world(0.1);
    let log = Log::default();
    let e = world.spawn_empty().id();
    world.despawn(e);

    let err = world.start_task(e, S, Recorder::new("a", &log)).unwrap_err();
    assert!(matches!(err, TaskFault::MissingEntity(x) if x == e));
    assert!(world.resource::<TaskRunner>().is_empty());
}

#[test]
fn cancel_all_stops_every_scope() {
    let mut world = sim_world(0.1);
    let log = Log::default();
    let e = world.spawn_empty().id();

    let a = world.start_task(e, S, Recorder::new("a", &log)).unwrap();
    let b = world.start_task(e, OTHER, Recorder::new("b", &log)).unwrap();
    world.cancel_all_tasks(e);
    assert!(a.is_cancelled() && b.is_cancelled());

    tick(&mut world);
    assert_eq!(entries(&log), ["a:Cancelled", "b:Cancelled"]);
    assert!(world.resource::<TaskRunner>().is_empty());
}

#[test]
fn despawn_cancels_scopes() {
    let mut world = sim_world(0.1);
    let log = Log::default();
    let e = world.spawn_empty().id();

    let signal = world.start_task(e, S, Recorder::new("a", &log)).unwrap();
    tick(&mut world);
    world.despawn(e);
    assert!(signal.is_cancelled());

    tick(&mut world);
    assert_eq!(entries(&log), ["a:1", "a:Cancelled"]);
}

#[test]
fn attach_shares_the_live_signal() {
    let mut world = sim_world(0.1);
    let log = Log::default();
    let e = world.spawn_empty().id();

    let a = world.start_task(e, S, Recorder::new("a", &log)).unwrap();
    let b = world.attach_task(e, S, Recorder::new("b", &log)).unwrap();
    assert!(a.same_as(&b));
    assert_eq!(world.resource::<TaskRunner>().live_count(e, S), 2);

    tick(&mut world);
    world.cancel_task(e, S);
    tick(&mut world);
    assert_eq!(
        entries(&log),
        ["a:1", "b:1", "a:Cancelled", "b:Cancelled"]
    );
}

#[test]
fn attach_without_live_scope_starts_fresh() {
    let mut world = sim_world(0.1);
    let log = Log::default();
    let e = world.spawn_empty().id();

    let old = world.start_task(e, S, Recorder::new("a", &log)).unwrap();
    world.cancel_task(e, S);
    let fresh = world.attach_task(e, S, Recorder::new("b", &log)).unwrap();
    assert!(!fresh.same_as(&old));
    assert!(!fresh.is_cancelled());
}

#[test]
fn fault_cancels_scope_and_spares_other_entities() {
    let mut world = sim_world(0.1);
    let log = Log::default();
    let bad = world.spawn_empty().id();
    let good = world.spawn_empty().id();

    let sibling = world.start_task(bad, S, Recorder::new("sib", &log)).unwrap();
    world.attach_task(bad, S, Faulty).unwrap();
    world.start_task(good, S, Recorder::new("good", &log)).unwrap();

    tick(&mut world);
    assert!(sibling.is_cancelled());
    tick(&mut world);

    assert_eq!(
        entries(&log),
        ["sib:1", "good:1", "sib:Cancelled", "good:2"]
    );
    assert_eq!(world.resource::<TaskRunner>().live_count(good, S), 1);
}

#[test]
fn sleep_resumes_after_simulated_time() {
    let mut world = sim_world(0.1);
    let log = Log::default();
    let e = world.spawn_empty().id();

    world
        .start_task(
            e,
            S,
            Recorder::new("a", &log).with_plan([Step::Sleep(0.25), Step::Done]),
        )
        .unwrap();

    tick(&mut world); // t=0.1: step 1, sleep until 0.35
    tick_n(&mut world, 2); // t=0.2, 0.3: asleep
    assert_eq!(entries(&log), ["a:1"]);

    tick(&mut world); // t=0.4
    assert_eq!(entries(&log), ["a:1", "a:2", "a:Completed"]);
}

#[test]
fn cancelled_while_sleeping_never_resumes() {
    let mut world = sim_world(0.1);
    let log = Log::default();
    let e = world.spawn_empty().id();

    world
        .start_task(e, S, Recorder::new("a", &log).with_plan([Step::Sleep(10.0)]))
        .unwrap();
    tick(&mut world);
    world.cancel_task(e, S);
    tick(&mut world);

    assert_eq!(entries(&log), ["a:1", "a:Cancelled"]);
    assert!(world.resource::<TaskRunner>().is_empty());
}

/// Starts a sibling scope from inside its own step.
struct Spawner {
    log: Log,
    done: bool,
}

impl Task for Spawner {
    fn step(&mut self, cx: &mut TaskCx) -> Result<Step, TaskFault> {
        if !self.done {
            self.done = true;
            cx.world
                .start_task(cx.owner, OTHER, Recorder::new("child", &self.log))?;
        }
        Ok(Step::Done)
    }
}

#[test]
fn tasks_started_during_a_pass_wait_for_next_tick() {
    let mut world = sim_world(0.1);
    let log = Log::default();
    let e = world.spawn_empty().id();

    world
        .start_task(
            e,
            S,
            Spawner {
                log: log.clone(),
                done: false,
            },
        )
        .unwrap();

    tick(&mut world);
    assert!(entries(&log).is_empty());
    assert_eq!(world.resource::<TaskRunner>().len(), 1);

    tick(&mut world);
    assert_eq!(entries(&log), ["child:1"]);
}

#[test]
fn clear_cancels_everything() {
    let mut world = sim_world(0.1);
    let log = Log::default();
    let e = world.spawn_empty().id();

    let signal = world.start_task(e, S, Recorder::new("a", &log)).unwrap();
    world.resource_mut::<TaskRunner>().clear();

    assert!(signal.is_cancelled());
    assert_eq!(entries(&log), ["a:Cancelled"]);
}

#[test]
fn plugin_steps_tasks_in_fixed_update() {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins).add_plugins(plugin);
    let log = Log::default();
    let e = app.world_mut().spawn_empty().id();
    app.world_mut()
        .start_task(e, S, Recorder::new("a", &log))
        .unwrap();

    for _ in 0..3 {
        app.world_mut().run_schedule(FixedUpdate);
    }
    assert_eq!(app.world().resource::<SimClock>().tick(), 3);
    assert_eq!(entries(&log), ["a:1", "a:2", "a:3"]);
}
