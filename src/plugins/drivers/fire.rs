use std::any::type_name;
use std::marker::PhantomData;

use bevy::ecs::message::Messages;
use bevy::prelude::*;

use crate::common::tunables::FireConfig;
use crate::plugins::character::FirePoint;
use crate::plugins::pool::PoolWorldExt;
use crate::plugins::projectiles::Projectile;
use crate::plugins::tasks::{ScopeName, Step, Task, TaskCx, TaskFault, TaskWorldExt};

use super::ShotFired;
use super::burst::Burst;
use super::movement::Travel;
use super::pattern::spread_offsets;

pub(crate) fn config<C: FireConfig>(world: &World) -> Result<&C, TaskFault> {
    world
        .get_resource::<C>()
        .ok_or(TaskFault::MissingResource(type_name::<C>()))
}

/// World-space pose projectiles leave `shooter` from.
pub fn fire_pose(world: &World, shooter: Entity) -> Result<(Vec3, Quat), TaskFault> {
    let e = world
        .get_entity(shooter)
        .map_err(|_| TaskFault::MissingEntity(shooter))?;
    let tf = e.get::<Transform>().ok_or(TaskFault::MissingComponent {
        entity: shooter,
        component: "Transform",
    })?;
    let offset = e.get::<FirePoint>().map_or(Vec3::ZERO, |fp| fp.0);
    Ok((tf.translation + tf.rotation * offset, tf.rotation))
}

/// Spawn one projectile at `origin` heading along `rotation * direction`.
pub fn emit_shot<C: FireConfig>(
    world: &mut World,
    shooter: Entity,
    origin: Vec3,
    rotation: Quat,
    now: f64,
) -> Result<Entity, TaskFault> {
    let (speed, direction) = {
        let c = config::<C>(world)?;
        (c.projectile_speed(), c.projectile_direction())
    };

    let projectile = world.spawn_pooled::<Projectile>(origin, rotation)?;
    if let Some(mut p) = world.get_mut::<Projectile>(projectile) {
        p.shooter = Some(shooter);
    }
    world.start_task(
        projectile,
        ScopeName::MOVE,
        Travel::new(rotation * direction, speed),
    )?;

    if let Some(mut shots) = world.get_resource_mut::<Messages<ShotFired>>() {
        shots.write(ShotFired {
            shooter,
            projectile,
            rotation,
            at: now,
        });
    }
    Ok(projectile)
}

/// One volley from the task owner: the primary shot, the spread fan, and the
/// delayed double shot when enabled.
pub fn fire_volley<C: FireConfig>(cx: &mut TaskCx) -> Result<(), TaskFault> {
    let (origin, rotation) = fire_pose(cx.world, cx.owner)?;
    let (extra, spread, double_shot, delay) = {
        let c = config::<C>(cx.world)?;
        (
            c.extra_projectiles(),
            c.spread_angle(),
            c.double_shot(),
            c.double_shot_delay(),
        )
    };

    emit_shot::<C>(cx.world, cx.owner, origin, rotation, cx.now)?;
    for offset in spread_offsets(extra, spread) {
        if cx.is_cancelled() {
            return Ok(());
        }
        let fanned = Quat::from_rotation_y(offset.to_radians()) * rotation;
        emit_shot::<C>(cx.world, cx.owner, origin, fanned, cx.now)?;
    }

    if double_shot && !cx.is_cancelled() {
        cx.world.start_task(
            cx.owner,
            ScopeName::BURST,
            Burst::<C>::new(origin, rotation, 1, delay).not_before(cx.now + f64::from(delay)),
        )?;
    }
    Ok(())
}

/// Fire a volley, wait `fire_interval`, repeat until cancelled.
///
/// The interval is re-read every tick. While it is unchanged the next volley
/// is due at `last volley + interval`. When it changes mid-wait the wait
/// restarts from the change: the new interval counts from the previous tick
/// (the latest time the old value was in force), never from before the last
/// volley.
pub struct FireLoop<C: FireConfig> {
    /// `(anchor, interval)`: the next volley is due at `anchor + interval`.
    wait: Option<(f64, f64)>,
    _config: PhantomData<fn() -> C>,
}

impl<C: FireConfig> FireLoop<C> {
    pub fn new() -> Self {
        Self {
            wait: None,
            _config: PhantomData,
        }
    }
}

impl<C: FireConfig> Default for FireLoop<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: FireConfig> Task for FireLoop<C> {
    fn step(&mut self, cx: &mut TaskCx) -> Result<Step, TaskFault> {
        let interval = f64::from(config::<C>(cx.world)?.fire_interval());

        let due = match self.wait {
            None => true,
            Some((anchor, current)) => {
                let anchor = if interval != current {
                    (cx.now - f64::from(cx.dt)).max(anchor)
                } else {
                    anchor
                };
                self.wait = Some((anchor, interval));
                cx.now >= anchor + interval
            }
        };

        if due {
            fire_volley::<C>(cx)?;
            self.wait = Some((cx.now, interval));
        }
        Ok(Step::Yield)
    }
}
