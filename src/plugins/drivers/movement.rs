use bevy::ecs::message::Messages;
use bevy::prelude::*;

use crate::common::bounds::PlayBounds;
use crate::plugins::pool::PoolWorldExt;
use crate::plugins::tasks::{CancelSignal, ScopeName, Step, Task, TaskCx, TaskFault, TaskWorldExt};

use super::MoveArrived;

/// What a [`MoveTo`] does once it reaches its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Arrival {
    #[default]
    Hold,
    /// Release the mover back to its pool.
    ReturnToPool,
}

/// Linear translation from the pose at the first step to `target` over `duration`.
#[derive(Debug, Clone)]
pub struct MoveTo {
    target: Vec3,
    duration: f32,
    elapsed: f32,
    from: Option<Vec3>,
    arrival: Arrival,
}

impl MoveTo {
    pub fn new(target: Vec3, duration: f32) -> Self {
        Self {
            target,
            duration,
            elapsed: 0.0,
            from: None,
            arrival: Arrival::Hold,
        }
    }

    pub fn on_arrival(mut self, arrival: Arrival) -> Self {
        self.arrival = arrival;
        self
    }
}

impl Task for MoveTo {
    fn step(&mut self, cx: &mut TaskCx) -> Result<Step, TaskFault> {
        self.elapsed += cx.dt;
        let t = if self.duration > 0.0 {
            (self.elapsed / self.duration).min(1.0)
        } else {
            1.0
        };

        {
            let mut tf = cx.owner_transform_mut()?;
            let from = *self.from.get_or_insert(tf.translation);
            tf.translation = if t < 1.0 {
                from.lerp(self.target, t)
            } else {
                self.target
            };
        }
        if t < 1.0 {
            return Ok(Step::Yield);
        }

        let owner = cx.owner;
        if let Some(mut arrived) = cx.world.get_resource_mut::<Messages<MoveArrived>>() {
            arrived.write(MoveArrived {
                entity: owner,
                target: self.target,
            });
        }
        if self.arrival == Arrival::ReturnToPool {
            cx.world.release_pooled(owner)?;
        }
        Ok(Step::Done)
    }
}

/// Yaw that turns local `+Z` towards `to` on the ground plane.
pub fn yaw_towards(from: Vec3, to: Vec3) -> Option<Quat> {
    let d = Vec2::new(to.x - from.x, to.z - from.z);
    if d.length_squared() < 1e-8 {
        return None;
    }
    Some(Quat::from_rotation_y(d.x.atan2(d.y)))
}

#[inline]
fn ease_in_out_quad(t: f32) -> f32 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

/// Eased yaw towards a point. Runs beside a [`MoveTo`] under the same scope.
#[derive(Debug, Clone)]
pub struct FaceTarget {
    target: Vec3,
    duration: f32,
    elapsed: f32,
    arc: Option<(Quat, Quat)>,
}

impl FaceTarget {
    pub fn new(target: Vec3, duration: f32) -> Self {
        Self {
            target,
            duration,
            elapsed: 0.0,
            arc: None,
        }
    }
}

impl Task for FaceTarget {
    fn step(&mut self, cx: &mut TaskCx) -> Result<Step, TaskFault> {
        self.elapsed += cx.dt;
        let t = if self.duration > 0.0 {
            (self.elapsed / self.duration).min(1.0)
        } else {
            1.0
        };

        let target = self.target;
        let mut tf = cx.owner_transform_mut()?;
        let (from, to) = *self.arc.get_or_insert_with(|| {
            let to = yaw_towards(tf.translation, target).unwrap_or(tf.rotation);
            (tf.rotation, to)
        });
        if t < 1.0 {
            tf.rotation = from.slerp(to, ease_in_out_quad(t));
            Ok(Step::Yield)
        } else {
            tf.rotation = to;
            Ok(Step::Done)
        }
    }
}

/// Constant-velocity flight. Leaving [`PlayBounds`] returns the owner to its pool.
#[derive(Debug, Clone, Copy)]
pub struct Travel {
    velocity: Vec3,
}

impl Travel {
    pub fn new(direction: Vec3, speed: f32) -> Self {
        Self {
            velocity: direction.normalize_or_zero() * speed,
        }
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }
}

impl Task for Travel {
    fn step(&mut self, cx: &mut TaskCx) -> Result<Step, TaskFault> {
        let dt = cx.dt;
        let position = {
            let mut tf = cx.owner_transform_mut()?;
            tf.translation += self.velocity * dt;
            tf.translation
        };

        let inside = cx
            .world
            .get_resource::<PlayBounds>()
            .is_none_or(|bounds| bounds.contains(position));
        if inside {
            return Ok(Step::Yield);
        }

        // Releasing cancels this slot's current scopes, including ours. A
        // later respawn of the same entity gets fresh signals.
        cx.world.release_pooled(cx.owner)?;
        Ok(Step::Done)
    }
}

/// Supersede any movement of `entity` with a move to `target` and a
/// face-target turn, both under the `move` scope so one cancel stops both.
pub fn move_to(
    world: &mut World,
    entity: Entity,
    target: Vec3,
    duration: f32,
    face_duration: f32,
    arrival: Arrival,
) -> Result<CancelSignal, TaskFault> {
    let signal = world.start_task(
        entity,
        ScopeName::MOVE,
        MoveTo::new(target, duration).on_arrival(arrival),
    )?;
    world.attach_task(entity, ScopeName::MOVE, FaceTarget::new(target, face_duration))?;
    Ok(signal)
}
