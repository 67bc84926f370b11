use std::marker::PhantomData;

use bevy::prelude::*;

use crate::common::tunables::FireConfig;
use crate::plugins::tasks::{Step, Task, TaskCx, TaskFault};

use super::fire::emit_shot;

/// `count` shots from a fixed pose with `delay` seconds between them.
///
/// Each resumption is a cancellation point, so a cancelled burst stops before
/// its next shot and never part-way through one.
pub struct Burst<C: FireConfig> {
    origin: Vec3,
    rotation: Quat,
    remaining: u32,
    delay: f32,
    not_before: Option<f64>,
    _config: PhantomData<fn() -> C>,
}

impl<C: FireConfig> Burst<C> {
    pub fn new(origin: Vec3, rotation: Quat, count: u32, delay: f32) -> Self {
        Self {
            origin,
            rotation,
            remaining: count,
            delay: delay.max(0.0),
            not_before: None,
            _config: PhantomData,
        }
    }

    /// Hold the first shot until simulation time `at`.
    pub fn not_before(mut self, at: f64) -> Self {
        self.not_before = Some(at);
        self
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }
}

impl<C: FireConfig> Task for Burst<C> {
    fn step(&mut self, cx: &mut TaskCx) -> Result<Step, TaskFault> {
        if let Some(at) = self.not_before.take() {
            if cx.now < at {
                return Ok(Step::Sleep((at - cx.now) as f32));
            }
        }
        if self.remaining == 0 {
            return Ok(Step::Done);
        }

        emit_shot::<C>(cx.world, cx.owner, self.origin, self.rotation, cx.now)?;
        self.remaining -= 1;

        Ok(if self.remaining == 0 {
            Step::Done
        } else {
            Step::Sleep(self.delay)
        })
    }
}
