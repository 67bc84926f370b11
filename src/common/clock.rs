//! Simulation clock.
//!
//! Every cooperative task measures time in simulation units taken from this
//! resource, never from wall-clock time. One call to [`SimClock::advance`] is
//! one tick; the task runner steps every live task once per tick.

use bevy::prelude::*;

/// Fixed-step simulation time.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct SimClock {
    step: f32,
    elapsed: f64,
    tick: u64,
}

impl SimClock {
    pub const DEFAULT_STEP: f32 = 1.0 / 60.0;

    /// A clock at time zero advancing by `step` per tick.
    ///
    /// Non-positive or non-finite steps fall back to [`Self::DEFAULT_STEP`].
    pub fn with_step(step: f32) -> Self {
        let step = if step.is_finite() && step > 0.0 {
            step
        } else {
            Self::DEFAULT_STEP
        };
        Self {
            step,
            elapsed: 0.0,
            tick: 0,
        }
    }

    #[inline]
    pub fn step(&self) -> f32 {
        self.step
    }

    #[inline]
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    #[inline]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    #[inline]
    pub fn advance(&mut self) {
        self.tick += 1;
        self.elapsed += f64::from(self.step);
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::with_step(Self::DEFAULT_STEP)
    }
}

/// Advance the simulation clock by one step. Runs at the head of `FixedUpdate`.
pub fn tick_clock(mut clock: ResMut<SimClock>) {
    clock.advance();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_accumulates_fixed_steps() {
        let mut clock = SimClock::with_step(0.5);
        clock.advance();
        clock.advance();
        clock.advance();
        assert_eq!(clock.tick(), 3);
        assert_eq!(clock.elapsed(), 1.5);
    }

    #[test]
    fn invalid_step_falls_back_to_default() {
        assert_eq!(SimClock::with_step(0.0).step(), SimClock::DEFAULT_STEP);
        assert_eq!(SimClock::with_step(f32::NAN).step(), SimClock::DEFAULT_STEP);
    }
}
