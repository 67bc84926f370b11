//! Behavior drivers: the cooperative tasks entities run under their scopes.
//!
//! - `movement`: interpolated move-to, face-target, projectile travel with
//!   off-bounds self-release.
//! - `fire`: the periodic fire loop and single-volley emission.
//! - `burst`: N shots with a fixed inter-shot delay.
//! - `pattern`: the deterministic spread fan.
//!
//! Every driver reads configuration through [`FireConfig`](crate::common::tunables::FireConfig)
//! at the moment it needs a value.

use bevy::prelude::*;

pub mod burst;
pub mod fire;
pub mod movement;
pub mod pattern;

/// One projectile left a fire point.
#[derive(Message, Clone, Copy, Debug, PartialEq)]
pub struct ShotFired {
    pub shooter: Entity,
    pub projectile: Entity,
    pub rotation: Quat,
    /// Simulation time of the emission.
    pub at: f64,
}

/// A `MoveTo` reached its target.
#[derive(Message, Clone, Copy, Debug, PartialEq)]
pub struct MoveArrived {
    pub entity: Entity,
    pub target: Vec3,
}

pub fn plugin(app: &mut App) {
    app.add_message::<ShotFired>().add_message::<MoveArrived>();
}
