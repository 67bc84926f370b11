//! Feature plugins.

use bevy::prelude::*;

pub mod character;
pub mod core;
pub mod drivers;
pub mod pool;
pub mod powers;
pub mod projectiles;
pub mod session;
pub mod tasks;

/// Register gameplay plugins. Everything here runs headless.
pub fn register_gameplay(app: &mut App) {
    core::plugin(app);
    tasks::plugin(app);
    pool::plugin(app);
    drivers::plugin(app);
    powers::plugin(app);
    session::plugin(app);
}
