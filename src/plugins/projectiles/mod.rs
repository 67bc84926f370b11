//! Projectiles: the pooled kind every fire driver emits.
//!
//! # Data flow
//! ```text
//!   FireLoop / Burst step
//!     └─ emit_shot ──► PoolRegistry::spawn::<Projectile>  (pop or build)
//!                  └─► start Travel under the projectile's `move` scope
//!                  └─► ShotFired message
//!
//!   Travel step (every tick)
//!     └─ translation += velocity * dt
//!     └─ outside PlayBounds? ──► release to pool (cancels `move`) ──► Done
//! ```
//! The projectile pool itself is created by the session at startup.

mod components;
mod pool;

pub use components::Projectile;
pub use pool::{active_projectiles, projectile_factory, release_active_projectiles};
