//! Object pools keyed by entity kind.
//!
//! # Lifecycle of a member
//! ```text
//!   create ──► construct ──► on_despawned ──► [free queue] ◄──────────┐
//!                                                 │                  │
//!   spawn  ──► pop front (or construct) ──► set pose ──► on_spawned  │
//!                                                 │                  │
//!   release ─► cancel all TaskScopes ──► on_despawned ──► push back ─┘
//! ```
//!
//! Pools grow without bound: an empty queue makes `spawn` build a new member
//! through the kind's factory. Errors are returned to the caller
//! synchronously and never leave the queue half-updated.

use bevy::prelude::*;

mod commands;
mod components;
mod registry;

pub use commands::ReturnToPool;
pub use components::{KindId, KindTag, Poolable, Pooled, RegistryId, SlotState};
pub use registry::{PoolError, PoolRegistry, PoolStats, PoolWorldExt};

pub fn plugin(app: &mut App) {
    app.init_resource::<PoolRegistry>();
}
