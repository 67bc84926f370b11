//! Deferred release for systems that only hold `Commands`.

use bevy::prelude::*;

use super::registry::PoolWorldExt;

/// Queue `entity` for return to its pool at the next command flush.
///
/// Failures (double release, foreign entity) are logged rather than panicking,
/// since the entity may legitimately have been released earlier in the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReturnToPool(pub Entity);

impl Command for ReturnToPool {
    fn apply(self, world: &mut World) {
        if let Err(err) = world.release_pooled(self.0) {
            warn!("deferred return of {} failed: {err}", self.0);
        }
    }
}
