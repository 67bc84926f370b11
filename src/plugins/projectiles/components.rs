use bevy::prelude::*;

use crate::plugins::pool::Poolable;

/// Pooled projectile. Its flight is a `Travel` task under the `move` scope.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Projectile {
    /// Who fired the current flight. Cleared on release.
    pub shooter: Option<Entity>,
}

impl Poolable for Projectile {
    fn on_despawned(entity: &mut EntityWorldMut) {
        entity.insert((Visibility::Hidden, Projectile::default()));
    }
}
