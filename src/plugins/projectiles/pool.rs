use bevy::prelude::*;

use crate::plugins::pool::{PoolWorldExt, Pooled};

use super::components::Projectile;

/// Build one inactive projectile. Used as the pool factory.
pub fn projectile_factory(world: &mut World) -> Entity {
    world
        .spawn((
            Name::new("Projectile(Pooled)"),
            Projectile::default(),
            Transform::default(),
            Visibility::Hidden,
        ))
        .id()
}

/// Projectiles currently handed out by their pool.
pub fn active_projectiles(world: &mut World) -> Vec<Entity> {
    let mut q = world.query_filtered::<(Entity, &Pooled), With<Projectile>>();
    q.iter(world)
        .filter(|(_, slot)| slot.is_active())
        .map(|(e, _)| e)
        .collect()
}

/// Return every active projectile to the pool.
///
/// Works on a snapshot, so releases never mutate what is being iterated.
pub fn release_active_projectiles(world: &mut World) -> usize {
    let active = active_projectiles(world);
    let mut released = 0;
    for e in active {
        match world.release_pooled(e) {
            Ok(()) => released += 1,
            Err(err) => warn!("could not recall projectile {e}: {err}"),
        }
    }
    released
}
