//! Characters: pooled shooters.
//!
//! A character owns three scopes: `move` (walk + turn), `fire` (the fire
//! loop) and `burst` (the delayed double shot). Releasing the character
//! cancels all three.

use bevy::prelude::*;

use crate::common::tunables::{GameData, Tunables};
use crate::plugins::drivers::fire::FireLoop;
use crate::plugins::drivers::movement::{Arrival, move_to};
use crate::plugins::pool::Poolable;
use crate::plugins::tasks::{CancelSignal, ScopeName, TaskFault, TaskWorldExt};

#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Character;

impl Poolable for Character {}

/// Muzzle offset in the character's local frame.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct FirePoint(pub Vec3);

impl Default for FirePoint {
    fn default() -> Self {
        Self(Vec3::new(0.0, 1.0, 0.6))
    }
}

/// Build one inactive character. Used as the pool factory.
pub fn character_factory(world: &mut World) -> Entity {
    world
        .spawn((
            Name::new("Character(Pooled)"),
            Character,
            FirePoint::default(),
            Transform::default(),
            Visibility::Hidden,
        ))
        .id()
}

/// (Re)start the fire loop, superseding any running one.
pub fn start_firing(world: &mut World, character: Entity) -> Result<CancelSignal, TaskFault> {
    world.start_task(character, ScopeName::FIRE, FireLoop::<GameData>::new())
}

/// Stop the fire loop and any pending double shot.
pub fn stop_firing(world: &mut World, character: Entity) {
    world.cancel_task(character, ScopeName::FIRE);
    world.cancel_task(character, ScopeName::BURST);
}

/// Walk to `target` with the configured move and turn durations.
pub fn walk_to(
    world: &mut World,
    character: Entity,
    target: Vec3,
    arrival: Arrival,
) -> Result<CancelSignal, TaskFault> {
    let (duration, face) = world
        .get_resource::<Tunables>()
        .map_or((0.5, 0.3), |t| (t.move_duration, t.face_duration));
    move_to(world, character, target, duration, face, arrival)
}
