//! Session orchestration: the layer that drives pools and tasks for a run.
//!
//! ```text
//!   Startup              create Character + Projectile pools under containers
//!   OnEnter(InGame)      recall projectiles, spawn character at spawn point,
//!                        walk it to the centre
//!   Update (InGame)      first MoveArrived of a session character
//!                          -> start fire loops for every session character
//!   OnExit(InGame)       stop firing, walk every character back,
//!                        release on arrival, reset run config + powers
//! ```

use bevy::ecs::message::MessageReader;
use bevy::prelude::*;

use crate::common::state::GameState;
use crate::common::tunables::{GameData, Tunables};
use crate::plugins::character::{Character, character_factory, start_firing, stop_firing, walk_to};
use crate::plugins::drivers::MoveArrived;
use crate::plugins::drivers::movement::Arrival;
use crate::plugins::pool::{PoolError, PoolWorldExt};
use crate::plugins::powers::ActivePowers;
use crate::plugins::projectiles::{Projectile, projectile_factory, release_active_projectiles};

/// Characters spawned for the current run.
#[derive(Resource, Debug, Default)]
pub struct Session {
    characters: Vec<Entity>,
    firing: bool,
}

impl Session {
    pub fn characters(&self) -> &[Entity] {
        &self.characters
    }

    pub fn is_firing(&self) -> bool {
        self.firing
    }
}

/// Parent entities the pools attach their members to.
#[derive(Resource, Debug, Clone, Copy)]
pub struct PoolContainers {
    pub characters: Entity,
    pub projectiles: Entity,
}

pub fn plugin(app: &mut App) {
    app.init_resource::<Session>()
        .add_systems(Startup, create_pools)
        .add_systems(OnEnter(GameState::InGame), begin_run)
        .add_systems(OnExit(GameState::InGame), end_run)
        .add_systems(
            Update,
            start_firing_on_arrival.run_if(in_state(GameState::InGame)),
        );
}

fn tunables(world: &World) -> Tunables {
    world.get_resource::<Tunables>().cloned().unwrap_or_default()
}

pub fn create_pools(world: &mut World) {
    let t = tunables(world);

    let characters = world
        .spawn((Name::new("Characters"), Transform::default(), Visibility::default()))
        .id();
    let projectiles = world
        .spawn((Name::new("Projectiles"), Transform::default(), Visibility::default()))
        .id();

    if let Err(err) =
        world.create_pool::<Character, _>(character_factory, t.character_pool_size, Some(characters))
    {
        error!("character pool: {err}");
    }
    if let Err(err) = world.create_pool::<Projectile, _>(
        projectile_factory,
        t.projectile_pool_size,
        Some(projectiles),
    ) {
        error!("projectile pool: {err}");
    }

    world.insert_resource(PoolContainers {
        characters,
        projectiles,
    });
}

/// Spawn a character and track it in the session.
pub fn spawn_character(world: &mut World, at: Vec3, rotation: Quat) -> Result<Entity, PoolError> {
    let character = world.spawn_pooled::<Character>(at, rotation)?;
    world
        .get_resource_or_init::<Session>()
        .characters
        .push(character);
    Ok(character)
}

pub fn begin_run(world: &mut World) {
    let recalled = release_active_projectiles(world);
    if recalled > 0 {
        debug!("recalled {recalled} projectiles before the run");
    }

    let t = tunables(world);
    let character = match spawn_character(world, t.spawn_point(), t.character_rotation()) {
        Ok(c) => c,
        Err(err) => {
            error!("could not spawn the run character: {err}");
            return;
        }
    };
    if let Err(err) = walk_to(world, character, t.center_point(), Arrival::Hold) {
        error!("could not walk {character} to the centre: {err}");
    }
    info!("run started with {character}");
}

/// Start every session character firing once the first one reaches its post.
pub fn start_firing_on_arrival(
    mut arrivals: MessageReader<MoveArrived>,
    mut session: ResMut<Session>,
    mut commands: Commands,
) {
    for arrived in arrivals.read() {
        if session.firing || !session.characters.contains(&arrived.entity) {
            continue;
        }
        session.firing = true;
        let characters = session.characters.clone();
        commands.queue(move |world: &mut World| {
            release_active_projectiles(world);
            for character in characters {
                if let Err(err) = start_firing(world, character) {
                    warn!("could not start firing for {character}: {err}");
                }
            }
        });
    }
}

/// Spawn the one extra character a run may have.
///
/// Returns `None` if this run already duplicated.
pub fn duplicate_character(world: &mut World) -> Option<Entity> {
    let first = world
        .get_resource_mut::<GameData>()
        .is_some_and(|mut data| data.mark_character_duplicated());
    if !first {
        return None;
    }

    let t = tunables(world);
    let character = match spawn_character(world, t.duplicate_point(), t.character_rotation()) {
        Ok(c) => c,
        Err(err) => {
            error!("could not duplicate the character: {err}");
            return None;
        }
    };
    let firing = world.get_resource::<Session>().is_some_and(Session::is_firing);
    if firing {
        if let Err(err) = start_firing(world, character) {
            warn!("could not start firing for {character}: {err}");
        }
    }
    Some(character)
}

pub fn end_run(world: &mut World) {
    let characters = {
        let mut session = world.get_resource_or_init::<Session>();
        session.firing = false;
        std::mem::take(&mut session.characters)
    };

    let home = tunables(world).spawn_point();
    for character in characters {
        stop_firing(world, character);
        if let Err(err) = walk_to(world, character, home, Arrival::ReturnToPool) {
            warn!("{character} could not walk off, releasing in place: {err}");
            if let Err(err) = world.release_pooled(character) {
                warn!("could not release {character}: {err}");
            }
        }
    }

    if let Some(mut data) = world.get_resource_mut::<GameData>() {
        data.reset_to_defaults();
    }
    if let Some(mut powers) = world.get_resource_mut::<ActivePowers>() {
        powers.reset();
    }
    info!("run ended");
}
