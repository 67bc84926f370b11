use bevy::ecs::message::Messages;
use bevy::prelude::*;

use crate::common::test_utils::{run_system_once, sim_world, tick_n};
use crate::common::tunables::{FireConfig, GameData, Tunables};
use crate::plugins::session::{Session, begin_run, create_pools};

use super::*;

fn run_world() -> World {
    let mut world = sim_world(0.25);
    world.insert_resource(Tunables::default());
    world.init_resource::<Session>();
    world.init_resource::<ActivePowers>();
    create_pools(&mut world);
    begin_run(&mut world);
    tick_n(&mut world, 2);
    world
}

#[test]
fn stat_powers_modify_run_config() {
    let mut world = run_world();
    apply_power(&mut world, Power::FIRE_RATE).unwrap();
    apply_power(&mut world, Power::PROJECTILE_SPEED).unwrap();
    apply_power(&mut world, Power::EXTRA_PROJECTILES).unwrap();

    let data = world.resource::<GameData>();
    assert_eq!(data.fire_interval(), 1.0);
    assert_eq!(data.projectile_speed(), 30.0);
    assert_eq!(data.extra_projectiles(), 2);
    assert_eq!(data.revision(), 3);
    assert_eq!(world.resource::<ActivePowers>().len(), 3);
}

#[test]
fn fourth_power_is_rejected() {
    let mut world = run_world();
    for _ in 0..ActivePowers::MAX {
        apply_power(&mut world, Power::DoubleShot).unwrap();
    }

    let err = apply_power(&mut world, Power::FIRE_RATE).unwrap_err();
    assert_eq!(
        err,
        PowerError::LimitReached {
            max: ActivePowers::MAX
        }
    );
    assert_eq!(world.resource::<GameData>().fire_interval(), 2.0);
    assert!(world.resource::<GameData>().double_shot());
}

#[test]
fn duplicate_power_spawns_one_extra_character() {
    let mut world = run_world();
    apply_power(&mut world, Power::DuplicateCharacter).unwrap();
    apply_power(&mut world, Power::DuplicateCharacter).unwrap();

    assert_eq!(world.resource::<Session>().characters().len(), 2);
    assert_eq!(world.resource::<ActivePowers>().len(), 2);
}

#[test]
fn selected_powers_are_applied_by_the_system() {
    let mut world = run_world();
    world.init_resource::<Messages<PowerSelected>>();
    world.write_message(PowerSelected(Power::FIRE_RATE));
    world.write_message(PowerSelected(Power::DoubleShot));

    run_system_once(&mut world, apply_selected_powers);

    let powers: Vec<Power> = world.resource::<ActivePowers>().iter().copied().collect();
    assert_eq!(powers, [Power::FIRE_RATE, Power::DoubleShot]);
    assert_eq!(world.resource::<GameData>().fire_interval(), 1.0);
}
