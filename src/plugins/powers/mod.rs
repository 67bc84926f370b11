//! Run modifiers ("powers").
//!
//! A selected power mutates the run's [`GameData`]; drivers pick the change up
//! on their next read. At most [`ActivePowers::MAX`] powers per run; the set is
//! cleared when the run ends.

use bevy::ecs::message::MessageReader;
use bevy::prelude::*;
use thiserror::Error;

use crate::common::state::GameState;
use crate::common::tunables::GameData;
use crate::plugins::session::duplicate_character;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Power {
    IncreaseFireRate { interval_multiplier: f32 },
    IncreaseProjectileSpeed { speed_multiplier: f32 },
    ExtraProjectiles { count: u32 },
    DoubleShot,
    DuplicateCharacter,
}

impl Power {
    pub const FIRE_RATE: Self = Self::IncreaseFireRate {
        interval_multiplier: 0.5,
    };
    pub const PROJECTILE_SPEED: Self = Self::IncreaseProjectileSpeed {
        speed_multiplier: 1.5,
    };
    pub const EXTRA_PROJECTILES: Self = Self::ExtraProjectiles { count: 2 };
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PowerError {
    #[error("at most {max} powers per run")]
    LimitReached { max: usize },
}

/// Ask for a power to be applied to the current run.
#[derive(Message, Clone, Copy, Debug, PartialEq)]
pub struct PowerSelected(pub Power);

#[derive(Resource, Debug, Default, Clone, PartialEq)]
pub struct ActivePowers {
    powers: Vec<Power>,
}

impl ActivePowers {
    pub const MAX: usize = 3;

    pub fn try_add(&mut self, power: Power) -> Result<(), PowerError> {
        if self.powers.len() >= Self::MAX {
            return Err(PowerError::LimitReached { max: Self::MAX });
        }
        self.powers.push(power);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Power> {
        self.powers.iter()
    }

    pub fn len(&self) -> usize {
        self.powers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.powers.is_empty()
    }

    pub fn reset(&mut self) {
        self.powers.clear();
    }
}

pub fn plugin(app: &mut App) {
    app.init_resource::<ActivePowers>()
        .add_message::<PowerSelected>()
        .add_systems(
            Update,
            apply_selected_powers.run_if(in_state(GameState::InGame)),
        );
}

/// Record `power` for this run and apply it.
pub fn apply_power(world: &mut World, power: Power) -> Result<(), PowerError> {
    world.get_resource_or_init::<ActivePowers>().try_add(power)?;

    match power {
        Power::DuplicateCharacter => {
            if duplicate_character(world).is_none() {
                debug!("character already duplicated this run");
            }
        }
        other => {
            let mut data = world.get_resource_or_init::<GameData>();
            match other {
                Power::IncreaseFireRate {
                    interval_multiplier,
                } => data.scale_fire_interval(interval_multiplier),
                Power::IncreaseProjectileSpeed { speed_multiplier } => {
                    data.scale_projectile_speed(speed_multiplier)
                }
                Power::ExtraProjectiles { count } => data.set_extra_projectiles(count),
                Power::DoubleShot => data.enable_double_shot(),
                Power::DuplicateCharacter => {}
            }
        }
    }
    info!("power applied: {power:?}");
    Ok(())
}

fn apply_selected_powers(mut selected: MessageReader<PowerSelected>, mut commands: Commands) {
    for PowerSelected(power) in selected.read().copied() {
        commands.queue(move |world: &mut World| {
            if let Err(err) = apply_power(world, power) {
                warn!("{power:?} rejected: {err}");
            }
        });
    }
}

#[cfg(test)]
mod tests;
