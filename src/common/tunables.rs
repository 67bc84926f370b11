//! Tunable gameplay constants and the per-run configuration built from them.
//!
//! `Tunables` holds authored defaults and can be loaded from TOML; every field
//! is optional in the file. `GameData` is the mutable per-run copy that powers
//! modify and that drivers read through the [`FireConfig`] provider trait.

use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read tunables from {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid tunables: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tunables {
    /// Seconds per simulation tick.
    pub sim_step: f32,

    pub fire_interval: f32,
    pub projectile_speed: f32,
    pub projectile_direction: [f32; 3],
    pub spread_angle: f32,
    pub extra_projectiles: u32,
    pub double_shot_delay: f32,

    pub character_pool_size: usize,
    pub projectile_pool_size: usize,

    pub spawn_point: [f32; 3],
    pub center_point: [f32; 3],
    pub duplicate_offset: [f32; 3],
    pub character_yaw_deg: f32,
    pub move_duration: f32,
    pub face_duration: f32,

    pub bounds_min: [f32; 2],
    pub bounds_max: [f32; 2],
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            sim_step: 1.0 / 60.0,
            fire_interval: 2.0,
            projectile_speed: 20.0,
            projectile_direction: [0.0, 0.0, 1.0],
            spread_angle: 90.0,
            extra_projectiles: 0,
            double_shot_delay: 0.1,
            character_pool_size: 2,
            projectile_pool_size: 20,
            spawn_point: [0.0, 0.0, 2.13],
            center_point: [0.0, 0.0, -13.41],
            duplicate_offset: [2.5, 0.0, -1.3],
            character_yaw_deg: -180.0,
            move_duration: 0.5,
            face_duration: 0.3,
            bounds_min: [-12.0, -40.0],
            bounds_max: [12.0, 8.0],
        }
    }
}

impl Tunables {
    pub fn from_toml_str(src: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(src)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let src = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&src)
    }

    pub fn spawn_point(&self) -> Vec3 {
        Vec3::from_array(self.spawn_point)
    }

    pub fn center_point(&self) -> Vec3 {
        Vec3::from_array(self.center_point)
    }

    pub fn duplicate_point(&self) -> Vec3 {
        self.center_point() + Vec3::from_array(self.duplicate_offset)
    }

    pub fn character_rotation(&self) -> Quat {
        Quat::from_rotation_y(self.character_yaw_deg.to_radians())
    }

    pub fn bounds(&self) -> crate::common::bounds::PlayBounds {
        crate::common::bounds::PlayBounds::new(
            Vec2::from_array(self.bounds_min),
            Vec2::from_array(self.bounds_max),
        )
    }
}

/// Read-only view of the firing configuration.
///
/// Drivers call these accessors every time they need a value and never cache
/// the result across a behavior's lifetime, so run modifiers take effect on
/// the next read.
pub trait FireConfig: Resource {
    /// Seconds between volleys.
    fn fire_interval(&self) -> f32;
    fn projectile_speed(&self) -> f32;
    /// Unit direction in the fire point's local frame.
    fn projectile_direction(&self) -> Vec3;
    fn extra_projectiles(&self) -> u32;
    /// Total fan width in degrees.
    fn spread_angle(&self) -> f32;
    fn double_shot(&self) -> bool;
    fn double_shot_delay(&self) -> f32 {
        0.1
    }
}

/// Per-run configuration. Reset to the authored defaults when a run ends.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct GameData {
    defaults: Tunables,
    fire_interval_multiplier: f32,
    projectile_speed_multiplier: f32,
    projectile_direction: Vec3,
    extra_projectiles: u32,
    double_shot: bool,
    character_duplicated: bool,
    revision: u64,
}

impl GameData {
    pub fn from_tunables(tunables: &Tunables) -> Self {
        let defaults = tunables.clone();
        let direction = Vec3::from_array(defaults.projectile_direction).normalize_or(Vec3::Z);
        Self {
            extra_projectiles: defaults.extra_projectiles,
            defaults,
            fire_interval_multiplier: 1.0,
            projectile_speed_multiplier: 1.0,
            projectile_direction: direction,
            double_shot: false,
            character_duplicated: false,
            revision: 0,
        }
    }

    pub fn scale_fire_interval(&mut self, multiplier: f32) {
        self.fire_interval_multiplier *= multiplier;
        self.revision += 1;
    }

    pub fn scale_projectile_speed(&mut self, multiplier: f32) {
        self.projectile_speed_multiplier *= multiplier;
        self.revision += 1;
    }

    pub fn set_extra_projectiles(&mut self, count: u32) {
        self.extra_projectiles = count;
        self.revision += 1;
    }

    /// Zero-length directions are ignored.
    pub fn set_projectile_direction(&mut self, direction: Vec3) {
        if let Some(dir) = direction.try_normalize() {
            self.projectile_direction = dir;
            self.revision += 1;
        }
    }

    pub fn enable_double_shot(&mut self) {
        self.double_shot = true;
        self.revision += 1;
    }

    /// Returns `true` only for the first call in a run.
    pub fn mark_character_duplicated(&mut self) -> bool {
        !std::mem::replace(&mut self.character_duplicated, true)
    }

    pub fn character_duplicated(&self) -> bool {
        self.character_duplicated
    }

    /// Bumped by every change to a value drivers read.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn reset_to_defaults(&mut self) {
        let revision = self.revision + 1;
        *self = Self::from_tunables(&self.defaults);
        self.revision = revision;
    }
}

impl Default for GameData {
    fn default() -> Self {
        Self::from_tunables(&Tunables::default())
    }
}

impl FireConfig for GameData {
    fn fire_interval(&self) -> f32 {
        self.defaults.fire_interval * self.fire_interval_multiplier
    }

    fn projectile_speed(&self) -> f32 {
        self.defaults.projectile_speed * self.projectile_speed_multiplier
    }

    fn projectile_direction(&self) -> Vec3 {
        self.projectile_direction
    }

    fn extra_projectiles(&self) -> u32 {
        self.extra_projectiles
    }

    fn spread_angle(&self) -> f32 {
        self.defaults.spread_angle
    }

    fn double_shot(&self) -> bool {
        self.double_shot
    }

    fn double_shot_delay(&self) -> f32 {
        self.defaults.double_shot_delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let t = Tunables::from_toml_str("fire_interval = 1.5\nextra_projectiles = 3\n").unwrap();
        assert_eq!(t.fire_interval, 1.5);
        assert_eq!(t.extra_projectiles, 3);
        assert_eq!(t.projectile_speed, Tunables::default().projectile_speed);
        assert_eq!(t.spawn_point, Tunables::default().spawn_point);
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = Tunables::from_toml_str("fire_interval = \"fast\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Tunables::load("/definitely/not/here/tunables.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn multipliers_compound_and_reset() {
        let mut data = GameData::default();
        data.scale_fire_interval(0.5);
        data.scale_fire_interval(0.5);
        data.scale_projectile_speed(1.5);
        data.set_extra_projectiles(2);
        data.enable_double_shot();
        assert_eq!(data.fire_interval(), 0.5);
        assert_eq!(data.projectile_speed(), 30.0);
        assert_eq!(data.extra_projectiles(), 2);
        assert!(data.double_shot());

        assert_eq!(data.revision(), 5);

        data.reset_to_defaults();
        let fresh = GameData::default();
        assert_eq!(data.fire_interval(), fresh.fire_interval());
        assert_eq!(data.projectile_speed(), fresh.projectile_speed());
        assert_eq!(data.extra_projectiles(), 0);
        assert!(!data.double_shot());
        assert_eq!(data.revision(), 6);
    }

    #[test]
    fn duplicate_flag_is_only_claimed_once() {
        let mut data = GameData::default();
        assert!(data.mark_character_duplicated());
        assert!(!data.mark_character_duplicated());
        data.reset_to_defaults();
        assert!(!data.character_duplicated());
    }

    #[test]
    fn zero_direction_is_ignored() {
        let mut data = GameData::default();
        data.set_projectile_direction(Vec3::ZERO);
        assert_eq!(data.projectile_direction(), Vec3::Z);
        data.set_projectile_direction(Vec3::new(3.0, 0.0, 0.0));
        assert_eq!(data.projectile_direction(), Vec3::X);
    }
}
