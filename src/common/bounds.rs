//! Play-area bounds.

use bevy::prelude::*;

/// Axis-aligned rectangle on the XZ ground plane.
///
/// Projectiles that leave it return themselves to their pool. `Y` is ignored.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct PlayBounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl PlayBounds {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// Is the ground projection of `p` inside the rectangle (edges included)?
    #[inline]
    pub fn contains(&self, p: Vec3) -> bool {
        let g = Vec2::new(p.x, p.z);
        g.x >= self.min.x && g.x <= self.max.x && g.y >= self.min.y && g.y <= self.max.y
    }
}

impl Default for PlayBounds {
    fn default() -> Self {
        Self::new(Vec2::new(-12.0, -40.0), Vec2::new(12.0, 8.0))
    }
}
