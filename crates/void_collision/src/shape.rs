//! Collision shapes used for sweeps and overlap queries

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Dimensions at or below this are treated as zero
pub const ZERO_EXTENT_TOLERANCE: f32 = 1e-6;

/// Shape of a collision primitive, in local (unscaled) space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CollisionShape {
    /// Axis-aligned box in local space
    Box { half_extents: Vec3 },
    /// Sphere
    Sphere { radius: f32 },
    /// Capsule along the local Y axis. `half_height` is the half length of the
    /// segment between the two hemisphere centers.
    Capsule { radius: f32, half_height: f32 },
}

impl CollisionShape {
    /// Create a box shape
    pub fn cuboid(hx: f32, hy: f32, hz: f32) -> Self {
        Self::Box {
            half_extents: Vec3::new(hx, hy, hz),
        }
    }

    /// Create a sphere shape
    pub fn sphere(radius: f32) -> Self {
        Self::Sphere { radius }
    }

    /// Create a capsule shape
    pub fn capsule(radius: f32, half_height: f32) -> Self {
        Self::Capsule {
            radius,
            half_height,
        }
    }

    /// A point: swept as a line trace
    pub fn point() -> Self {
        Self::Sphere { radius: 0.0 }
    }

    /// True when the shape has no volume and should be traced as a line
    pub fn is_zero_extent(&self) -> bool {
        match *self {
            Self::Box { half_extents } => half_extents.max_element() <= ZERO_EXTENT_TOLERANCE,
            Self::Sphere { radius } => radius <= ZERO_EXTENT_TOLERANCE,
            Self::Capsule {
                radius,
                half_height,
            } => radius <= ZERO_EXTENT_TOLERANCE && half_height <= ZERO_EXTENT_TOLERANCE,
        }
    }

    /// Apply a world scale. Spheres and capsule radii take the largest
    /// relevant axis so the scaled shape stays conservative.
    pub fn scaled(&self, scale: Vec3) -> Self {
        let scale = scale.abs();
        match *self {
            Self::Box { half_extents } => Self::Box {
                half_extents: half_extents * scale,
            },
            Self::Sphere { radius } => Self::Sphere {
                radius: radius * scale.max_element(),
            },
            Self::Capsule {
                radius,
                half_height,
            } => Self::Capsule {
                radius: radius * scale.x.max(scale.z),
                half_height: half_height * scale.y,
            },
        }
    }

    /// Radius of a sphere centered on the shape origin that encloses it
    pub fn bounding_radius(&self) -> f32 {
        match *self {
            Self::Box { half_extents } => half_extents.length(),
            Self::Sphere { radius } => radius,
            Self::Capsule {
                radius,
                half_height,
            } => radius + half_height,
        }
    }

    /// Check that every dimension is finite and non-negative
    pub fn is_valid(&self) -> bool {
        match *self {
            Self::Box { half_extents } => half_extents.is_finite() && half_extents.min_element() >= 0.0,
            Self::Sphere { radius } => radius.is_finite() && radius >= 0.0,
            Self::Capsule {
                radius,
                half_height,
            } => radius.is_finite() && half_height.is_finite() && radius >= 0.0 && half_height >= 0.0,
        }
    }
}

impl Default for CollisionShape {
    fn default() -> Self {
        Self::Sphere { radius: 0.5 }
    }
}
