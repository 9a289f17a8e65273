//! Translation / rotation / scale transform
//!
//! Composition follows `parent * child`: the child's transform is expressed in
//! the parent's space, and the product is the child's transform in the space
//! the parent is expressed in.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Scale components with a magnitude below this are treated as zero when inverting
pub const SMALL_SCALE: f32 = 1e-8;

/// Default tolerance for [`Transform::equals`]
pub const TRANSFORM_TOLERANCE: f32 = 1e-4;

/// Complete 3D transform with translation, rotation and scale
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    /// Identity transform
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Create a new transform
    #[inline]
    pub const fn new(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// Create from translation only
    #[inline]
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// Create from translation and rotation
    #[inline]
    pub fn from_translation_rotation(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
            scale: Vec3::ONE,
        }
    }

    /// Set translation (builder pattern)
    #[inline]
    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    /// Set rotation (builder pattern)
    #[inline]
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set scale (builder pattern)
    #[inline]
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Compose `self * child`, treating `self` as the parent
    pub fn mul_transform(&self, child: &Transform) -> Self {
        Self {
            translation: self.translation + self.rotation * (self.scale * child.translation),
            rotation: (self.rotation * child.rotation).normalize(),
            scale: self.scale * child.scale,
        }
    }

    /// Express `self` relative to `parent`, so that `parent * result == self`
    pub fn relative_to(&self, parent: &Transform) -> Self {
        let inv_rotation = parent.rotation.inverse();
        let inv_scale = safe_reciprocal(parent.scale);
        Self {
            translation: (inv_rotation * (self.translation - parent.translation)) * inv_scale,
            rotation: (inv_rotation * self.rotation).normalize(),
            scale: self.scale * inv_scale,
        }
    }

    /// Compute the inverse transform
    pub fn inverse(&self) -> Self {
        Self::IDENTITY.relative_to(self)
    }

    /// Transform a point
    #[inline]
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.translation + self.rotation * (self.scale * point)
    }

    /// Transform a direction (ignores translation)
    #[inline]
    pub fn transform_vector(&self, vector: Vec3) -> Vec3 {
        self.rotation * (self.scale * vector)
    }

    /// Map a world-space point into this transform's local space
    #[inline]
    pub fn inverse_transform_point(&self, point: Vec3) -> Vec3 {
        (self.rotation.inverse() * (point - self.translation)) * safe_reciprocal(self.scale)
    }

    /// Approximate equality; `q` and `-q` are treated as the same rotation
    pub fn equals(&self, other: &Transform, tolerance: f32) -> bool {
        self.translation.abs_diff_eq(other.translation, tolerance)
            && self.scale.abs_diff_eq(other.scale, tolerance)
            && rotations_equal(self.rotation, other.rotation, tolerance)
    }

    /// Check that every component is finite
    pub fn is_finite(&self) -> bool {
        self.translation.is_finite() && self.rotation.is_finite() && self.scale.is_finite()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl core::ops::Mul for Transform {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        self.mul_transform(&rhs)
    }
}

/// Approximate rotation equality; `q` and `-q` describe the same rotation
#[inline]
pub fn rotations_equal(a: Quat, b: Quat, tolerance: f32) -> bool {
    a.abs_diff_eq(b, tolerance) || a.abs_diff_eq(-b, tolerance)
}

/// Component-wise reciprocal that maps near-zero scale to zero
#[inline]
fn safe_reciprocal(v: Vec3) -> Vec3 {
    let r = |c: f32| if c.abs() <= SMALL_SCALE { 0.0 } else { 1.0 / c };
    Vec3::new(r(v.x), r(v.y), r(v.z))
}
