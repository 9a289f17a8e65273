//! # void_core - Void Engine Core
//!
//! Value types shared by the collision port and the scene hierarchy:
//! - [`NodeId`] / [`NodeArena`]: generational handles instead of back-pointers
//! - [`EntityId`]: opaque reference to the owning gameplay entity
//! - [`Transform`]: translation, rotation and scale over `glam`

pub mod handle;
pub mod id;
pub mod transform;

pub use handle::*;
pub use id::*;
pub use transform::*;

pub use glam::{Quat, Vec3};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::handle::{NodeArena, NodeId};
    pub use crate::id::EntityId;
    pub use crate::transform::Transform;
    pub use glam::{Quat, Vec3};
}
