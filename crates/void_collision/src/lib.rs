//! Void Collision - collision query port
//!
//! The scene layer never talks to a physics engine directly. It issues
//! traces, sweeps and overlap queries through [`CollisionQuery`] and keeps
//! backend bodies in sync through [`CollisionBackend`].
//!
//! # Features
//!
//! - Channels, per-channel responses and named profiles
//! - Multi-hit line traces and shape sweeps
//! - Overlap queries and single-body overlap tests
//! - `rapier` (default): [`RapierQueryWorld`], a query-only Rapier 3D backend
//!
//! # Example
//!
//! ```ignore
//! use void_collision::prelude::*;
//!
//! let mut world = RapierQueryWorld::new();
//! world.sync_body(&BodyState { /* ... */ });
//!
//! let hits = world.sweep_multi(
//!     Vec3::ZERO,
//!     Vec3::new(10.0, 0.0, 0.0),
//!     Quat::IDENTITY,
//!     CollisionChannel::PAWN,
//!     &CollisionShape::sphere(0.5),
//!     &QueryParams::new(),
//!     &ResponseParams::default(),
//! )?;
//! ```

pub mod backend;
pub mod channel;
pub mod error;
pub mod hit;
pub mod query;
pub mod shape;

pub use channel::*;
pub use error::{CollisionError, Result};
pub use hit::{HitResult, OverlapResult};
pub use query::*;
pub use shape::CollisionShape;

#[cfg(feature = "rapier")]
pub use backend::RapierQueryWorld;

pub mod prelude {
    //! Common imports for collision queries
    pub use crate::channel::{
        CollisionChannel, CollisionEnabled, CollisionProfile, CollisionResponse, ProfileRegistry,
        ResponseContainer,
    };
    pub use crate::error::{CollisionError, Result};
    pub use crate::hit::{HitResult, OverlapResult};
    pub use crate::query::{BodyState, CollisionBackend, CollisionQuery, QueryParams, ResponseParams};
    pub use crate::shape::CollisionShape;

    #[cfg(feature = "rapier")]
    pub use crate::backend::RapierQueryWorld;

    pub use glam::{Quat, Vec3};
}
