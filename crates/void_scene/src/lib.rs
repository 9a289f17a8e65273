//! Void Scene - hierarchy, swept movement and overlap tracking
//!
//! Scene nodes form a transform hierarchy. Nodes carrying a [`Primitive`]
//! take part in collision: they can be swept through the world, blocked by
//! other primitives, and they track which primitives they overlap.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                     Scene                        │
//! │  ┌────────────┐  ┌──────────┐  ┌──────────────┐  │
//! │  │ NodeArena  │  │  Mover   │  │OverlapTracker│  │
//! │  │ (hierarchy)│  │ (sweeps) │  │   (diffs)    │  │
//! │  └────────────┘  └──────────┘  └──────────────┘  │
//! └──────────────────────────────────────────────────┘
//!          │                 │                │
//!          ▼                 ▼                ▼
//!   CollisionBackend   SceneEventHandler  CommandQueue
//! ```
//!
//! Events are delivered synchronously. Handlers receive a [`CommandQueue`]
//! instead of the scene; queued commands run when the operation that
//! raised the event returns.
//!
//! # Example
//!
//! ```ignore
//! use void_scene::prelude::*;
//!
//! let mut scene = Scene::with_backend(RapierQueryWorld::new());
//!
//! let wall = scene.spawn_primitive(
//!     Transform::from_translation(Vec3::new(5.0, 0.0, 0.0)),
//!     None,
//!     Primitive::new(CollisionShape::cuboid(0.5, 0.5, 0.5))
//!         .with_profile(CollisionProfile::block_all()),
//! );
//! let pawn = scene.spawn_primitive(
//!     Transform::IDENTITY,
//!     Some(EntityId::from_raw(1)),
//!     Primitive::new(CollisionShape::sphere(0.5)).with_profile(CollisionProfile::pawn()),
//! );
//!
//! let result = scene.add_world_offset(pawn, Vec3::new(10.0, 0.0, 0.0), true, TeleportType::None)?;
//! assert!(result.is_blocked());
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod events;
pub mod movement;
pub mod node;
pub mod overlap;
pub mod primitive;
pub mod scene;

pub use commands::{CommandQueue, SceneCommand};
pub use config::SceneConfig;
pub use error::{Result, SceneError};
pub use events::{ChannelEventHandler, EventCollector, HitEvent, SceneEvent, SceneEventHandler};
pub use movement::MoveResult;
pub use node::{
    AttachmentRule, DetachmentRule, Mobility, NodeDesc, SceneNode, TeleportType,
    UpdateTransformFlags,
};
pub use primitive::{EndOverlaps, OverlapInfo, Primitive};
pub use scene::Scene;

pub mod prelude {
    //! Common imports for building scenes
    pub use crate::commands::{CommandQueue, SceneCommand};
    pub use crate::config::SceneConfig;
    pub use crate::error::{Result, SceneError};
    pub use crate::events::{EventCollector, HitEvent, SceneEvent, SceneEventHandler};
    pub use crate::movement::MoveResult;
    pub use crate::node::{AttachmentRule, DetachmentRule, Mobility, NodeDesc, TeleportType};
    pub use crate::primitive::{OverlapInfo, Primitive};
    pub use crate::scene::Scene;

    pub use void_collision::prelude::*;
    pub use void_core::prelude::*;
}
