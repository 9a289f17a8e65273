//! Scene nodes
//!
//! A node owns its relative transform and caches the derived world
//! transform. Parent and children are handles into the scene's arena.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use void_core::{EntityId, NodeId, Transform};

use crate::primitive::Primitive;

/// Whether a node is allowed to move after it is spawned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Mobility {
    /// Never moves
    Static,
    /// Does not move, but other properties may change
    Stationary,
    /// Free to move
    #[default]
    Movable,
}

/// How a transform change should be treated by the physics side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TeleportType {
    /// Continuous movement
    #[default]
    None,
    /// Discontinuous jump; velocities are kept
    TeleportPhysics,
    /// Discontinuous jump; velocities are reset
    ResetPhysics,
}

impl TeleportType {
    /// Whether the change is a jump rather than continuous motion
    pub fn is_teleport(self) -> bool {
        self != Self::None
    }
}

/// How the relative transform is derived when attaching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttachmentRule {
    /// Keep the relative transform; the node jumps with its new parent
    KeepRelative,
    /// Keep the world transform; the node does not visually move
    KeepWorld,
    /// Reset the relative transform to identity
    SnapToTarget,
}

/// How the relative transform is derived when detaching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DetachmentRule {
    /// The last world transform becomes the relative transform
    KeepWorld,
    /// Keep the relative transform as-is
    KeepRelative,
    /// Reset the relative transform to identity
    Reset,
}

bitflags! {
    /// Flags passed down a transform update
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct UpdateTransformFlags: u8 {
        /// Do not resync backend bodies
        const SKIP_PHYSICS_UPDATE = 1 << 0;
        /// The parent was updated in this same pass
        const PROPAGATE_FROM_PARENT = 1 << 1;
    }
}

/// A node in the scene hierarchy
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub(crate) relative: Transform,
    pub(crate) world: Transform,
    pub(crate) world_valid: bool,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) mobility: Mobility,
    pub(crate) visible: bool,
    pub(crate) wants_transform_callback: bool,
    pub(crate) pending_kill: bool,
    pub(crate) owner: Option<EntityId>,
    pub(crate) primitive: Option<Primitive>,
}

impl SceneNode {
    pub(crate) fn from_desc(desc: NodeDesc) -> Self {
        Self {
            relative: desc.transform,
            world: desc.transform,
            world_valid: false,
            parent: None,
            children: Vec::new(),
            mobility: desc.mobility,
            visible: desc.visible,
            wants_transform_callback: desc.wants_transform_callback,
            pending_kill: false,
            owner: desc.owner,
            primitive: desc.primitive,
        }
    }

    /// Transform relative to the parent (or the world for roots)
    pub fn relative_transform(&self) -> Transform {
        self.relative
    }

    /// Cached world transform; may be stale when
    /// [`is_world_transform_valid`](Self::is_world_transform_valid) is false
    pub fn cached_world_transform(&self) -> Transform {
        self.world
    }

    pub fn is_world_transform_valid(&self) -> bool {
        self.world_valid
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in attach order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn mobility(&self) -> Mobility {
        self.mobility
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn wants_transform_callback(&self) -> bool {
        self.wants_transform_callback
    }

    pub fn is_pending_kill(&self) -> bool {
        self.pending_kill
    }

    /// Owning entity
    pub fn owner(&self) -> Option<EntityId> {
        self.owner
    }

    /// Collision primitive, if this node has one
    pub fn primitive(&self) -> Option<&Primitive> {
        self.primitive.as_ref()
    }
}

/// Description used to spawn a node
#[derive(Debug, Clone)]
pub struct NodeDesc {
    pub transform: Transform,
    pub mobility: Mobility,
    pub owner: Option<EntityId>,
    pub visible: bool,
    pub wants_transform_callback: bool,
    pub primitive: Option<Primitive>,
}

impl Default for NodeDesc {
    fn default() -> Self {
        Self {
            transform: Transform::IDENTITY,
            mobility: Mobility::Movable,
            owner: None,
            visible: true,
            wants_transform_callback: false,
            primitive: None,
        }
    }
}

impl NodeDesc {
    /// Plain node with a relative transform
    pub fn new(transform: Transform) -> Self {
        Self {
            transform,
            ..Default::default()
        }
    }

    /// Set the owning entity (builder pattern)
    pub fn with_owner(mut self, owner: EntityId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Set the mobility (builder pattern)
    pub fn with_mobility(mut self, mobility: Mobility) -> Self {
        self.mobility = mobility;
        self
    }

    /// Attach a collision primitive (builder pattern)
    pub fn with_primitive(mut self, primitive: Primitive) -> Self {
        self.primitive = Some(primitive);
        self
    }

    /// Request [`SceneEvent::TransformUpdated`](crate::SceneEvent::TransformUpdated) events
    pub fn with_transform_callback(mut self) -> Self {
        self.wants_transform_callback = true;
        self
    }

    /// Start hidden (builder pattern)
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}
