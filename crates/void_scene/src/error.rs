//! Error types for scene operations

use thiserror::Error;
use void_core::NodeId;

/// Scene errors
#[derive(Debug, Error)]
pub enum SceneError {
    /// Node handle is stale or was never issued
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// Parent handle is stale or was never issued
    #[error("Invalid parent {parent:?} for {child:?}")]
    InvalidParent { child: NodeId, parent: NodeId },

    /// A node cannot be attached to itself
    #[error("Cannot attach {0:?} to itself")]
    SelfAttachment(NodeId),

    /// The parent is a descendant of the child
    #[error("Attaching {child:?} to {parent:?} would create a cycle")]
    CycleDetected { child: NodeId, parent: NodeId },

    /// The node is marked for destruction
    #[error("Node is pending kill: {0:?}")]
    PendingKill(NodeId),

    /// A static node cannot be attached beneath a movable one
    #[error("Static node {child:?} cannot be attached to movable node {parent:?}")]
    MobilityMismatch { child: NodeId, parent: NodeId },

    /// A static node cannot be re-transformed
    #[error("Static node cannot be moved: {0:?}")]
    StaticMobility(NodeId),

    /// The node has no collision primitive
    #[error("Node has no collision primitive: {0:?}")]
    NotAPrimitive(NodeId),

    /// Non-finite translation, rotation or scale
    #[error("Invalid transform for {0:?}")]
    InvalidTransform(NodeId),

    /// Invalid configuration
    #[error("Invalid scene configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for scene operations
pub type Result<T> = std::result::Result<T, SceneError>;
