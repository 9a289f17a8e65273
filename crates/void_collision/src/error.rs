//! Error types for collision queries

use thiserror::Error;
use void_core::NodeId;

/// Collision query errors
#[derive(Debug, Error)]
pub enum CollisionError {
    /// No body is registered for the node
    #[error("No collision body registered for node {0:?}")]
    BodyNotFound(NodeId),

    /// The backend cannot answer this query for the given shapes
    #[error("Unsupported collision query: {0}")]
    UnsupportedQuery(String),

    /// Query input contained non-finite values or an invalid shape
    #[error("Invalid query input: {0}")]
    InvalidInput(String),
}

/// Result type for collision queries
pub type Result<T> = std::result::Result<T, CollisionError>;
