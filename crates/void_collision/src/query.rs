//! The collision query port
//!
//! The scene talks to collision geometry only through these traits. A
//! backend answers traces, sweeps and overlap queries against bodies that
//! the scene keeps in sync through [`CollisionBackend::sync_body`].
//!
//! Backend contract:
//! - a body whose pair response with the query is `Ignore` is never reported
//! - with `ignore_touches`, `Overlap` responses are not reported either
//! - `blocking_hit` / `blocking` is set exactly when the pair response is `Block`
//! - bodies named in [`QueryParams`] are never reported
//! - bodies whose [`CollisionEnabled`] has no query part are never reported
//! - ordering of the returned hits is unspecified

use glam::{Quat, Vec3};
use void_core::{EntityId, NodeId, Transform};

use crate::channel::{
    pair_response, CollisionChannel, CollisionProfile, CollisionResponse, ResponseContainer,
};
use crate::error::Result;
use crate::hit::{HitResult, OverlapResult};
use crate::shape::CollisionShape;

/// Filtering applied to a single query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    /// Node issuing the query
    pub querying_node: Option<NodeId>,
    pub ignored_entities: Vec<EntityId>,
    pub ignored_nodes: Vec<NodeId>,
    /// Report only blocking results
    pub ignore_touches: bool,
}

impl QueryParams {
    /// Empty parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Parameters for a query issued by `node`; the node itself is ignored
    pub fn for_node(node: NodeId) -> Self {
        Self {
            querying_node: Some(node),
            ignored_nodes: vec![node],
            ..Default::default()
        }
    }

    /// Ignore every node owned by `entity` (builder pattern)
    pub fn ignore_entity(mut self, entity: EntityId) -> Self {
        if !self.ignored_entities.contains(&entity) {
            self.ignored_entities.push(entity);
        }
        self
    }

    /// Ignore a single node (builder pattern)
    pub fn ignore_node(mut self, node: NodeId) -> Self {
        if !self.ignored_nodes.contains(&node) {
            self.ignored_nodes.push(node);
        }
        self
    }

    /// Report only blocking results (builder pattern)
    pub fn with_ignore_touches(mut self, ignore_touches: bool) -> Self {
        self.ignore_touches = ignore_touches;
        self
    }

    /// Check whether a body is filtered out by these parameters
    pub fn is_ignored(&self, node: NodeId, entity: Option<EntityId>) -> bool {
        self.ignored_nodes.contains(&node)
            || entity.is_some_and(|e| self.ignored_entities.contains(&e))
    }
}

/// How the query itself responds to each channel
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResponseParams {
    pub responses: ResponseContainer,
}

impl ResponseParams {
    /// Wrap a response container
    pub fn new(responses: ResponseContainer) -> Self {
        Self { responses }
    }
}

/// Query-side pair response against a body.
///
/// Returns `None` when the body must not be reported at all.
pub fn filter_response(
    channel: CollisionChannel,
    response_params: &ResponseParams,
    params: &QueryParams,
    body: &BodyState,
) -> Option<CollisionResponse> {
    if !body.is_queryable() || params.is_ignored(body.node, body.entity) {
        return None;
    }
    let response = pair_response(
        channel,
        &response_params.responses,
        body.profile.object_type,
        &body.profile.responses,
    );
    match response {
        CollisionResponse::Ignore => None,
        CollisionResponse::Overlap if params.ignore_touches => None,
        r => Some(r),
    }
}

/// Snapshot of a body as the backend should see it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyState {
    pub node: NodeId,
    pub entity: Option<EntityId>,
    /// Shape with the world scale already applied
    pub shape: CollisionShape,
    /// World pose; scale is ignored
    pub transform: Transform,
    pub profile: CollisionProfile,
}

impl BodyState {
    /// Whether queries can see this body
    pub fn is_queryable(&self) -> bool {
        self.profile.enabled.has_query()
    }
}

/// Read-only collision queries
pub trait CollisionQuery {
    /// Trace a segment, reporting every touch up to and including the first block
    fn line_trace_multi(
        &self,
        start: Vec3,
        end: Vec3,
        channel: CollisionChannel,
        params: &QueryParams,
        response_params: &ResponseParams,
    ) -> Result<Vec<HitResult>>;

    /// Sweep a shape from `start` to `end` at a fixed rotation
    #[allow(clippy::too_many_arguments)]
    fn sweep_multi(
        &self,
        start: Vec3,
        end: Vec3,
        rotation: Quat,
        channel: CollisionChannel,
        shape: &CollisionShape,
        params: &QueryParams,
        response_params: &ResponseParams,
    ) -> Result<Vec<HitResult>>;

    /// Every body overlapping `shape` placed at `location` / `rotation`
    fn overlap_multi(
        &self,
        location: Vec3,
        rotation: Quat,
        channel: CollisionChannel,
        shape: &CollisionShape,
        params: &QueryParams,
        response_params: &ResponseParams,
    ) -> Result<Vec<OverlapResult>>;

    /// Whether `shape` placed at `location` / `rotation` intersects one
    /// specific body, ignoring channels and responses
    fn overlap_test(
        &self,
        target: NodeId,
        shape: &CollisionShape,
        location: Vec3,
        rotation: Quat,
    ) -> Result<bool>;
}

/// A query backend that mirrors scene bodies
pub trait CollisionBackend: CollisionQuery {
    /// Create or update the backend body for a node
    fn sync_body(&mut self, _body: &BodyState) {}

    /// Drop the backend body for a node
    fn remove_body(&mut self, _node: NodeId) {}
}
