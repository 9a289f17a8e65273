//! Collision primitives attached to scene nodes

use void_collision::{
    CollisionChannel, CollisionEnabled, CollisionProfile, CollisionResponse, CollisionShape,
    HitResult,
};
use void_core::{EntityId, NodeId, Transform};

/// One overlapping counterpart of a primitive
///
/// Two records are equal when they name the same node and entity; the
/// sweep data is informational.
#[derive(Debug, Clone, Copy)]
pub struct OverlapInfo {
    pub node: NodeId,
    pub entity: Option<EntityId>,
    /// Found while sweeping rather than by an overlap query
    pub from_sweep: bool,
    pub sweep_hit: Option<HitResult>,
}

impl OverlapInfo {
    /// Overlap found by a query
    pub fn new(node: NodeId, entity: Option<EntityId>) -> Self {
        Self {
            node,
            entity,
            from_sweep: false,
            sweep_hit: None,
        }
    }

    /// Overlap touched during a sweep
    pub fn from_sweep(node: NodeId, entity: Option<EntityId>, hit: HitResult) -> Self {
        Self {
            node,
            entity,
            from_sweep: true,
            sweep_hit: Some(hit),
        }
    }
}

impl PartialEq for OverlapInfo {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node && self.entity == other.entity
    }
}

impl Eq for OverlapInfo {}

/// Insert unless an equal record is already present
pub(crate) fn add_unique(overlaps: &mut Vec<OverlapInfo>, info: OverlapInfo) -> bool {
    if overlaps.contains(&info) {
        return false;
    }
    overlaps.push(info);
    true
}

/// Overlaps computed ahead of time for a given world transform
#[derive(Debug, Clone, Default)]
pub struct EndOverlaps {
    /// Transform the overlaps were computed against
    pub transform: Transform,
    pub overlaps: Vec<OverlapInfo>,
}

/// Collision data of a node
#[derive(Debug, Clone)]
pub struct Primitive {
    pub shape: CollisionShape,
    pub profile: CollisionProfile,
    pub generate_overlap_events: bool,
    /// Entities ignored by this primitive's sweeps
    pub move_ignore_entities: Vec<EntityId>,
    /// Nodes ignored by this primitive's sweeps
    pub move_ignore_nodes: Vec<NodeId>,
    pub(crate) overlaps: Vec<OverlapInfo>,
}

impl Primitive {
    /// Primitive with the default profile and no overlap events
    pub fn new(shape: CollisionShape) -> Self {
        Self {
            shape,
            profile: CollisionProfile::default(),
            generate_overlap_events: false,
            move_ignore_entities: Vec::new(),
            move_ignore_nodes: Vec::new(),
            overlaps: Vec::new(),
        }
    }

    /// Set the collision profile (builder pattern)
    pub fn with_profile(mut self, profile: CollisionProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Enable or disable overlap events (builder pattern)
    pub fn with_overlap_events(mut self, enabled: bool) -> Self {
        self.generate_overlap_events = enabled;
        self
    }

    /// Set the response to one channel (builder pattern)
    pub fn with_response(mut self, channel: CollisionChannel, response: CollisionResponse) -> Self {
        self.profile.responses.set(channel, response);
        self
    }

    /// Ignore an entity when sweeping (builder pattern)
    pub fn ignore_entity_when_moving(mut self, entity: EntityId) -> Self {
        if !self.move_ignore_entities.contains(&entity) {
            self.move_ignore_entities.push(entity);
        }
        self
    }

    /// Ignore a node when sweeping (builder pattern)
    pub fn ignore_node_when_moving(mut self, node: NodeId) -> Self {
        if !self.move_ignore_nodes.contains(&node) {
            self.move_ignore_nodes.push(node);
        }
        self
    }

    pub fn collision_enabled(&self) -> CollisionEnabled {
        self.profile.enabled
    }

    /// Whether queries can see this primitive
    pub fn is_query_enabled(&self) -> bool {
        self.profile.enabled.has_query()
    }

    /// Overlap generation is on and queries can see the primitive
    pub fn should_generate_overlaps(&self) -> bool {
        self.generate_overlap_events && self.is_query_enabled()
    }

    /// Current overlaps, in the order they began
    pub fn overlaps(&self) -> &[OverlapInfo] {
        &self.overlaps
    }
}
