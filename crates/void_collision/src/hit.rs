//! Sweep, trace and overlap results

use glam::Vec3;
use void_core::{EntityId, NodeId};

/// Result of a line trace or shape sweep against one body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitResult {
    /// Fraction of the sweep (0..=1) at which the hit occurred
    pub time: f32,
    /// Distance travelled from `trace_start` to `location`
    pub distance: f32,
    pub trace_start: Vec3,
    pub trace_end: Vec3,
    /// Where the moving shape's origin ended up at the time of the hit
    pub location: Vec3,
    /// Contact point on the other body
    pub impact_point: Vec3,
    /// Normal of the moving shape at the hit
    pub normal: Vec3,
    /// Normal of the surface that was hit
    pub impact_normal: Vec3,
    pub penetration_depth: f32,
    pub blocking_hit: bool,
    /// The sweep started inside the other body
    pub start_penetrating: bool,
    pub node: Option<NodeId>,
    pub entity: Option<EntityId>,
}

impl HitResult {
    /// A hit that carries only the sweep endpoints
    pub fn new(trace_start: Vec3, trace_end: Vec3) -> Self {
        Self {
            time: 1.0,
            distance: 0.0,
            trace_start,
            trace_end,
            location: Vec3::ZERO,
            impact_point: Vec3::ZERO,
            normal: Vec3::ZERO,
            impact_normal: Vec3::ZERO,
            penetration_depth: 0.0,
            blocking_hit: false,
            start_penetrating: false,
            node: None,
            entity: None,
        }
    }

    /// Blocking hit that did not start inside the other body
    #[inline]
    pub fn is_valid_blocking_hit(&self) -> bool {
        self.blocking_hit && !self.start_penetrating
    }

    /// Check that the hit data is usable
    pub fn is_finite(&self) -> bool {
        self.time.is_finite()
            && self.distance.is_finite()
            && self.location.is_finite()
            && self.impact_point.is_finite()
            && self.normal.is_finite()
            && self.impact_normal.is_finite()
    }

    /// The same hit seen from the other body: normals flipped and the
    /// hit component replaced by `mover`
    pub fn reversed(&self, mover: NodeId, mover_entity: Option<EntityId>) -> Self {
        Self {
            normal: -self.normal,
            impact_normal: -self.impact_normal,
            node: Some(mover),
            entity: mover_entity,
            ..*self
        }
    }
}

/// One body found by an overlap query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlapResult {
    pub node: NodeId,
    pub entity: Option<EntityId>,
    /// Pair response was `Block` rather than `Overlap`
    pub blocking: bool,
}
