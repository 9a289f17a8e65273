//! Swept movement
//!
//! [`Scene::move_component`] turns a requested world-space displacement into
//! an actual one. Swept moves stop at the first blocking hit (pulled back a
//! little so the shape never rests exactly on the surface), touches found
//! before the block become pending overlaps, and the blocking hit is
//! dispatched to both participants once overlaps have been updated.

use glam::{Quat, Vec3};
use log::{error, trace, warn};
use void_collision::{CollisionBackend, HitResult, QueryParams, ResponseParams};
use void_core::{rotations_equal, NodeId, Transform};

use crate::error::{Result, SceneError};
use crate::events::{HitEvent, SceneEvent, SceneEventHandler};
use crate::node::{Mobility, TeleportType};
use crate::primitive::{add_unique, EndOverlaps, OverlapInfo};
use crate::scene::Scene;

/// Rotations closer than this count as unchanged
const ROTATION_TOLERANCE: f32 = 1e-8;

/// Squared displacement below which a move has no translation at all
const ZERO_DELTA_SQ: f32 = 1e-12;

/// Outcome of a move request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveResult {
    /// The node's transform changed
    pub moved: bool,
    /// The blocking hit, or a non-blocking hit carrying only start and end
    pub hit: HitResult,
}

impl MoveResult {
    fn unmoved(start: Vec3, end: Vec3) -> Self {
        Self {
            moved: false,
            hit: HitResult::new(start, end),
        }
    }

    /// The move was stopped by a blocking hit
    pub fn is_blocked(&self) -> bool {
        self.hit.blocking_hit
    }
}

impl<B: CollisionBackend, H: SceneEventHandler> Scene<B, H> {
    /// Move a node by a world-space offset and set its world rotation.
    ///
    /// With `sweep`, the node's collision shape is swept along the offset and
    /// stops at the first blocking hit. Pending-kill and static nodes do not
    /// move.
    pub fn move_component(
        &mut self,
        id: NodeId,
        delta: Vec3,
        new_rotation: Quat,
        sweep: bool,
        teleport: TeleportType,
    ) -> Result<MoveResult> {
        let result = self.move_component_inner(id, delta, new_rotation, sweep, teleport);
        self.flush_commands();
        result
    }

    pub(crate) fn move_component_inner(
        &mut self,
        id: NodeId,
        delta: Vec3,
        new_rotation: Quat,
        sweep: bool,
        teleport: TeleportType,
    ) -> Result<MoveResult> {
        if !delta.is_finite() || !new_rotation.is_finite() {
            return Err(SceneError::InvalidTransform(id));
        }
        let node = self.node_ref(id)?;
        let mobility = node.mobility;
        if self.is_pending_kill(id) {
            let start = node.world.translation;
            return Ok(MoveResult::unmoved(start, start));
        }

        let world = self.world_transform_inner(id)?;
        let start = world.translation;
        let end = start + delta;

        if mobility == Mobility::Static {
            warn!("Static node {:?} cannot be moved", id);
            return Ok(MoveResult::unmoved(start, end));
        }

        let delta_size_sq = delta.length_squared();
        let rotation_unchanged = rotations_equal(world.rotation, new_rotation, ROTATION_TOLERANCE);
        if delta_size_sq <= ZERO_DELTA_SQ && rotation_unchanged {
            return Ok(MoveResult::unmoved(start, end));
        }

        let query_enabled = self
            .primitive(id)
            .is_some_and(|p| p.is_query_enabled());
        let min_move_sq = self.config.min_move_distance * self.config.min_move_distance;
        let swept = sweep && query_enabled && delta_size_sq > min_move_sq;

        if !swept {
            let moved = self.internal_set_world_location_and_rotation(id, end, new_rotation, teleport)?;
            if moved {
                self.update_overlaps_inner(id, None, true, None);
            }
            return Ok(MoveResult {
                moved,
                hit: HitResult::new(start, end),
            });
        }

        let (blocking_hit, pending) = self.resolve_sweep(id, &world, delta)?;

        let mut new_location = end;
        let mut out_hit = HitResult::new(start, end);
        if let Some(mut hit) = blocking_hit {
            new_location = start + delta * hit.time;
            if (new_location - start).length_squared() <= min_move_sq {
                new_location = start;
                hit.time = 0.0;
            }
            hit.location = new_location;
            hit.distance = (new_location - start).length();
            out_hit = hit;
        }

        let moved = self.internal_set_world_location_and_rotation(id, new_location, new_rotation, teleport)?;
        if moved {
            let end_overlaps = if self.config.fast_overlap_check && rotation_unchanged {
                self.confirm_swept_overlaps(id, &pending)
            } else {
                None
            };
            self.update_overlaps_inner(id, Some(&pending), true, end_overlaps.as_ref());
        }

        if out_hit.blocking_hit {
            self.dispatch_blocking_hit(id, &out_hit);
        }

        Ok(MoveResult {
            moved,
            hit: out_hit,
        })
    }

    /// Sweep the node's shape along `delta` from its current pose.
    ///
    /// Returns the first usable blocking hit and the touches before it on
    /// primitives that generate overlap events.
    fn resolve_sweep(
        &self,
        id: NodeId,
        world: &Transform,
        delta: Vec3,
    ) -> Result<(Option<HitResult>, Vec<OverlapInfo>)> {
        let node = self.node_ref(id)?;
        let primitive = node.primitive.as_ref().ok_or(SceneError::NotAPrimitive(id))?;
        let start = world.translation;
        let end = start + delta;

        let mut params = QueryParams::for_node(id).with_ignore_touches(!primitive.generate_overlap_events);
        if let Some(owner) = node.owner {
            params = params.ignore_entity(owner);
        }
        for entity in &primitive.move_ignore_entities {
            params = params.ignore_entity(*entity);
        }
        for ignored in &primitive.move_ignore_nodes {
            params = params.ignore_node(*ignored);
        }
        let response_params = ResponseParams::new(primitive.profile.responses);
        let channel = primitive.profile.object_type;
        let shape = primitive.shape.scaled(world.scale);

        let query = if shape.is_zero_extent() {
            self.backend
                .line_trace_multi(start, end, channel, &params, &response_params)
        } else {
            self.backend.sweep_multi(
                start,
                end,
                world.rotation,
                channel,
                &shape,
                &params,
                &response_params,
            )
        };
        let mut hits = match query {
            Ok(hits) => hits,
            Err(e) => {
                warn!("Sweep for {:?} failed, treating as no hits: {}", id, e);
                Vec::new()
            }
        };

        hits.retain(|hit| {
            if hit.is_finite() {
                true
            } else {
                error!("Discarding non-finite sweep hit for {:?}: {:?}", id, hit);
                false
            }
        });

        let time_back = self.config.pullback_time(delta.length());
        for hit in &mut hits {
            hit.time = (hit.time - time_back).clamp(0.0, 1.0);
        }
        hits.sort_by(|a, b| {
            a.time
                .total_cmp(&b.time)
                .then_with(|| b.blocking_hit.cmp(&a.blocking_hit))
        });

        let generate_overlaps = primitive.generate_overlap_events;
        let mut pending = Vec::new();
        let mut blocking = None;
        for hit in hits {
            if hit.blocking_hit {
                if self.should_ignore_hit(id, &hit, delta) {
                    continue;
                }
                blocking = Some(hit);
                break;
            }
            if !generate_overlaps {
                continue;
            }
            if let Some(other) = hit.node {
                if self.can_generate_overlap(id, other) {
                    let info = OverlapInfo::from_sweep(other, self.owner_of(other), hit);
                    add_unique(&mut pending, info);
                }
            }
        }

        trace!(
            "Sweep {:?}: block {:?}, {} pending overlap(s)",
            id,
            blocking.as_ref().map(|h: &HitResult| h.time),
            pending.len()
        );
        Ok((blocking, pending))
    }

    /// Blocking hits that cannot stop this move
    fn should_ignore_hit(&self, id: NodeId, hit: &HitResult, delta: Vec3) -> bool {
        if let Some(other) = hit.node {
            if other == id || !self.contains(other) {
                return true;
            }
        }
        if hit.start_penetrating {
            // Moving out of an initial overlap is allowed
            let move_dot = hit.impact_normal.dot(delta.normalize_or_zero());
            if move_dot > self.config.initial_overlap_normal_tolerance {
                return true;
            }
        }
        false
    }

    /// Keep the sweep touches that still overlap the node at its new pose.
    ///
    /// `None` when the sweep could not have seen every overlap: bodies the
    /// primitive ignores while moving never show up as touches.
    fn confirm_swept_overlaps(&self, id: NodeId, pending: &[OverlapInfo]) -> Option<EndOverlaps> {
        let node = self.nodes.get(id)?;
        let primitive = node.primitive.as_ref()?;
        if !primitive.move_ignore_nodes.is_empty() || !primitive.move_ignore_entities.is_empty() {
            return None;
        }
        let world = node.world;
        let shape = primitive.shape.scaled(world.scale);

        let mut overlaps = Vec::with_capacity(pending.len());
        for info in pending {
            match self
                .backend
                .overlap_test(info.node, &shape, world.translation, world.rotation)
            {
                Ok(true) => overlaps.push(*info),
                Ok(false) => {}
                Err(e) => {
                    trace!("Falling back to an overlap query for {:?}: {}", id, e);
                    return None;
                }
            }
        }
        Some(EndOverlaps {
            transform: world,
            overlaps,
        })
    }

    /// Notify both participants of a blocking hit
    fn dispatch_blocking_hit(&mut self, id: NodeId, hit: &HitResult) {
        if self.is_pending_kill(id) {
            return;
        }
        if let Some(other) = hit.node {
            if self.is_pending_kill(other) {
                return;
            }
        }
        let entity = self.owner_of(id);
        let other_entity = hit.node.and_then(|n| self.owner_of(n)).or(hit.entity);

        self.emit(SceneEvent::Hit(HitEvent {
            node: id,
            entity,
            other_node: hit.node,
            other_entity,
            self_moved: true,
            location: hit.location,
            normal: hit.normal,
            normal_impulse: Vec3::ZERO,
            hit: *hit,
        }));

        if let Some(other) = hit.node {
            let reversed = hit.reversed(id, entity);
            self.emit(SceneEvent::Hit(HitEvent {
                node: other,
                entity: other_entity,
                other_node: Some(id),
                other_entity: entity,
                self_moved: false,
                location: reversed.location,
                normal: reversed.normal,
                normal_impulse: Vec3::ZERO,
                hit: reversed,
            }));
        }
    }

    // ---------------------------------------------------------------------
    // Convenience wrappers
    // ---------------------------------------------------------------------

    /// Move by a world offset, keeping the world rotation
    pub fn add_world_offset(
        &mut self,
        id: NodeId,
        delta: Vec3,
        sweep: bool,
        teleport: TeleportType,
    ) -> Result<MoveResult> {
        let result = self.world_transform_inner(id).and_then(|world| {
            self.move_component_inner(id, delta, world.rotation, sweep, teleport)
        });
        self.flush_commands();
        result
    }

    /// Move by an offset expressed in the parent's space
    pub fn add_relative_location(
        &mut self,
        id: NodeId,
        delta: Vec3,
        sweep: bool,
        teleport: TeleportType,
    ) -> Result<MoveResult> {
        let result = self.add_relative_location_inner(id, delta, sweep, teleport);
        self.flush_commands();
        result
    }

    fn add_relative_location_inner(
        &mut self,
        id: NodeId,
        delta: Vec3,
        sweep: bool,
        teleport: TeleportType,
    ) -> Result<MoveResult> {
        let world_delta = match self.parent_world_transform(id)? {
            Some(parent) => parent.transform_vector(delta),
            None => delta,
        };
        let world = self.world_transform_inner(id)?;
        self.move_component_inner(id, world_delta, world.rotation, sweep, teleport)
    }

    /// Move to a world location, keeping the world rotation
    pub fn set_world_location(
        &mut self,
        id: NodeId,
        location: Vec3,
        sweep: bool,
        teleport: TeleportType,
    ) -> Result<MoveResult> {
        let result = self.world_transform_inner(id).and_then(|world| {
            self.move_component_inner(id, location - world.translation, world.rotation, sweep, teleport)
        });
        self.flush_commands();
        result
    }

    /// Set the world rotation, keeping the world location
    pub fn set_world_rotation(
        &mut self,
        id: NodeId,
        rotation: Quat,
        sweep: bool,
        teleport: TeleportType,
    ) -> Result<MoveResult> {
        let result = self.move_component_inner(id, Vec3::ZERO, rotation, sweep, teleport);
        self.flush_commands();
        result
    }

    /// Set the relative transform, sweeping the translation when `sweep` is
    /// set. Scale is applied after the move.
    pub fn set_relative_transform(
        &mut self,
        id: NodeId,
        transform: Transform,
        sweep: bool,
        teleport: TeleportType,
    ) -> Result<MoveResult> {
        let result = self.set_relative_transform_inner(id, transform, sweep, teleport);
        self.flush_commands();
        result
    }

    pub(crate) fn set_relative_transform_inner(
        &mut self,
        id: NodeId,
        transform: Transform,
        sweep: bool,
        teleport: TeleportType,
    ) -> Result<MoveResult> {
        if !transform.is_finite() {
            return Err(SceneError::InvalidTransform(id));
        }
        let world = self.world_transform_inner(id)?;
        if self.node_ref(id)?.mobility == Mobility::Static {
            warn!("Static node {:?} cannot be re-transformed", id);
            return Ok(MoveResult::unmoved(world.translation, world.translation));
        }

        let desired = match self.parent_world_transform(id)? {
            Some(parent) => parent * transform,
            None => transform,
        };
        let mut result = self.move_component_inner(
            id,
            desired.translation - world.translation,
            desired.rotation,
            sweep,
            teleport,
        )?;

        if self.is_pending_kill(id) {
            return Ok(result);
        }
        let node = self.node_mut(id)?;
        if !node.relative.scale.abs_diff_eq(transform.scale, 1e-6) {
            node.relative.scale = transform.scale;
            self.update_local_to_world_inner(id, Default::default(), teleport);
            self.update_overlaps_inner(id, None, true, None);
            result.moved = true;
        }
        Ok(result)
    }

    /// Set the world transform; converted to a relative transform against
    /// the current parent
    pub fn set_world_transform(
        &mut self,
        id: NodeId,
        transform: Transform,
        sweep: bool,
        teleport: TeleportType,
    ) -> Result<MoveResult> {
        let result = self.parent_world_transform(id).and_then(|parent| {
            let relative = match parent {
                Some(parent) => transform.relative_to(&parent),
                None => transform,
            };
            self.set_relative_transform_inner(id, relative, sweep, teleport)
        });
        self.flush_commands();
        result
    }
}
