//! Query-only Rapier world
//!
//! Each scene node with collision gets one fixed collider. The collider's
//! `user_data` holds the node id bits; channel, responses and owner live in a
//! side table keyed by node. No simulation is ever stepped: the pipeline is
//! used purely for traces, sweeps and overlaps.

use std::collections::HashMap;

use glam::{Quat, Vec3};
use log::{debug, trace};
use rapier3d::na::{Quaternion, UnitQuaternion};
use rapier3d::parry::query::ShapeCastOptions;
use rapier3d::prelude as rapier;
use void_core::NodeId;

use crate::channel::{CollisionChannel, CollisionResponse};
use crate::error::{CollisionError, Result};
use crate::hit::{HitResult, OverlapResult};
use crate::query::{
    filter_response, BodyState, CollisionBackend, CollisionQuery, QueryParams, ResponseParams,
};
use crate::shape::CollisionShape;

/// Hard cap on the number of touches collected by one sweep
const MAX_SWEEP_HITS: usize = 64;

struct BodyEntry {
    handle: rapier::ColliderHandle,
    state: BodyState,
}

/// Rapier-backed implementation of [`CollisionBackend`]
pub struct RapierQueryWorld {
    bodies: rapier::RigidBodySet,
    colliders: rapier::ColliderSet,
    islands: rapier::IslandManager,
    query_pipeline: rapier::QueryPipeline,
    entries: HashMap<NodeId, BodyEntry>,
}

impl RapierQueryWorld {
    /// Create an empty query world
    pub fn new() -> Self {
        Self {
            bodies: rapier::RigidBodySet::new(),
            colliders: rapier::ColliderSet::new(),
            islands: rapier::IslandManager::new(),
            query_pipeline: rapier::QueryPipeline::new(),
            entries: HashMap::new(),
        }
    }

    /// Number of registered bodies
    pub fn body_count(&self) -> usize {
        self.entries.len()
    }

    /// Whether a body is registered for `node`
    pub fn contains(&self, node: NodeId) -> bool {
        self.entries.contains_key(&node)
    }

    /// Last state synced for `node`
    pub fn body(&self, node: NodeId) -> Option<&BodyState> {
        self.entries.get(&node).map(|e| &e.state)
    }

    fn entry_for(&self, handle: rapier::ColliderHandle) -> Option<&BodyEntry> {
        let collider = self.colliders.get(handle)?;
        let node = NodeId::from_bits(collider.user_data as u64);
        self.entries.get(&node).filter(|e| e.handle == handle)
    }

    fn response_for(
        &self,
        handle: rapier::ColliderHandle,
        channel: CollisionChannel,
        params: &QueryParams,
        response_params: &ResponseParams,
    ) -> Option<(&BodyState, CollisionResponse)> {
        let entry = self.entry_for(handle)?;
        let response = filter_response(channel, response_params, params, &entry.state)?;
        Some((&entry.state, response))
    }
}

impl Default for RapierQueryWorld {
    fn default() -> Self {
        Self::new()
    }
}

fn isometry(location: Vec3, rotation: Quat) -> rapier::Isometry<f32> {
    rapier::Isometry::from_parts(
        rapier::Translation::new(location.x, location.y, location.z),
        UnitQuaternion::from_quaternion(Quaternion::new(
            rotation.w, rotation.x, rotation.y, rotation.z,
        )),
    )
}

fn to_shared_shape(shape: &CollisionShape) -> rapier::SharedShape {
    match *shape {
        CollisionShape::Box { half_extents } => {
            rapier::SharedShape::cuboid(half_extents.x, half_extents.y, half_extents.z)
        }
        CollisionShape::Sphere { radius } => rapier::SharedShape::ball(radius),
        CollisionShape::Capsule {
            radius,
            half_height,
        } => rapier::SharedShape::capsule_y(half_height, radius),
    }
}

fn check_input(start: Vec3, end: Vec3, rotation: Quat) -> Result<()> {
    if !start.is_finite() || !end.is_finite() || !rotation.is_finite() {
        return Err(CollisionError::InvalidInput(format!(
            "non-finite query from {start} to {end}"
        )));
    }
    Ok(())
}

/// Sort by time and drop everything after the first blocking hit
fn truncate_after_block(hits: &mut Vec<HitResult>) {
    hits.sort_by(|a, b| a.time.total_cmp(&b.time));
    if let Some(first_block) = hits.iter().position(|h| h.blocking_hit) {
        hits.truncate(first_block + 1);
    }
}

impl CollisionQuery for RapierQueryWorld {
    fn line_trace_multi(
        &self,
        start: Vec3,
        end: Vec3,
        channel: CollisionChannel,
        params: &QueryParams,
        response_params: &ResponseParams,
    ) -> Result<Vec<HitResult>> {
        check_input(start, end, Quat::IDENTITY)?;
        let delta = end - start;
        if delta.length_squared() <= f32::EPSILON {
            return Ok(Vec::new());
        }

        let ray = rapier::Ray::new(
            rapier::Point::new(start.x, start.y, start.z),
            rapier::Vector::new(delta.x, delta.y, delta.z),
        );
        let predicate = |handle: rapier::ColliderHandle, _: &rapier::Collider| {
            self.response_for(handle, channel, params, response_params).is_some()
        };
        let filter = rapier::QueryFilter::new().predicate(&predicate);

        let mut hits = Vec::new();
        self.query_pipeline.intersections_with_ray(
            &self.bodies,
            &self.colliders,
            &ray,
            1.0,
            true,
            filter,
            |handle, intersection| {
                let Some((body, response)) =
                    self.response_for(handle, channel, params, response_params)
                else {
                    return true;
                };
                let time = intersection.time_of_impact;
                let location = start + delta * time;
                let normal = Vec3::new(
                    intersection.normal.x,
                    intersection.normal.y,
                    intersection.normal.z,
                );
                hits.push(HitResult {
                    time,
                    distance: delta.length() * time,
                    location,
                    impact_point: location,
                    normal,
                    impact_normal: normal,
                    blocking_hit: response == CollisionResponse::Block,
                    start_penetrating: time <= 0.0,
                    node: Some(body.node),
                    entity: body.entity,
                    ..HitResult::new(start, end)
                });
                true
            },
        );

        truncate_after_block(&mut hits);
        Ok(hits)
    }

    fn sweep_multi(
        &self,
        start: Vec3,
        end: Vec3,
        rotation: Quat,
        channel: CollisionChannel,
        shape: &CollisionShape,
        params: &QueryParams,
        response_params: &ResponseParams,
    ) -> Result<Vec<HitResult>> {
        check_input(start, end, rotation)?;
        if !shape.is_valid() {
            return Err(CollisionError::InvalidInput(format!("invalid sweep shape {shape:?}")));
        }
        if shape.is_zero_extent() {
            return self.line_trace_multi(start, end, channel, params, response_params);
        }
        let delta = end - start;
        if delta.length_squared() <= f32::EPSILON {
            return Ok(Vec::new());
        }

        let rapier_shape = to_shared_shape(shape);
        let shape_pos = isometry(start, rotation);
        let vel = rapier::Vector::new(delta.x, delta.y, delta.z);

        // cast_shape only reports the closest hit, so touches are collected
        // by re-casting with every collider found so far excluded
        let mut excluded: Vec<rapier::ColliderHandle> = Vec::new();
        let mut hits = Vec::new();
        while hits.len() < MAX_SWEEP_HITS {
            let predicate = |handle: rapier::ColliderHandle, _: &rapier::Collider| {
                !excluded.contains(&handle)
                    && self.response_for(handle, channel, params, response_params).is_some()
            };
            let filter = rapier::QueryFilter::new().predicate(&predicate);
            let options = ShapeCastOptions {
                max_time_of_impact: 1.0,
                stop_at_penetration: true,
                ..Default::default()
            };

            let Some((handle, hit)) = self.query_pipeline.cast_shape(
                &self.bodies,
                &self.colliders,
                &shape_pos,
                &vel,
                rapier_shape.as_ref(),
                options,
                filter,
            ) else {
                break;
            };
            excluded.push(handle);

            let Some((body, response)) = self.response_for(handle, channel, params, response_params)
            else {
                continue;
            };
            let time = hit.time_of_impact.clamp(0.0, 1.0);
            let impact_normal = Vec3::new(hit.normal1.x, hit.normal1.y, hit.normal1.z);
            let blocking = response == CollisionResponse::Block;
            hits.push(HitResult {
                time,
                distance: delta.length() * time,
                location: start + delta * time,
                impact_point: Vec3::new(hit.witness1.x, hit.witness1.y, hit.witness1.z),
                normal: impact_normal,
                impact_normal,
                blocking_hit: blocking,
                start_penetrating: hit.time_of_impact <= 0.0,
                node: Some(body.node),
                entity: body.entity,
                ..HitResult::new(start, end)
            });
            if blocking {
                break;
            }
        }

        trace!("sweep {start} -> {end}: {} hit(s)", hits.len());
        truncate_after_block(&mut hits);
        Ok(hits)
    }

    fn overlap_multi(
        &self,
        location: Vec3,
        rotation: Quat,
        channel: CollisionChannel,
        shape: &CollisionShape,
        params: &QueryParams,
        response_params: &ResponseParams,
    ) -> Result<Vec<OverlapResult>> {
        check_input(location, location, rotation)?;
        let rapier_shape = to_shared_shape(shape);
        let pos = isometry(location, rotation);
        let predicate = |handle: rapier::ColliderHandle, _: &rapier::Collider| {
            self.response_for(handle, channel, params, response_params).is_some()
        };
        let filter = rapier::QueryFilter::new().predicate(&predicate);

        let mut results = Vec::new();
        self.query_pipeline.intersections_with_shape(
            &self.bodies,
            &self.colliders,
            &pos,
            rapier_shape.as_ref(),
            filter,
            |handle| {
                if let Some((body, response)) =
                    self.response_for(handle, channel, params, response_params)
                {
                    results.push(OverlapResult {
                        node: body.node,
                        entity: body.entity,
                        blocking: response == CollisionResponse::Block,
                    });
                }
                true
            },
        );
        Ok(results)
    }

    fn overlap_test(
        &self,
        target: NodeId,
        shape: &CollisionShape,
        location: Vec3,
        rotation: Quat,
    ) -> Result<bool> {
        let entry = self
            .entries
            .get(&target)
            .ok_or(CollisionError::BodyNotFound(target))?;
        let collider = self
            .colliders
            .get(entry.handle)
            .ok_or(CollisionError::BodyNotFound(target))?;

        let rapier_shape = to_shared_shape(shape);
        rapier3d::parry::query::intersection_test(
            &isometry(location, rotation),
            rapier_shape.as_ref(),
            collider.position(),
            collider.shape(),
        )
        .map_err(|_| CollisionError::UnsupportedQuery(format!("{shape:?} against {target:?}")))
    }
}

impl CollisionBackend for RapierQueryWorld {
    fn sync_body(&mut self, body: &BodyState) {
        let position = isometry(body.transform.translation, body.transform.rotation);
        let enabled = body.is_queryable();

        if let Some(entry) = self.entries.get_mut(&body.node) {
            if let Some(collider) = self.colliders.get_mut(entry.handle) {
                collider.set_position(position);
                if entry.state.shape != body.shape {
                    collider.set_shape(to_shared_shape(&body.shape));
                }
                collider.set_enabled(enabled);
            }
            entry.state = *body;
        } else {
            let collider = rapier::ColliderBuilder::new(to_shared_shape(&body.shape))
                .position(position)
                .user_data(body.node.to_bits() as u128)
                .enabled(enabled)
                .build();
            let handle = self.colliders.insert(collider);
            debug!("Registered collision body for {:?}", body.node);
            self.entries.insert(body.node, BodyEntry {
                handle,
                state: *body,
            });
        }

        self.query_pipeline.update(&self.colliders);
    }

    fn remove_body(&mut self, node: NodeId) {
        if let Some(entry) = self.entries.remove(&node) {
            self.colliders
                .remove(entry.handle, &mut self.islands, &mut self.bodies, false);
            self.query_pipeline.update(&self.colliders);
            debug!("Removed collision body for {:?}", node);
        }
    }
}
