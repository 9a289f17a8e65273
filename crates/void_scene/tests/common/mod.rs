//! Shared fixtures for the scene integration tests

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};

use glam::{Quat, Vec3};
use void_collision::{
    filter_response, BodyState, CollisionBackend, CollisionChannel, CollisionError,
    CollisionProfile, CollisionQuery, CollisionResponse, CollisionShape, HitResult,
    OverlapResult, QueryParams, ResponseParams,
};
use void_core::{EntityId, NodeId, Transform};
use void_scene::{NodeDesc, Primitive, Scene};

/// Backend that treats every shape as its bounding sphere
///
/// Sweeps can be scripted: queued hit lists are returned in order before
/// the analytic sweep takes over again.
#[derive(Default)]
pub struct MockBackend {
    pub bodies: HashMap<NodeId, BodyState>,
    pub scripted_sweeps: RefCell<VecDeque<Vec<HitResult>>>,
    pub fail_overlaps: bool,
    pub sweep_calls: Cell<usize>,
    pub overlap_calls: Cell<usize>,
    pub overlap_test_calls: Cell<usize>,
    pub last_params: RefCell<Option<QueryParams>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script_sweep(&self, hits: Vec<HitResult>) {
        self.scripted_sweeps.borrow_mut().push_back(hits);
    }

    fn sweep_sphere(
        &self,
        start: Vec3,
        end: Vec3,
        radius: f32,
        channel: CollisionChannel,
        params: &QueryParams,
        response_params: &ResponseParams,
    ) -> Vec<HitResult> {
        let delta = end - start;
        let length = delta.length();
        let mut hits = Vec::new();

        for body in self.bodies.values() {
            let Some(response) = filter_response(channel, response_params, params, body) else {
                continue;
            };
            let center = body.transform.translation;
            let combined = radius + body.shape.bounding_radius();
            let to_start = start - center;

            let mut hit = HitResult::new(start, end);
            hit.node = Some(body.node);
            hit.entity = body.entity;
            hit.blocking_hit = response == CollisionResponse::Block;

            if to_start.length() < combined {
                hit.time = 0.0;
                hit.start_penetrating = true;
                hit.penetration_depth = combined - to_start.length();
                hit.normal = to_start.normalize_or_zero();
            } else {
                if length <= f32::EPSILON {
                    continue;
                }
                // |to_start + t * delta| = combined
                let a = delta.length_squared();
                let b = 2.0 * to_start.dot(delta);
                let c = to_start.length_squared() - combined * combined;
                let disc = b * b - 4.0 * a * c;
                if disc < 0.0 {
                    continue;
                }
                let t = (-b - disc.sqrt()) / (2.0 * a);
                if !(0.0..=1.0).contains(&t) {
                    continue;
                }
                hit.time = t;
                let location = start + delta * t;
                hit.normal = (location - center).normalize_or_zero();
            }
            hit.location = start + delta * hit.time;
            hit.distance = length * hit.time;
            hit.impact_normal = hit.normal;
            hit.impact_point = center + hit.normal * body.shape.bounding_radius();
            hits.push(hit);
        }
        hits
    }
}

impl CollisionQuery for MockBackend {
    fn line_trace_multi(
        &self,
        start: Vec3,
        end: Vec3,
        channel: CollisionChannel,
        params: &QueryParams,
        response_params: &ResponseParams,
    ) -> void_collision::Result<Vec<HitResult>> {
        self.sweep_multi(
            start,
            end,
            Quat::IDENTITY,
            channel,
            &CollisionShape::point(),
            params,
            response_params,
        )
    }

    fn sweep_multi(
        &self,
        start: Vec3,
        end: Vec3,
        _rotation: Quat,
        channel: CollisionChannel,
        shape: &CollisionShape,
        params: &QueryParams,
        response_params: &ResponseParams,
    ) -> void_collision::Result<Vec<HitResult>> {
        self.sweep_calls.set(self.sweep_calls.get() + 1);
        *self.last_params.borrow_mut() = Some(params.clone());
        if let Some(hits) = self.scripted_sweeps.borrow_mut().pop_front() {
            return Ok(hits);
        }
        Ok(self.sweep_sphere(
            start,
            end,
            shape.bounding_radius(),
            channel,
            params,
            response_params,
        ))
    }

    fn overlap_multi(
        &self,
        location: Vec3,
        _rotation: Quat,
        channel: CollisionChannel,
        shape: &CollisionShape,
        params: &QueryParams,
        response_params: &ResponseParams,
    ) -> void_collision::Result<Vec<OverlapResult>> {
        self.overlap_calls.set(self.overlap_calls.get() + 1);
        if self.fail_overlaps {
            return Err(CollisionError::UnsupportedQuery("overlap".to_string()));
        }
        let radius = shape.bounding_radius();
        Ok(self
            .bodies
            .values()
            .filter_map(|body| {
                let response = filter_response(channel, response_params, params, body)?;
                let reach = radius + body.shape.bounding_radius();
                (body.transform.translation.distance(location) < reach).then_some(OverlapResult {
                    node: body.node,
                    entity: body.entity,
                    blocking: response == CollisionResponse::Block,
                })
            })
            .collect())
    }

    fn overlap_test(
        &self,
        target: NodeId,
        shape: &CollisionShape,
        location: Vec3,
        _rotation: Quat,
    ) -> void_collision::Result<bool> {
        self.overlap_test_calls.set(self.overlap_test_calls.get() + 1);
        let body = self
            .bodies
            .get(&target)
            .ok_or(CollisionError::BodyNotFound(target))?;
        let reach = shape.bounding_radius() + body.shape.bounding_radius();
        Ok(body.transform.translation.distance(location) < reach)
    }
}

impl CollisionBackend for MockBackend {
    fn sync_body(&mut self, body: &BodyState) {
        self.bodies.insert(body.node, *body);
    }

    fn remove_body(&mut self, node: NodeId) {
        self.bodies.remove(&node);
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn entity(raw: u64) -> EntityId {
    EntityId::from_raw(raw)
}

pub fn at(x: f32, y: f32, z: f32) -> Transform {
    Transform::from_translation(Vec3::new(x, y, z))
}

pub fn pawn_primitive(radius: f32) -> Primitive {
    Primitive::new(CollisionShape::sphere(radius))
        .with_profile(CollisionProfile::pawn())
        .with_overlap_events(true)
}

pub fn trigger_primitive(radius: f32) -> Primitive {
    Primitive::new(CollisionShape::sphere(radius))
        .with_profile(CollisionProfile::trigger())
        .with_overlap_events(true)
}

pub fn wall_primitive(radius: f32) -> Primitive {
    Primitive::new(CollisionShape::sphere(radius)).with_profile(CollisionProfile::block_all())
}

pub fn spawn_pawn(scene: &mut Scene<MockBackend>, owner: u64, x: f32) -> NodeId {
    scene.spawn(
        NodeDesc::new(at(x, 0.0, 0.0))
            .with_owner(entity(owner))
            .with_primitive(pawn_primitive(0.5)),
    )
}

pub fn spawn_trigger(scene: &mut Scene<MockBackend>, owner: u64, x: f32, radius: f32) -> NodeId {
    scene.spawn(
        NodeDesc::new(at(x, 0.0, 0.0))
            .with_owner(entity(owner))
            .with_primitive(trigger_primitive(radius)),
    )
}

pub fn spawn_wall(scene: &mut Scene<MockBackend>, x: f32) -> NodeId {
    scene.spawn(NodeDesc::new(at(x, 0.0, 0.0)).with_primitive(wall_primitive(0.5)))
}

pub fn blocking_hit(start: Vec3, end: Vec3, time: f32, node: Option<NodeId>) -> HitResult {
    let mut hit = HitResult::new(start, end);
    hit.time = time;
    hit.blocking_hit = true;
    hit.node = node;
    hit.location = start + (end - start) * time;
    hit.normal = -(end - start).normalize_or_zero();
    hit.impact_normal = hit.normal;
    hit
}
