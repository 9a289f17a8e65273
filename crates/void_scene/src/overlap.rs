//! Overlap tracking
//!
//! Every primitive keeps the list of primitives it currently overlaps. The
//! lists are kept symmetric: when A records B, B records A. Entity-level
//! begin/end events are the logical OR over all component pairs between
//! two entities, so they fire only on the first begin and the last end.

use log::{debug, warn};
use void_collision::{CollisionBackend, CollisionResponse, QueryParams, ResponseParams};
use void_core::{EntityId, NodeId, Transform, TRANSFORM_TOLERANCE};

use crate::error::Result;
use crate::events::{SceneEvent, SceneEventHandler};
use crate::primitive::{add_unique, EndOverlaps, OverlapInfo};
use crate::scene::Scene;

impl<B: CollisionBackend, H: SceneEventHandler> Scene<B, H> {
    /// Re-evaluate the overlaps of a node and its descendants.
    ///
    /// `pending` overlaps (usually touches from a sweep) are begun first.
    /// `end_overlaps` is reused instead of a fresh overlap query when it
    /// was computed for the node's current world transform.
    pub fn update_overlaps(
        &mut self,
        id: NodeId,
        pending: Option<&[OverlapInfo]>,
        do_notify: bool,
        end_overlaps: Option<&EndOverlaps>,
    ) -> Result<()> {
        self.node_ref(id)?;
        self.update_overlaps_inner(id, pending, do_notify, end_overlaps);
        self.flush_commands();
        Ok(())
    }

    pub(crate) fn update_overlaps_inner(
        &mut self,
        id: NodeId,
        pending: Option<&[OverlapInfo]>,
        do_notify: bool,
        end_overlaps: Option<&EndOverlaps>,
    ) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        if node.pending_kill {
            return;
        }
        let children = node.children.clone();
        let generates = node
            .primitive
            .as_ref()
            .is_some_and(|p| p.should_generate_overlaps());
        let has_overlaps = node
            .primitive
            .as_ref()
            .is_some_and(|p| !p.overlaps.is_empty());

        if generates {
            if let Some(pending) = pending {
                for info in pending {
                    self.begin_overlap_inner(id, info, do_notify);
                }
            }

            let world = self.world_transform_inner(id).ok();
            let candidates = match (world, end_overlaps) {
                (Some(world), Some(end)) if end.transform.equals(&world, TRANSFORM_TOLERANCE) => Some(
                    end.overlaps
                        .iter()
                        .filter(|o| self.can_generate_overlap(id, o.node))
                        .map(|o| OverlapInfo {
                            entity: self.owner_of(o.node),
                            ..*o
                        })
                        .collect(),
                ),
                (Some(world), _) => self.query_overlaps(id, &world),
                (None, _) => None,
            };

            if let Some(candidates) = candidates {
                self.diff_overlaps(id, candidates, do_notify);
            }
        } else if has_overlaps {
            debug!("Clearing overlaps of {:?}: overlap generation is off", id);
            self.clear_overlaps_inner(id, do_notify);
        }

        for child in children {
            self.update_overlaps_inner(child, None, do_notify, None);
        }
    }

    /// Overlap query at `world`, reduced to eligible, distinct counterparts.
    /// `None` when the backend query failed.
    fn query_overlaps(&self, id: NodeId, world: &Transform) -> Option<Vec<OverlapInfo>> {
        let node = self.nodes.get(id)?;
        let primitive = node.primitive.as_ref()?;

        let mut params = QueryParams::for_node(id);
        if let Some(owner) = node.owner {
            params = params.ignore_entity(owner);
        }
        let response_params = ResponseParams::new(primitive.profile.responses);
        let shape = primitive.shape.scaled(world.scale);

        let results = match self.backend.overlap_multi(
            world.translation,
            world.rotation,
            primitive.profile.object_type,
            &shape,
            &params,
            &response_params,
        ) {
            Ok(results) => results,
            Err(e) => {
                warn!("Overlap query for {:?} failed, keeping current overlaps: {}", id, e);
                return None;
            }
        };

        let mut candidates = Vec::with_capacity(results.len());
        for result in results {
            if result.blocking || !self.can_generate_overlap(id, result.node) {
                continue;
            }
            add_unique(
                &mut candidates,
                OverlapInfo::new(result.node, self.owner_of(result.node)),
            );
        }
        Some(candidates)
    }

    /// Diff `candidates` against the node's current overlaps.
    ///
    /// Pairs present on both sides are consumed from both working sets, so
    /// what remains in the old set has ended and what remains in the
    /// candidate set has begun.
    fn diff_overlaps(&mut self, id: NodeId, mut candidates: Vec<OverlapInfo>, do_notify: bool) {
        let mut old = match self.primitive(id) {
            Some(primitive) => primitive.overlaps.clone(),
            None => return,
        };

        let mut i = 0;
        while i < candidates.len() {
            if let Some(pos) = old.iter().position(|o| *o == candidates[i]) {
                old.remove(pos);
                candidates.remove(i);
            } else {
                i += 1;
            }
        }

        for ended in &old {
            self.end_overlap_inner(id, ended, do_notify);
        }
        for began in &candidates {
            self.begin_overlap_inner(id, began, do_notify);
        }
    }

    /// Neither node is pending kill, both primitives generate overlaps,
    /// they belong to different entities and their pair response is `Overlap`
    pub(crate) fn can_generate_overlap(&self, id: NodeId, other: NodeId) -> bool {
        if id == other || self.is_pending_kill(id) || self.is_pending_kill(other) {
            return false;
        }
        let (Some(a), Some(b)) = (self.nodes.get(id), self.nodes.get(other)) else {
            return false;
        };
        if a.owner.is_some() && a.owner == b.owner {
            return false;
        }
        match (a.primitive.as_ref(), b.primitive.as_ref()) {
            (Some(pa), Some(pb)) => {
                pa.should_generate_overlaps()
                    && pb.should_generate_overlaps()
                    && pa.profile.response_to(&pb.profile) == CollisionResponse::Overlap
            }
            _ => false,
        }
    }

    /// Begin an overlap between `id` and `info.node`, recording it on both sides
    pub fn begin_component_overlap(&mut self, id: NodeId, info: &OverlapInfo, do_notify: bool) -> Result<()> {
        self.node_ref(id)?;
        self.begin_overlap_inner(id, info, do_notify);
        self.flush_commands();
        Ok(())
    }

    pub(crate) fn begin_overlap_inner(&mut self, id: NodeId, info: &OverlapInfo, do_notify: bool) {
        let other = info.node;
        if !self.can_generate_overlap(id, other) {
            return;
        }
        let entity = self.owner_of(id);
        let other_entity = self.owner_of(other);
        let record = OverlapInfo {
            entity: other_entity,
            ..*info
        };
        if self.is_overlapping_record(id, &record) {
            return;
        }

        let entities_were_overlapping = match (entity, other_entity) {
            (Some(a), Some(b)) => self.entities_overlapping(a, b),
            _ => true,
        };

        if let Some(primitive) = self.nodes.get_mut(id).and_then(|n| n.primitive.as_mut()) {
            primitive.overlaps.push(record);
        }
        let reflexive = OverlapInfo {
            node: id,
            entity,
            from_sweep: info.from_sweep,
            sweep_hit: info.sweep_hit.map(|hit| hit.reversed(id, entity)),
        };
        if let Some(primitive) = self.nodes.get_mut(other).and_then(|n| n.primitive.as_mut()) {
            add_unique(&mut primitive.overlaps, reflexive);
        }
        debug!("Begin overlap {:?} <-> {:?}", id, other);

        if !do_notify {
            return;
        }
        self.emit(SceneEvent::ComponentBeginOverlap {
            node: id,
            other_node: other,
            other_entity,
            from_sweep: record.from_sweep,
            sweep_hit: record.sweep_hit,
        });
        self.emit(SceneEvent::ComponentBeginOverlap {
            node: other,
            other_node: id,
            other_entity: entity,
            from_sweep: reflexive.from_sweep,
            sweep_hit: reflexive.sweep_hit,
        });
        if !entities_were_overlapping {
            if let (Some(a), Some(b)) = (entity, other_entity) {
                self.emit(SceneEvent::EntityBeginOverlap {
                    entity: a,
                    other_entity: b,
                });
                self.emit(SceneEvent::EntityBeginOverlap {
                    entity: b,
                    other_entity: a,
                });
            }
        }
    }

    /// End an overlap between `id` and `info.node`, removing it from both sides
    pub fn end_component_overlap(&mut self, id: NodeId, info: &OverlapInfo, do_notify: bool) -> Result<()> {
        self.node_ref(id)?;
        self.end_overlap_inner(id, info, do_notify);
        self.flush_commands();
        Ok(())
    }

    pub(crate) fn end_overlap_inner(&mut self, id: NodeId, info: &OverlapInfo, do_notify: bool) {
        let other = info.node;
        let Some(primitive) = self.nodes.get_mut(id).and_then(|n| n.primitive.as_mut()) else {
            return;
        };
        let Some(pos) = primitive.overlaps.iter().position(|o| o == info) else {
            return;
        };
        primitive.overlaps.remove(pos);

        let entity = self.owner_of(id);
        let Some(other_primitive) = self.nodes.get_mut(other).and_then(|n| n.primitive.as_mut()) else {
            // The other node is gone; nothing to notify
            debug!("Dropped stale overlap {:?} -> {:?}", id, other);
            return;
        };
        if let Some(pos) = other_primitive
            .overlaps
            .iter()
            .position(|o| o.node == id && o.entity == entity)
        {
            other_primitive.overlaps.remove(pos);
        }
        debug!("End overlap {:?} <-> {:?}", id, other);

        if !do_notify {
            return;
        }
        let other_entity = self.owner_of(other);
        self.emit(SceneEvent::ComponentEndOverlap {
            node: id,
            other_node: other,
            other_entity,
        });
        self.emit(SceneEvent::ComponentEndOverlap {
            node: other,
            other_node: id,
            other_entity: entity,
        });
        if let (Some(a), Some(b)) = (entity, other_entity) {
            if a != b && !self.entities_overlapping(a, b) {
                self.emit(SceneEvent::EntityEndOverlap {
                    entity: a,
                    other_entity: b,
                });
                self.emit(SceneEvent::EntityEndOverlap {
                    entity: b,
                    other_entity: a,
                });
            }
        }
    }

    /// End every overlap of a node
    pub fn clear_overlaps(&mut self, id: NodeId, do_notify: bool) -> Result<()> {
        self.node_ref(id)?;
        self.clear_overlaps_inner(id, do_notify);
        self.flush_commands();
        Ok(())
    }

    pub(crate) fn clear_overlaps_inner(&mut self, id: NodeId, do_notify: bool) {
        let current = match self.primitive(id) {
            Some(primitive) => primitive.overlaps.clone(),
            None => return,
        };
        for info in &current {
            self.end_overlap_inner(id, info, do_notify);
        }
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    /// Current overlaps of a node, in the order they began
    pub fn overlaps(&self, id: NodeId) -> &[OverlapInfo] {
        match self.primitive(id) {
            Some(primitive) => primitive.overlaps(),
            None => &[],
        }
    }

    fn is_overlapping_record(&self, id: NodeId, record: &OverlapInfo) -> bool {
        self.overlaps(id).contains(record)
    }

    /// Whether two nodes currently overlap
    pub fn is_overlapping_node(&self, id: NodeId, other: NodeId) -> bool {
        self.overlaps(id).iter().any(|o| o.node == other)
    }

    /// Whether a node currently overlaps any node of `entity`
    pub fn is_overlapping_entity(&self, id: NodeId, entity: EntityId) -> bool {
        self.overlaps(id).iter().any(|o| o.entity == Some(entity))
    }

    /// Whether any node of `entity` overlaps any node of `other`
    pub fn entities_overlapping(&self, entity: EntityId, other: EntityId) -> bool {
        self.nodes.iter().any(|(_, node)| {
            node.owner == Some(entity)
                && node
                    .primitive
                    .as_ref()
                    .is_some_and(|p| p.overlaps.iter().any(|o| o.entity == Some(other)))
        })
    }

    /// Entities overlapped by any node of `entity`, in first-seen order
    pub fn overlapping_entities(&self, entity: EntityId) -> Vec<EntityId> {
        let mut result = Vec::new();
        for (_, node) in self.nodes.iter() {
            if node.owner != Some(entity) {
                continue;
            }
            let Some(primitive) = node.primitive.as_ref() else {
                continue;
            };
            for other in primitive.overlaps.iter().filter_map(|o| o.entity) {
                if !result.contains(&other) {
                    result.push(other);
                }
            }
        }
        result
    }
}

#[cfg(all(test, feature = "rapier"))]
mod tests {
    use super::*;
    use crate::node::{NodeDesc, TeleportType};
    use crate::primitive::Primitive;
    use glam::Vec3;
    use void_collision::{CollisionProfile, CollisionShape, RapierQueryWorld};

    fn trigger(scene: &mut Scene<RapierQueryWorld>, owner: u64, x: f32) -> NodeId {
        scene.spawn(
            NodeDesc::new(Transform::from_translation(Vec3::new(x, 0.0, 0.0)))
                .with_owner(EntityId::from_raw(owner))
                .with_primitive(
                    Primitive::new(CollisionShape::sphere(1.0))
                        .with_profile(CollisionProfile::trigger())
                        .with_overlap_events(true),
                ),
        )
    }

    #[test]
    fn test_spawn_overlapping_begins() {
        let mut scene = Scene::with_backend(RapierQueryWorld::new());
        let a = trigger(&mut scene, 1, 0.0);
        let b = trigger(&mut scene, 2, 0.5);

        assert!(scene.is_overlapping_node(a, b));
        assert!(scene.is_overlapping_node(b, a));
        assert!(scene.is_overlapping_entity(a, EntityId::from_raw(2)));
        assert_eq!(scene.overlapping_entities(EntityId::from_raw(1)), vec![EntityId::from_raw(2)]);
    }

    #[test]
    fn test_move_apart_ends() {
        let mut scene = Scene::with_backend(RapierQueryWorld::new());
        let a = trigger(&mut scene, 1, 0.0);
        let b = trigger(&mut scene, 2, 0.5);
        scene.handler_mut().clear();

        scene
            .add_world_offset(b, Vec3::new(10.0, 0.0, 0.0), false, TeleportType::None)
            .unwrap();
        assert!(scene.overlaps(a).is_empty());
        assert!(scene.overlaps(b).is_empty());
        assert_eq!(
            scene
                .handler()
                .entity_end_count(EntityId::from_raw(1), EntityId::from_raw(2)),
            1
        );
    }

    #[test]
    fn test_same_entity_never_overlaps() {
        let mut scene = Scene::with_backend(RapierQueryWorld::new());
        let a = trigger(&mut scene, 1, 0.0);
        let b = trigger(&mut scene, 1, 0.5);
        assert!(!scene.is_overlapping_node(a, b));
    }

    #[test]
    fn test_blocking_pair_is_not_an_overlap() {
        let mut scene = Scene::with_backend(RapierQueryWorld::new());
        let a = trigger(&mut scene, 1, 0.0);
        let wall = scene.spawn(
            NodeDesc::new(Transform::from_translation(Vec3::new(0.5, 0.0, 0.0)))
                .with_owner(EntityId::from_raw(2))
                .with_primitive(
                    Primitive::new(CollisionShape::sphere(1.0))
                        .with_profile(CollisionProfile::block_all())
                        .with_overlap_events(true),
                ),
        );
        assert!(!scene.is_overlapping_node(a, wall));
    }
}
