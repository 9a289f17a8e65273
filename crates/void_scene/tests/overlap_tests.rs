//! Overlap tracking against a mock collision backend

mod common;

use common::*;
use glam::Vec3;
use void_scene::prelude::*;
use void_scene::EndOverlaps;

fn scene() -> Scene<MockBackend> {
    init_logging();
    Scene::with_backend(MockBackend::new())
}

fn component_begin_count(scene: &Scene<MockBackend>, node: NodeId) -> usize {
    scene
        .handler()
        .component_begins()
        .filter(|e| matches!(e, SceneEvent::ComponentBeginOverlap { node: n, .. } if *n == node))
        .count()
}

fn component_end_count(scene: &Scene<MockBackend>, node: NodeId) -> usize {
    scene
        .handler()
        .component_ends()
        .filter(|e| matches!(e, SceneEvent::ComponentEndOverlap { node: n, .. } if *n == node))
        .count()
}

#[test]
fn test_sweep_through_trigger_begins_then_ends() {
    let mut scene = scene();
    let pawn = spawn_pawn(&mut scene, 1, 0.0);
    let trigger = spawn_trigger(&mut scene, 2, 5.0, 1.0);
    scene.handler_mut().clear();

    let result = scene
        .add_world_offset(pawn, Vec3::new(10.0, 0.0, 0.0), true, TeleportType::None)
        .unwrap();

    assert!(!result.is_blocked());
    assert_eq!(scene.world_transform(pawn).unwrap().translation.x, 10.0);

    let swept_begin = scene.handler().component_begins().find(|e| {
        matches!(e, SceneEvent::ComponentBeginOverlap { node, from_sweep: true, sweep_hit: Some(_), .. } if *node == pawn)
    });
    assert!(swept_begin.is_some());

    assert_eq!(component_begin_count(&scene, pawn), 1);
    assert_eq!(component_begin_count(&scene, trigger), 1);
    assert_eq!(component_end_count(&scene, pawn), 1);
    assert_eq!(scene.handler().entity_begin_count(entity(1), entity(2)), 1);
    assert_eq!(scene.handler().entity_end_count(entity(1), entity(2)), 1);
    assert!(scene.overlaps(pawn).is_empty());
    assert!(scene.overlaps(trigger).is_empty());
}

#[test]
fn test_sweep_into_trigger_keeps_overlap_without_query() {
    let mut scene = scene();
    let pawn = spawn_pawn(&mut scene, 1, 0.0);
    let trigger = spawn_trigger(&mut scene, 2, 5.0, 1.0);
    let queries_before = scene.backend().overlap_calls.get();

    scene
        .add_world_offset(pawn, Vec3::new(5.0, 0.0, 0.0), true, TeleportType::None)
        .unwrap();

    assert!(scene.is_overlapping_node(pawn, trigger));
    assert!(scene.is_overlapping_node(trigger, pawn));
    assert!(scene.overlaps(pawn)[0].from_sweep);
    assert_eq!(scene.backend().overlap_calls.get(), queries_before);
    assert!(scene.backend().overlap_test_calls.get() > 0);
    assert_eq!(scene.handler().entity_begin_count(entity(2), entity(1)), 1);
}

#[test]
fn test_without_fast_check_a_fresh_query_runs() {
    init_logging();
    let config = SceneConfig::default().with_fast_overlap_check(false);
    let mut scene = Scene::new(MockBackend::new(), EventCollector::new(), config);
    let pawn = spawn_pawn(&mut scene, 1, 0.0);
    let trigger = spawn_trigger(&mut scene, 2, 5.0, 1.0);
    let queries_before = scene.backend().overlap_calls.get();

    scene
        .add_world_offset(pawn, Vec3::new(5.0, 0.0, 0.0), true, TeleportType::None)
        .unwrap();

    assert!(scene.is_overlapping_node(pawn, trigger));
    assert_eq!(scene.backend().overlap_test_calls.get(), 0);
    assert!(scene.backend().overlap_calls.get() > queries_before);
}

#[test]
fn test_entity_overlap_fires_once_for_many_components() {
    let mut scene = scene();
    let a = spawn_trigger(&mut scene, 1, 0.0, 1.0);
    let b = spawn_trigger(&mut scene, 1, 2.0, 1.0);
    let pawn = spawn_pawn(&mut scene, 2, 20.0);
    scene.handler_mut().clear();

    // Components of one entity never overlap each other
    assert!(!scene.is_overlapping_node(a, b));

    scene
        .set_world_location(pawn, Vec3::new(1.0, 0.0, 0.0), false, TeleportType::None)
        .unwrap();
    assert!(scene.is_overlapping_node(pawn, a));
    assert!(scene.is_overlapping_node(pawn, b));
    assert_eq!(component_begin_count(&scene, pawn), 2);
    assert_eq!(scene.handler().entity_begin_count(entity(2), entity(1)), 1);
    assert_eq!(scene.handler().entity_begin_count(entity(1), entity(2)), 1);
    assert_eq!(scene.overlapping_entities(entity(2)), vec![entity(1)]);

    // Leaving one component keeps the entities overlapping
    scene
        .set_world_location(pawn, Vec3::new(-0.2, 0.0, 0.0), false, TeleportType::None)
        .unwrap();
    assert!(!scene.is_overlapping_node(pawn, b));
    assert!(scene.is_overlapping_node(pawn, a));
    assert_eq!(component_end_count(&scene, pawn), 1);
    assert_eq!(scene.handler().entity_end_count(entity(2), entity(1)), 0);
    assert!(scene.entities_overlapping(entity(1), entity(2)));

    scene
        .set_world_location(pawn, Vec3::new(-10.0, 0.0, 0.0), false, TeleportType::None)
        .unwrap();
    assert_eq!(scene.handler().entity_end_count(entity(2), entity(1)), 1);
    assert_eq!(scene.handler().entity_end_count(entity(1), entity(2)), 1);
    assert!(!scene.entities_overlapping(entity(1), entity(2)));
}

#[test]
fn test_blocking_pairs_do_not_overlap() {
    let mut scene = scene();
    let pawn = spawn_pawn(&mut scene, 1, 0.0);
    let wall = scene.spawn(
        NodeDesc::new(at(0.5, 0.0, 0.0))
            .with_owner(entity(2))
            .with_primitive(wall_primitive(0.5).with_overlap_events(true)),
    );
    assert!(!scene.is_overlapping_node(pawn, wall));
    assert!(scene.overlaps(pawn).is_empty());
}

#[test]
fn test_no_overlap_without_events_on_either_side() {
    let mut scene = scene();
    let pawn = spawn_pawn(&mut scene, 1, 0.0);
    let quiet = scene.spawn(
        NodeDesc::new(at(0.5, 0.0, 0.0))
            .with_owner(entity(2))
            .with_primitive(trigger_primitive(1.0).with_overlap_events(false)),
    );
    assert!(!scene.is_overlapping_node(pawn, quiet));
}

#[test]
fn test_update_overlaps_is_idempotent() {
    let mut scene = scene();
    let pawn = spawn_pawn(&mut scene, 1, 0.0);
    spawn_trigger(&mut scene, 2, 0.5, 1.0);
    let before = scene.overlaps(pawn).to_vec();
    scene.handler_mut().clear();

    scene.update_overlaps(pawn, None, true, None).unwrap();
    scene.update_overlaps(pawn, None, true, None).unwrap();

    assert_eq!(scene.overlaps(pawn), before.as_slice());
    assert_eq!(scene.handler().overlap_event_count(), 0);
}

#[test]
fn test_failed_query_keeps_current_overlaps() {
    let mut scene = scene();
    let pawn = spawn_pawn(&mut scene, 1, 0.0);
    let trigger = spawn_trigger(&mut scene, 2, 0.5, 1.0);
    scene.handler_mut().clear();

    scene.backend_mut().fail_overlaps = true;
    scene
        .set_world_location(pawn, Vec3::new(50.0, 0.0, 0.0), false, TeleportType::None)
        .unwrap();

    assert!(scene.is_overlapping_node(pawn, trigger));
    assert_eq!(scene.handler().overlap_event_count(), 0);
}

#[test]
fn test_pending_overlaps_are_begun_first() {
    let mut scene = scene();
    let pawn = spawn_pawn(&mut scene, 1, 0.0);
    let trigger = spawn_trigger(&mut scene, 2, 30.0, 1.0);
    scene.handler_mut().clear();

    // Not overlapping at the current pose, so the diff ends it again
    let pending = [OverlapInfo::new(trigger, Some(entity(2)))];
    scene.update_overlaps(pawn, Some(&pending), true, None).unwrap();

    assert_eq!(component_begin_count(&scene, pawn), 1);
    assert_eq!(component_end_count(&scene, pawn), 1);
    assert!(scene.overlaps(pawn).is_empty());
}

#[test]
fn test_end_overlaps_reused_only_for_matching_transform() {
    let mut scene = scene();
    let pawn = spawn_pawn(&mut scene, 1, 0.0);
    let trigger = spawn_trigger(&mut scene, 2, 30.0, 1.0);
    let queries_before = scene.backend().overlap_calls.get();

    let end = EndOverlaps {
        transform: scene.world_transform(pawn).unwrap(),
        overlaps: vec![OverlapInfo::new(trigger, Some(entity(2)))],
    };
    scene.update_overlaps(pawn, None, true, Some(&end)).unwrap();
    assert!(scene.is_overlapping_node(pawn, trigger));
    assert_eq!(scene.backend().overlap_calls.get(), queries_before);

    let stale = EndOverlaps {
        transform: at(100.0, 0.0, 0.0),
        overlaps: Vec::new(),
    };
    scene.update_overlaps(pawn, None, true, Some(&stale)).unwrap();
    assert!(scene.backend().overlap_calls.get() > queries_before);
    // The fresh query does not see the distant trigger
    assert!(!scene.is_overlapping_node(pawn, trigger));
}

#[test]
fn test_disabling_overlap_events_clears_both_sides() {
    let mut scene = scene();
    let pawn = spawn_pawn(&mut scene, 1, 0.0);
    let trigger = spawn_trigger(&mut scene, 2, 0.5, 1.0);
    assert!(scene.is_overlapping_node(pawn, trigger));
    scene.handler_mut().clear();

    scene.set_generate_overlap_events(trigger, false).unwrap();

    assert!(scene.overlaps(pawn).is_empty());
    assert!(scene.overlaps(trigger).is_empty());
    assert_eq!(component_end_count(&scene, pawn), 1);
    assert_eq!(component_end_count(&scene, trigger), 1);
    assert_eq!(scene.handler().entity_end_count(entity(1), entity(2)), 1);
}

#[test]
fn test_disabling_collision_clears_overlaps() {
    let mut scene = scene();
    let pawn = spawn_pawn(&mut scene, 1, 0.0);
    let trigger = spawn_trigger(&mut scene, 2, 0.5, 1.0);

    scene
        .set_collision_enabled(pawn, CollisionEnabled::NoCollision)
        .unwrap();

    assert!(!scene.is_overlapping_node(trigger, pawn));
    assert!(scene.overlaps(pawn).is_empty());
}

#[test]
fn test_destroy_ends_overlaps() {
    let mut scene = scene();
    let pawn = spawn_pawn(&mut scene, 1, 0.0);
    let trigger = spawn_trigger(&mut scene, 2, 0.5, 1.0);
    scene.handler_mut().clear();

    scene.destroy_node(trigger).unwrap();

    assert!(scene.overlaps(pawn).is_empty());
    assert_eq!(component_end_count(&scene, pawn), 1);
    assert_eq!(scene.handler().entity_end_count(entity(1), entity(2)), 1);
    assert!(!scene.backend().bodies.contains_key(&trigger));

    // A later update does not bring it back
    scene.update_overlaps(pawn, None, true, None).unwrap();
    assert!(scene.overlaps(pawn).is_empty());
}

#[test]
fn test_kill_entity_ends_overlaps() {
    let mut scene = scene();
    let pawn = spawn_pawn(&mut scene, 1, 0.0);
    spawn_trigger(&mut scene, 2, 0.5, 1.0);
    spawn_trigger(&mut scene, 2, -0.5, 1.0);
    assert_eq!(scene.overlaps(pawn).len(), 2);
    scene.handler_mut().clear();

    scene.kill_entity(entity(2));

    assert!(scene.overlaps(pawn).is_empty());
    assert_eq!(scene.handler().entity_end_count(entity(1), entity(2)), 1);
    assert!(scene.is_entity_pending_kill(entity(2)));
}

#[test]
fn test_child_overlaps_follow_parent() {
    let mut scene = scene();
    let parent = scene.spawn(NodeDesc::new(at(0.0, 0.0, 0.0)).with_owner(entity(1)));
    let child = scene
        .spawn_child(
            parent,
            NodeDesc::new(Transform::IDENTITY)
                .with_owner(entity(1))
                .with_primitive(pawn_primitive(0.5)),
        )
        .unwrap();
    let trigger = spawn_trigger(&mut scene, 2, 10.0, 1.0);
    assert!(!scene.is_overlapping_node(child, trigger));

    scene
        .set_world_location(parent, Vec3::new(10.0, 0.0, 0.0), false, TeleportType::None)
        .unwrap();

    assert!(scene.is_overlapping_node(child, trigger));
    assert!(scene.is_overlapping_entity(trigger, entity(1)));
}
