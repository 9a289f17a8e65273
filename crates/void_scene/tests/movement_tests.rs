//! Swept movement against a mock collision backend

mod common;

use approx::assert_relative_eq;
use common::*;
use glam::{Quat, Vec3};
use void_scene::prelude::*;

fn scene() -> Scene<MockBackend> {
    init_logging();
    Scene::with_backend(MockBackend::new())
}

#[test]
fn test_blocking_hit_is_pulled_back() {
    let mut scene = scene();
    let pawn = spawn_pawn(&mut scene, 1, 0.0);
    let wall = spawn_wall(&mut scene, 20.0);

    let start = Vec3::ZERO;
    let end = Vec3::new(10.0, 0.0, 0.0);
    scene
        .backend()
        .script_sweep(vec![blocking_hit(start, end, 0.5, Some(wall))]);

    let result = scene
        .add_world_offset(pawn, end, true, TeleportType::None)
        .unwrap();

    assert!(result.moved);
    assert!(result.is_blocked());
    assert_relative_eq!(result.hit.time, 0.4989, epsilon = 1e-5);
    let location = scene.world_transform(pawn).unwrap().translation;
    assert_relative_eq!(location.x, 4.989, epsilon = 1e-4);
    assert_relative_eq!(result.hit.location.x, location.x, epsilon = 1e-6);
}

#[test]
fn test_no_hits_reaches_target_exactly() {
    let mut scene = scene();
    let pawn = spawn_pawn(&mut scene, 1, 0.0);
    scene.backend().script_sweep(Vec::new());

    let result = scene
        .add_world_offset(pawn, Vec3::new(10.0, 0.0, 0.0), true, TeleportType::None)
        .unwrap();

    assert!(result.moved);
    assert!(!result.is_blocked());
    assert_eq!(result.hit.time, 1.0);
    assert_eq!(
        scene.world_transform(pawn).unwrap().translation,
        Vec3::new(10.0, 0.0, 0.0)
    );
}

#[test]
fn test_analytic_wall_stops_sphere() {
    let mut scene = scene();
    let pawn = spawn_pawn(&mut scene, 1, 0.0);
    let wall = spawn_wall(&mut scene, 5.0);

    let result = scene
        .add_world_offset(pawn, Vec3::new(10.0, 0.0, 0.0), true, TeleportType::None)
        .unwrap();

    // Contact at 4.0, pulled back by 0.0011 of the move
    assert!(result.is_blocked());
    assert_eq!(result.hit.node, Some(wall));
    let x = scene.world_transform(pawn).unwrap().translation.x;
    assert_relative_eq!(x, 3.989, epsilon = 1e-3);
}

#[test]
fn test_blocking_hit_notifies_both_sides() {
    let mut scene = scene();
    let pawn = spawn_pawn(&mut scene, 1, 0.0);
    let wall = spawn_wall(&mut scene, 5.0);
    scene.handler_mut().clear();

    scene
        .add_world_offset(pawn, Vec3::new(10.0, 0.0, 0.0), true, TeleportType::None)
        .unwrap();

    let hits: Vec<_> = scene.handler().hits().copied().collect();
    assert_eq!(hits.len(), 2);

    let mover = hits.iter().find(|h| h.node == pawn).unwrap();
    assert!(mover.self_moved);
    assert_eq!(mover.other_node, Some(wall));
    assert_eq!(mover.normal_impulse, Vec3::ZERO);

    let other = hits.iter().find(|h| h.node == wall).unwrap();
    assert!(!other.self_moved);
    assert_eq!(other.other_node, Some(pawn));
    assert_eq!(other.other_entity, Some(entity(1)));
    assert!(other.normal.abs_diff_eq(-mover.normal, 1e-6));
}

#[test]
fn test_non_swept_move_passes_through() {
    let mut scene = scene();
    let pawn = spawn_pawn(&mut scene, 1, 0.0);
    spawn_wall(&mut scene, 5.0);

    let result = scene
        .add_world_offset(pawn, Vec3::new(10.0, 0.0, 0.0), false, TeleportType::None)
        .unwrap();

    assert!(result.moved);
    assert!(!result.is_blocked());
    assert_eq!(scene.backend().sweep_calls.get(), 0);
    assert_eq!(scene.world_transform(pawn).unwrap().translation.x, 10.0);
}

#[test]
fn test_moving_out_of_initial_penetration_is_allowed() {
    let mut scene = scene();
    let pawn = spawn_pawn(&mut scene, 1, 0.0);
    spawn_wall(&mut scene, 0.8);

    // Into the wall: blocked at the start
    let into = scene
        .add_world_offset(pawn, Vec3::new(5.0, 0.0, 0.0), true, TeleportType::None)
        .unwrap();
    assert!(into.is_blocked());
    assert!(!into.moved);
    assert_eq!(scene.world_transform(pawn).unwrap().translation, Vec3::ZERO);

    // Away from the wall: the penetrating hit is ignored
    let away = scene
        .add_world_offset(pawn, Vec3::new(-5.0, 0.0, 0.0), true, TeleportType::None)
        .unwrap();
    assert!(away.moved);
    assert!(!away.is_blocked());
    assert_eq!(scene.world_transform(pawn).unwrap().translation.x, -5.0);
}

#[test]
fn test_static_node_does_not_move() {
    let mut scene = scene();
    let node = scene.spawn(
        NodeDesc::new(at(1.0, 0.0, 0.0))
            .with_mobility(Mobility::Static)
            .with_primitive(wall_primitive(0.5)),
    );

    let result = scene
        .add_world_offset(node, Vec3::new(3.0, 0.0, 0.0), true, TeleportType::None)
        .unwrap();

    assert!(!result.moved);
    assert_eq!(scene.world_transform(node).unwrap().translation.x, 1.0);
}

#[test]
fn test_zero_move_is_a_no_op() {
    let mut scene = scene();
    let pawn = spawn_pawn(&mut scene, 1, 0.0);

    let result = scene
        .move_component(pawn, Vec3::ZERO, Quat::IDENTITY, true, TeleportType::None)
        .unwrap();

    assert!(!result.moved);
    assert_eq!(scene.backend().sweep_calls.get(), 0);
}

#[test]
fn test_rotation_only_move() {
    let mut scene = scene();
    let pawn = spawn_pawn(&mut scene, 1, 0.0);
    let rotation = Quat::from_rotation_y(1.0);

    let result = scene
        .set_world_rotation(pawn, rotation, true, TeleportType::None)
        .unwrap();

    assert!(result.moved);
    let world = scene.world_transform(pawn).unwrap();
    assert!(world.rotation.abs_diff_eq(rotation, 1e-5));
    assert_eq!(world.translation, Vec3::ZERO);
}

#[test]
fn test_non_finite_delta_rejected() {
    let mut scene = scene();
    let pawn = spawn_pawn(&mut scene, 1, 0.0);

    let result = scene.add_world_offset(
        pawn,
        Vec3::new(f32::NAN, 0.0, 0.0),
        true,
        TeleportType::None,
    );
    assert!(matches!(result, Err(SceneError::InvalidTransform(_))));
}

#[test]
fn test_sweep_ignores_own_entity_and_configured_ignores() {
    let mut scene = scene();
    let ignored = entity(9);
    let pawn = scene.spawn(
        NodeDesc::new(at(0.0, 0.0, 0.0))
            .with_owner(entity(1))
            .with_primitive(pawn_primitive(0.5).ignore_entity_when_moving(ignored)),
    );

    scene
        .add_world_offset(pawn, Vec3::new(2.0, 0.0, 0.0), true, TeleportType::None)
        .unwrap();

    let params = scene.backend().last_params.borrow().clone().unwrap();
    assert_eq!(params.querying_node, Some(pawn));
    assert!(params.ignored_nodes.contains(&pawn));
    assert!(params.ignored_entities.contains(&entity(1)));
    assert!(params.ignored_entities.contains(&ignored));
    assert!(!params.ignore_touches);
}

#[test]
fn test_sweep_without_overlap_events_ignores_touches() {
    let mut scene = scene();
    let pawn = scene.spawn(
        NodeDesc::new(at(0.0, 0.0, 0.0))
            .with_primitive(pawn_primitive(0.5).with_overlap_events(false)),
    );

    scene
        .add_world_offset(pawn, Vec3::new(2.0, 0.0, 0.0), true, TeleportType::None)
        .unwrap();

    let params = scene.backend().last_params.borrow().clone().unwrap();
    assert!(params.ignore_touches);
}

#[test]
fn test_child_follows_parent_move() {
    let mut scene = scene();
    let parent = scene.spawn(NodeDesc::new(at(0.0, 0.0, 0.0)));
    let child = scene
        .spawn_child(parent, NodeDesc::new(at(1.0, 0.0, 0.0)).with_primitive(pawn_primitive(0.5)))
        .unwrap();

    scene
        .set_world_location(parent, Vec3::new(0.0, 3.0, 0.0), false, TeleportType::None)
        .unwrap();

    let world = scene.world_transform(child).unwrap();
    assert!(world.translation.abs_diff_eq(Vec3::new(1.0, 3.0, 0.0), 1e-6));
    assert_eq!(
        scene.backend().bodies[&child].transform.translation,
        world.translation
    );
}

#[test]
fn test_set_relative_transform_applies_scale() {
    let mut scene = scene();
    let pawn = spawn_pawn(&mut scene, 1, 0.0);

    let target = at(2.0, 0.0, 0.0).with_scale(Vec3::splat(2.0));
    let result = scene
        .set_relative_transform(pawn, target, true, TeleportType::None)
        .unwrap();

    assert!(result.moved);
    let world = scene.world_transform(pawn).unwrap();
    assert_eq!(world.translation.x, 2.0);
    assert_eq!(world.scale, Vec3::splat(2.0));
}

#[test]
fn test_add_relative_location_uses_parent_space() {
    let mut scene = scene();
    let parent = scene.spawn(NodeDesc::new(Transform::from_translation_rotation(
        Vec3::ZERO,
        Quat::from_rotation_z(core::f32::consts::FRAC_PI_2),
    )));
    let child = scene.spawn_child(parent, NodeDesc::new(Transform::IDENTITY)).unwrap();

    scene
        .add_relative_location(child, Vec3::new(1.0, 0.0, 0.0), false, TeleportType::None)
        .unwrap();

    let world = scene.world_transform(child).unwrap();
    assert!(world.translation.abs_diff_eq(Vec3::new(0.0, 1.0, 0.0), 1e-5));
}

#[test]
fn test_pending_kill_node_does_not_move() {
    let mut scene = scene();
    let pawn = spawn_pawn(&mut scene, 1, 0.0);
    scene.destroy_node(pawn).unwrap();

    let result = scene
        .add_world_offset(pawn, Vec3::new(1.0, 0.0, 0.0), true, TeleportType::None)
        .unwrap();
    assert!(!result.moved);
}
