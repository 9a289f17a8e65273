//! The scene: node storage, hierarchy and transform propagation
//!
//! Nodes live in a generational arena. Parent and children are stored as
//! handles, so detaching or destroying a node can never leave a dangling
//! reference; stale handles simply fail to resolve.
//!
//! World transforms are propagated eagerly on every transform change
//! (parent first, then children in attach order) and pulled lazily when a
//! subtree was only marked dirty with
//! [`Scene::set_relative_transform_deferred`].

use std::collections::HashSet;

use log::{debug, trace, warn};
use void_collision::{
    BodyState, CollisionBackend, CollisionChannel, CollisionEnabled, CollisionProfile,
    CollisionResponse, CollisionShape,
};
use void_core::{EntityId, NodeArena, NodeId, Transform};

use crate::commands::{CommandQueue, SceneCommand};
use crate::config::SceneConfig;
use crate::error::{Result, SceneError};
use crate::events::{EventCollector, SceneEvent, SceneEventHandler};
use crate::node::{
    AttachmentRule, DetachmentRule, Mobility, NodeDesc, SceneNode, TeleportType,
    UpdateTransformFlags,
};
use crate::primitive::Primitive;

/// Scene hierarchy bound to a collision backend and an event handler
pub struct Scene<B: CollisionBackend, H: SceneEventHandler = EventCollector> {
    pub(crate) nodes: NodeArena<SceneNode>,
    pub(crate) backend: B,
    pub(crate) handler: H,
    pub(crate) config: SceneConfig,
    pub(crate) commands: CommandQueue,
    pub(crate) dead_entities: HashSet<EntityId>,
    flushing: bool,
}

impl<B: CollisionBackend> Scene<B, EventCollector> {
    /// Create a scene that collects events into an [`EventCollector`]
    pub fn with_backend(backend: B) -> Self {
        Self::new(backend, EventCollector::new(), SceneConfig::default())
    }
}

impl<B: CollisionBackend, H: SceneEventHandler> Scene<B, H> {
    /// Create an empty scene
    pub fn new(backend: B, handler: H, config: SceneConfig) -> Self {
        Self {
            nodes: NodeArena::new(),
            backend,
            handler,
            config,
            commands: CommandQueue::new(),
            dead_entities: HashSet::new(),
            flushing: false,
        }
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Number of live nodes, pending-kill ones included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Check whether a handle refers to a live node
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(id)
    }

    /// Get a node by handle
    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    /// Primitive of a node
    pub fn primitive(&self, id: NodeId) -> Option<&Primitive> {
        self.nodes.get(id)?.primitive.as_ref()
    }

    /// Iterate over live nodes
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.nodes.iter()
    }

    pub(crate) fn node_ref(&self, id: NodeId) -> Result<&SceneNode> {
        self.nodes.get(id).ok_or(SceneError::NodeNotFound(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut SceneNode> {
        self.nodes.get_mut(id).ok_or(SceneError::NodeNotFound(id))
    }

    pub(crate) fn owner_of(&self, id: NodeId) -> Option<EntityId> {
        self.nodes.get(id).and_then(|n| n.owner)
    }

    pub(crate) fn emit(&mut self, event: SceneEvent) {
        trace!("Scene event: {:?}", event);
        self.handler.handle(&event, &mut self.commands);
    }

    // ---------------------------------------------------------------------
    // Spawning
    // ---------------------------------------------------------------------

    /// Spawn a root node and register its collision body
    pub fn spawn(&mut self, desc: NodeDesc) -> NodeId {
        let id = self.spawn_inner(desc);
        self.flush_commands();
        id
    }

    /// Spawn a node with a collision primitive
    pub fn spawn_primitive(
        &mut self,
        transform: Transform,
        owner: Option<EntityId>,
        primitive: Primitive,
    ) -> NodeId {
        let mut desc = NodeDesc::new(transform).with_primitive(primitive);
        desc.owner = owner;
        self.spawn(desc)
    }

    /// Spawn a node and attach it beneath `parent`, keeping `desc.transform`
    /// as the relative transform
    pub fn spawn_child(&mut self, parent: NodeId, desc: NodeDesc) -> Result<NodeId> {
        let result = self.spawn_child_inner(parent, desc);
        self.flush_commands();
        result
    }

    /// Link the new node beneath `parent` before its transform and overlaps
    /// are first evaluated, so they are only ever seen at the final pose
    fn spawn_child_inner(&mut self, parent: NodeId, desc: NodeDesc) -> Result<NodeId> {
        self.world_transform_inner(parent)?;
        let parent_node = self.node_ref(parent)?;
        if parent_node.pending_kill {
            return Err(SceneError::PendingKill(parent));
        }
        let parent_mobility = parent_node.mobility;
        let child_mobility = desc.mobility;

        let id = self.nodes.insert(SceneNode::from_desc(desc));
        if child_mobility == Mobility::Static && parent_mobility == Mobility::Movable {
            // Not yet synced or overlapped, so nothing else refers to it
            self.nodes.remove(id);
            warn!("Static node cannot be spawned beneath movable {:?}", parent);
            return Err(SceneError::MobilityMismatch { child: id, parent });
        }

        self.node_mut(parent)?.children.push(id);
        self.node_mut(id)?.parent = Some(parent);
        debug!("Spawned node {:?} beneath {:?}", id, parent);

        self.update_local_to_world_inner(id, UpdateTransformFlags::empty(), TeleportType::None);
        self.update_overlaps_inner(id, None, true, None);
        Ok(id)
    }

    fn spawn_inner(&mut self, desc: NodeDesc) -> NodeId {
        let id = self.nodes.insert(SceneNode::from_desc(desc));
        debug!("Spawned node {:?}", id);
        self.update_local_to_world_inner(id, UpdateTransformFlags::empty(), TeleportType::None);
        self.update_overlaps_inner(id, None, true, None);
        id
    }

    // ---------------------------------------------------------------------
    // Hierarchy
    // ---------------------------------------------------------------------

    /// Parent of a node
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id)?.parent
    }

    /// Children of a node, in attach order
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.nodes.get(id) {
            Some(node) => &node.children,
            None => &[],
        }
    }

    /// Every descendant of a node, depth-first, parents before children
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            result.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        result
    }

    /// Check whether `ancestor` is a strict ancestor of `node`
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.parent(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Topmost ancestor of a node (the node itself for roots)
    pub fn root_of(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    /// Attach `child` beneath `parent`.
    ///
    /// # Errors
    ///
    /// Fails without changing anything if either node is missing or pending
    /// kill, if `child == parent`, if `parent` is a descendant of `child`,
    /// or if a static node would end up beneath a movable one.
    pub fn attach_to(&mut self, child: NodeId, parent: NodeId, rule: AttachmentRule) -> Result<()> {
        let result = self.attach_inner(child, parent, rule);
        self.flush_commands();
        result
    }

    pub(crate) fn attach_inner(
        &mut self,
        child: NodeId,
        parent: NodeId,
        rule: AttachmentRule,
    ) -> Result<()> {
        let child_node = self.node_ref(child)?;
        let parent_node = self
            .nodes
            .get(parent)
            .ok_or(SceneError::InvalidParent { child, parent })?;

        if child == parent {
            debug!("Rejected attaching {:?} to itself", child);
            return Err(SceneError::SelfAttachment(child));
        }
        if child_node.pending_kill {
            return Err(SceneError::PendingKill(child));
        }
        if parent_node.pending_kill {
            return Err(SceneError::PendingKill(parent));
        }
        if child_node.mobility == Mobility::Static && parent_node.mobility == Mobility::Movable {
            warn!("Static node {:?} cannot be attached to movable {:?}", child, parent);
            return Err(SceneError::MobilityMismatch { child, parent });
        }
        if self.is_ancestor(child, parent) {
            debug!("Rejected attaching {:?} to its descendant {:?}", child, parent);
            return Err(SceneError::CycleDetected { child, parent });
        }
        if child_node.parent == Some(parent) {
            return Ok(());
        }

        let child_world = self.world_transform_inner(child)?;
        let parent_world = self.world_transform_inner(parent)?;

        self.unlink_from_parent(child);
        self.node_mut(parent)?.children.push(child);

        let node = self.node_mut(child)?;
        node.parent = Some(parent);
        node.relative = match rule {
            AttachmentRule::KeepRelative => node.relative,
            AttachmentRule::KeepWorld => child_world.relative_to(&parent_world),
            AttachmentRule::SnapToTarget => Transform::IDENTITY,
        };
        debug!("Attached {:?} to {:?} ({:?})", child, parent, rule);

        self.update_local_to_world_inner(
            child,
            UpdateTransformFlags::empty(),
            TeleportType::TeleportPhysics,
        );
        self.update_overlaps_inner(child, None, true, None);
        Ok(())
    }

    /// Detach a node from its parent. Detaching a root is a no-op.
    pub fn detach(&mut self, id: NodeId, rule: DetachmentRule) -> Result<()> {
        let result = self.detach_inner(id, rule);
        self.flush_commands();
        result
    }

    pub(crate) fn detach_inner(&mut self, id: NodeId, rule: DetachmentRule) -> Result<()> {
        if self.node_ref(id)?.parent.is_none() {
            return Ok(());
        }
        let world = self.world_transform_inner(id)?;
        self.unlink_from_parent(id);

        let node = self.node_mut(id)?;
        node.relative = match rule {
            DetachmentRule::KeepWorld => world,
            DetachmentRule::KeepRelative => node.relative,
            DetachmentRule::Reset => Transform::IDENTITY,
        };
        debug!("Detached {:?} ({:?})", id, rule);

        if !self.node_ref(id)?.pending_kill {
            self.update_local_to_world_inner(
                id,
                UpdateTransformFlags::empty(),
                TeleportType::TeleportPhysics,
            );
            self.update_overlaps_inner(id, None, true, None);
        }
        Ok(())
    }

    /// Remove `id` from its parent's children and clear its parent link
    fn unlink_from_parent(&mut self, id: NodeId) {
        let Some(parent) = self.nodes.get_mut(id).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.retain(|c| *c != id);
        }
    }

    // ---------------------------------------------------------------------
    // Transforms
    // ---------------------------------------------------------------------

    /// Relative transform of a node
    pub fn relative_transform(&self, id: NodeId) -> Option<Transform> {
        Some(self.nodes.get(id)?.relative)
    }

    /// Cached world transform, without recomputing a dirty subtree
    pub fn cached_world_transform(&self, id: NodeId) -> Option<Transform> {
        Some(self.nodes.get(id)?.world)
    }

    /// World transform of a node, recomputing it first if it is dirty
    pub fn world_transform(&mut self, id: NodeId) -> Result<Transform> {
        let result = self.world_transform_inner(id);
        self.flush_commands();
        result
    }

    pub(crate) fn world_transform_inner(&mut self, id: NodeId) -> Result<Transform> {
        let node = self.node_ref(id)?;
        if node.world_valid {
            return Ok(node.world);
        }

        // A dirty node's whole subtree is dirty, so updating from the
        // topmost dirty ancestor refreshes everything in between
        let mut top = id;
        let mut current = node.parent;
        while let Some(parent) = current {
            let parent_node = self.node_ref(parent)?;
            if !parent_node.world_valid {
                top = parent;
            }
            current = parent_node.parent;
        }
        self.update_local_to_world_inner(top, UpdateTransformFlags::empty(), TeleportType::None);
        Ok(self.node_ref(id)?.world)
    }

    pub(crate) fn parent_world_transform(&mut self, id: NodeId) -> Result<Option<Transform>> {
        match self.node_ref(id)?.parent {
            Some(parent) => Ok(Some(self.world_transform_inner(parent)?)),
            None => Ok(None),
        }
    }

    /// Set the relative transform and mark the subtree dirty without
    /// propagating; the next [`world_transform`](Self::world_transform)
    /// call on any node in the subtree recomputes it.
    pub fn set_relative_transform_deferred(&mut self, id: NodeId, transform: Transform) -> Result<()> {
        let node = self.node_ref(id)?;
        if node.mobility == Mobility::Static {
            warn!("Static node {:?} cannot be re-transformed", id);
            return Err(SceneError::StaticMobility(id));
        }
        if !transform.is_finite() {
            return Err(SceneError::InvalidTransform(id));
        }
        self.node_mut(id)?.relative = transform;
        self.mark_subtree_dirty(id);
        Ok(())
    }

    fn mark_subtree_dirty(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(current) {
                node.world_valid = false;
                stack.extend(node.children.iter().copied());
            }
        }
    }

    /// Recompute the world transform of a node and every descendant.
    ///
    /// Unless `PROPAGATE_FROM_PARENT` is set, a dirty parent chain is
    /// refreshed first so the node never reads a stale parent transform.
    pub fn update_local_to_world(
        &mut self,
        id: NodeId,
        flags: UpdateTransformFlags,
        teleport: TeleportType,
    ) -> Result<()> {
        if !flags.contains(UpdateTransformFlags::PROPAGATE_FROM_PARENT) {
            self.parent_world_transform(id)?;
        }
        self.node_ref(id)?;
        self.update_local_to_world_inner(id, flags, teleport);
        self.flush_commands();
        Ok(())
    }

    /// Recompute `id` from its parent's cached world transform, then recurse
    /// into children. The parent must already be valid.
    pub(crate) fn update_local_to_world_inner(
        &mut self,
        id: NodeId,
        flags: UpdateTransformFlags,
        teleport: TeleportType,
    ) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        let parent_world = node
            .parent
            .and_then(|p| self.nodes.get(p))
            .map(|p| p.world);
        let world = match parent_world {
            Some(parent_world) => parent_world * node.relative,
            None => node.relative,
        };

        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        node.world = world;
        node.world_valid = true;
        let children = node.children.clone();

        self.on_update_transform(id, flags, teleport);

        let child_flags = flags | UpdateTransformFlags::PROPAGATE_FROM_PARENT;
        for child in children {
            if self.nodes.get(child).is_some_and(|c| !c.pending_kill) {
                self.update_local_to_world_inner(child, child_flags, teleport);
            }
        }
    }

    /// Per-node hook after the world transform has been recomputed
    fn on_update_transform(&mut self, id: NodeId, flags: UpdateTransformFlags, teleport: TeleportType) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        let wants_callback = node.wants_transform_callback;
        if !flags.contains(UpdateTransformFlags::SKIP_PHYSICS_UPDATE) {
            self.sync_body(id);
        }
        if wants_callback {
            self.emit(SceneEvent::TransformUpdated { node: id, teleport });
        }
    }

    /// Push the node's current collision state to the backend
    pub(crate) fn sync_body(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        if node.pending_kill {
            return;
        }
        let Some(primitive) = node.primitive.as_ref() else {
            return;
        };
        let body = BodyState {
            node: id,
            entity: node.owner,
            shape: primitive.shape.scaled(node.world.scale),
            transform: node.world,
            profile: primitive.profile,
        };
        self.backend.sync_body(&body);
    }

    /// Commit a new world location and rotation, converting to the parent's
    /// space. Returns whether the relative transform changed.
    pub(crate) fn internal_set_world_location_and_rotation(
        &mut self,
        id: NodeId,
        location: glam::Vec3,
        rotation: glam::Quat,
        teleport: TeleportType,
    ) -> Result<bool> {
        let parent_world = self.parent_world_transform(id)?;
        let (relative_location, relative_rotation) = match parent_world {
            Some(parent) => (
                parent.inverse_transform_point(location),
                (parent.rotation.inverse() * rotation).normalize(),
            ),
            None => (location, rotation.normalize()),
        };

        let node = self.node_mut(id)?;
        let changed = node.relative.translation != relative_location
            || !void_core::rotations_equal(node.relative.rotation, relative_rotation, 1e-6);
        if changed {
            node.relative.translation = relative_location;
            node.relative.rotation = relative_rotation;
            self.update_local_to_world_inner(id, UpdateTransformFlags::empty(), teleport);
        }
        Ok(changed)
    }

    // ---------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------

    /// Mark a node for destruction.
    ///
    /// Its overlaps end (with notifications), its children move to its
    /// parent keeping their world transforms (or become roots), it is
    /// detached and its backend body is removed. The slot is freed by
    /// [`collect_garbage`](Self::collect_garbage).
    pub fn destroy_node(&mut self, id: NodeId) -> Result<()> {
        let result = self.destroy_inner(id);
        self.flush_commands();
        result
    }

    pub(crate) fn destroy_inner(&mut self, id: NodeId) -> Result<()> {
        let node = self.node_ref(id)?;
        if node.pending_kill {
            return Ok(());
        }
        let parent = node.parent;
        let children = node.children.clone();

        self.node_mut(id)?.pending_kill = true;
        debug!("Destroying node {:?}", id);

        self.clear_overlaps_inner(id, true);

        for child in children {
            let reattached = match parent {
                Some(parent) => self.attach_inner(child, parent, AttachmentRule::KeepWorld),
                None => Err(SceneError::NodeNotFound(id)),
            };
            if reattached.is_err() {
                self.detach_inner(child, DetachmentRule::KeepWorld)?;
            }
        }

        self.detach_inner(id, DetachmentRule::KeepWorld)?;
        self.backend.remove_body(id);
        Ok(())
    }

    /// Free the slots of every pending-kill node. Returns how many were freed.
    pub fn collect_garbage(&mut self) -> usize {
        let dead: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|(_, n)| n.pending_kill)
            .map(|(id, _)| id)
            .collect();
        for id in &dead {
            self.nodes.remove(*id);
        }
        if !dead.is_empty() {
            debug!("Collected {} destroyed node(s)", dead.len());
        }
        dead.len()
    }

    /// Mark an entity pending kill and destroy every node it owns
    pub fn kill_entity(&mut self, entity: EntityId) {
        self.dead_entities.insert(entity);
        let owned: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|(_, n)| n.owner == Some(entity))
            .map(|(id, _)| id)
            .collect();
        for id in owned {
            if let Err(e) = self.destroy_inner(id) {
                warn!("Failed to destroy {:?} of entity {}: {}", id, entity, e);
            }
        }
        self.flush_commands();
    }

    pub fn is_entity_pending_kill(&self, entity: EntityId) -> bool {
        self.dead_entities.contains(&entity)
    }

    /// A node is pending kill itself or through its owning entity
    pub fn is_pending_kill(&self, id: NodeId) -> bool {
        match self.nodes.get(id) {
            Some(node) => {
                node.pending_kill || node.owner.is_some_and(|e| self.dead_entities.contains(&e))
            }
            None => true,
        }
    }

    // ---------------------------------------------------------------------
    // Node settings
    // ---------------------------------------------------------------------

    /// Show or hide a node, optionally applying the same to every descendant
    pub fn set_visibility(&mut self, id: NodeId, visible: bool, propagate_to_children: bool) -> Result<()> {
        self.node_mut(id)?.visible = visible;
        if propagate_to_children {
            for child in self.descendants(id) {
                if let Some(node) = self.nodes.get_mut(child) {
                    node.visible = visible;
                }
            }
        }
        Ok(())
    }

    /// Change a node's mobility. A static node can never sit beneath a
    /// movable one, in either direction of the change.
    pub fn set_mobility(&mut self, id: NodeId, mobility: Mobility) -> Result<()> {
        let node = self.node_ref(id)?;
        if mobility == Mobility::Static {
            if let Some(parent) = node.parent {
                if self.node_ref(parent)?.mobility == Mobility::Movable {
                    warn!("Static node {:?} cannot be beneath movable {:?}", id, parent);
                    return Err(SceneError::MobilityMismatch { child: id, parent });
                }
            }
        }
        if mobility == Mobility::Movable {
            let static_child = node
                .children
                .iter()
                .copied()
                .find(|c| self.nodes.get(*c).is_some_and(|n| n.mobility == Mobility::Static));
            if let Some(child) = static_child {
                warn!("Movable {:?} cannot hold static child {:?}", id, child);
                return Err(SceneError::MobilityMismatch { child, parent: id });
            }
        }
        self.node_mut(id)?.mobility = mobility;
        Ok(())
    }

    /// Enable or disable [`SceneEvent::TransformUpdated`] for a node
    pub fn set_wants_transform_callback(&mut self, id: NodeId, enabled: bool) -> Result<()> {
        self.node_mut(id)?.wants_transform_callback = enabled;
        Ok(())
    }

    fn primitive_mut(&mut self, id: NodeId) -> Result<&mut Primitive> {
        self.node_mut(id)?
            .primitive
            .as_mut()
            .ok_or(SceneError::NotAPrimitive(id))
    }

    /// Apply a collision-setting change, resync the backend and re-evaluate
    /// overlaps so a disabled primitive drops its overlaps
    fn change_collision_settings(
        &mut self,
        id: NodeId,
        change: impl FnOnce(&mut Primitive),
    ) -> Result<()> {
        if self.node_ref(id)?.pending_kill {
            return Err(SceneError::PendingKill(id));
        }
        change(self.primitive_mut(id)?);
        self.sync_body(id);
        self.update_overlaps_inner(id, None, true, None);
        Ok(())
    }

    pub fn set_collision_enabled(&mut self, id: NodeId, enabled: CollisionEnabled) -> Result<()> {
        let result = self.change_collision_settings(id, |p| p.profile.enabled = enabled);
        self.flush_commands();
        result
    }

    pub fn set_generate_overlap_events(&mut self, id: NodeId, enabled: bool) -> Result<()> {
        let result = self.change_collision_settings(id, |p| p.generate_overlap_events = enabled);
        self.flush_commands();
        result
    }

    pub fn set_collision_response_to_channel(
        &mut self,
        id: NodeId,
        channel: CollisionChannel,
        response: CollisionResponse,
    ) -> Result<()> {
        let result = self.change_collision_settings(id, |p| p.profile.responses.set(channel, response));
        self.flush_commands();
        result
    }

    pub fn set_collision_profile(&mut self, id: NodeId, profile: CollisionProfile) -> Result<()> {
        let result = self.change_collision_settings(id, |p| p.profile = profile);
        self.flush_commands();
        result
    }

    pub fn set_collision_shape(&mut self, id: NodeId, shape: CollisionShape) -> Result<()> {
        let result = self.change_collision_settings(id, |p| p.shape = shape);
        self.flush_commands();
        result
    }

    // ---------------------------------------------------------------------
    // Deferred commands
    // ---------------------------------------------------------------------

    /// Commands queued by handlers and not yet applied
    pub fn pending_commands(&self) -> &CommandQueue {
        &self.commands
    }

    /// Apply queued commands until the queue is empty or the pass limit is hit
    pub(crate) fn flush_commands(&mut self) {
        if self.flushing {
            return;
        }
        self.flushing = true;

        let mut passes = 0;
        while !self.commands.is_empty() {
            if passes >= self.config.max_command_passes {
                warn!(
                    "Dropping {} scene command(s) after {} flush passes",
                    self.commands.len(),
                    passes
                );
                self.commands.clear();
                break;
            }
            passes += 1;
            for command in self.commands.take() {
                self.apply_command(command);
            }
        }

        self.flushing = false;
    }

    fn apply_command(&mut self, command: SceneCommand) {
        trace!("Applying {:?}", command);
        let result = match command {
            SceneCommand::Attach {
                child,
                parent,
                rule,
            } => self.attach_inner(child, parent, rule),
            SceneCommand::Detach { node, rule } => self.detach_inner(node, rule),
            SceneCommand::SetRelativeTransform {
                node,
                transform,
                sweep,
                teleport,
            } => self
                .set_relative_transform_inner(node, transform, sweep, teleport)
                .map(|_| ()),
            SceneCommand::Move {
                node,
                delta,
                rotation,
                sweep,
                teleport,
            } => self.world_transform_inner(node).and_then(|world| {
                let rotation = rotation.unwrap_or(world.rotation);
                self.move_component_inner(node, delta, rotation, sweep, teleport)
                    .map(|_| ())
            }),
            SceneCommand::Destroy { node } => self.destroy_inner(node),
            SceneCommand::SetGenerateOverlapEvents { node, enabled } => {
                self.change_collision_settings(node, |p| p.generate_overlap_events = enabled)
            }
            SceneCommand::UpdateOverlaps { node } => {
                if self.nodes.contains(node) {
                    self.update_overlaps_inner(node, None, true, None);
                    Ok(())
                } else {
                    Err(SceneError::NodeNotFound(node))
                }
            }
        };
        if let Err(e) = result {
            warn!("Deferred scene command failed: {}", e);
        }
    }
}
