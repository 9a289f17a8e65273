//! Scene events
//!
//! Overlap, hit and transform notifications are emitted as [`SceneEvent`]
//! values and delivered synchronously to the scene's [`SceneEventHandler`].
//! Handlers cannot borrow the scene; mutations they request go through the
//! [`CommandQueue`] and run once the current operation has finished.

use crossbeam_channel::{Receiver, Sender, TrySendError};
use glam::Vec3;
use log::debug;
use void_collision::HitResult;
use void_core::{EntityId, NodeId};

use crate::commands::CommandQueue;
use crate::node::TeleportType;

/// A blocking hit delivered to one participant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitEvent {
    /// Node receiving the notification
    pub node: NodeId,
    pub entity: Option<EntityId>,
    pub other_node: Option<NodeId>,
    pub other_entity: Option<EntityId>,
    /// `node` was the one moving
    pub self_moved: bool,
    pub location: Vec3,
    pub normal: Vec3,
    /// Always zero for kinematic moves
    pub normal_impulse: Vec3,
    /// The hit as seen from `node`
    pub hit: HitResult,
}

/// Notification emitted by the scene
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    /// A component pair started overlapping; emitted once per side
    ComponentBeginOverlap {
        node: NodeId,
        other_node: NodeId,
        other_entity: Option<EntityId>,
        from_sweep: bool,
        sweep_hit: Option<HitResult>,
    },
    /// A component pair stopped overlapping; emitted once per side
    ComponentEndOverlap {
        node: NodeId,
        other_node: NodeId,
        other_entity: Option<EntityId>,
    },
    /// First component pair between two entities started overlapping
    EntityBeginOverlap { entity: EntityId, other_entity: EntityId },
    /// Last component pair between two entities stopped overlapping
    EntityEndOverlap { entity: EntityId, other_entity: EntityId },
    /// Blocking hit from a swept move
    Hit(HitEvent),
    /// World transform of a node that asked for callbacks was recomputed
    TransformUpdated { node: NodeId, teleport: TeleportType },
}

impl SceneEvent {
    /// Check if this is an entity-level begin for `entity` against `other`
    pub fn is_entity_begin(&self, entity: EntityId, other: EntityId) -> bool {
        matches!(self, Self::EntityBeginOverlap { entity: e, other_entity: o } if *e == entity && *o == other)
    }

    /// Check if this is an entity-level end for `entity` against `other`
    pub fn is_entity_end(&self, entity: EntityId, other: EntityId) -> bool {
        matches!(self, Self::EntityEndOverlap { entity: e, other_entity: o } if *e == entity && *o == other)
    }
}

/// Receives scene events as they happen
pub trait SceneEventHandler {
    /// Called synchronously for every event
    fn handle(&mut self, event: &SceneEvent, commands: &mut CommandQueue);
}

/// Discards every event
impl SceneEventHandler for () {
    fn handle(&mut self, _event: &SceneEvent, _commands: &mut CommandQueue) {}
}

/// Default event handler that collects events into a buffer
#[derive(Debug, Default)]
pub struct EventCollector {
    pub events: Vec<SceneEvent>,
}

impl EventCollector {
    /// Create a new event collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all collected events
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Take all collected events
    pub fn drain(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Component-level begin events
    pub fn component_begins(&self) -> impl Iterator<Item = &SceneEvent> {
        self.events
            .iter()
            .filter(|e| matches!(e, SceneEvent::ComponentBeginOverlap { .. }))
    }

    /// Component-level end events
    pub fn component_ends(&self) -> impl Iterator<Item = &SceneEvent> {
        self.events
            .iter()
            .filter(|e| matches!(e, SceneEvent::ComponentEndOverlap { .. }))
    }

    /// Hit events
    pub fn hits(&self) -> impl Iterator<Item = &HitEvent> {
        self.events.iter().filter_map(|e| match e {
            SceneEvent::Hit(hit) => Some(hit),
            _ => None,
        })
    }

    /// Number of entity-level begins for `entity` against `other`
    pub fn entity_begin_count(&self, entity: EntityId, other: EntityId) -> usize {
        self.events.iter().filter(|e| e.is_entity_begin(entity, other)).count()
    }

    /// Number of entity-level ends for `entity` against `other`
    pub fn entity_end_count(&self, entity: EntityId, other: EntityId) -> usize {
        self.events.iter().filter(|e| e.is_entity_end(entity, other)).count()
    }

    /// Number of overlap events of any kind
    pub fn overlap_event_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| !matches!(e, SceneEvent::Hit(_) | SceneEvent::TransformUpdated { .. }))
            .count()
    }
}

impl SceneEventHandler for EventCollector {
    fn handle(&mut self, event: &SceneEvent, _commands: &mut CommandQueue) {
        self.events.push(event.clone());
    }
}

/// Forwards events over a crossbeam channel
pub struct ChannelEventHandler {
    sender: Sender<SceneEvent>,
    disconnected: bool,
}

impl ChannelEventHandler {
    /// Create a handler backed by an unbounded channel
    pub fn unbounded() -> (Self, Receiver<SceneEvent>) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        (Self::new(sender), receiver)
    }

    /// Wrap an existing sender
    pub fn new(sender: Sender<SceneEvent>) -> Self {
        Self {
            sender,
            disconnected: false,
        }
    }
}

impl SceneEventHandler for ChannelEventHandler {
    fn handle(&mut self, event: &SceneEvent, _commands: &mut CommandQueue) {
        match self.sender.try_send(event.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => debug!("Scene event channel full, dropping {:?}", event),
            Err(TrySendError::Disconnected(_)) => {
                if !self.disconnected {
                    debug!("Scene event receiver dropped");
                    self.disconnected = true;
                }
            }
        }
    }
}
