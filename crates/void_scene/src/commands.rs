//! Deferred scene mutations
//!
//! Event handlers run while the scene is mid-operation (possibly in the
//! middle of an overlap diff), so they only get a [`CommandQueue`]. Queued
//! commands are applied in FIFO order after the outermost public scene
//! operation returns.

use std::collections::VecDeque;

use glam::{Quat, Vec3};
use void_core::{NodeId, Transform};

use crate::node::{AttachmentRule, DetachmentRule, TeleportType};

/// A scene mutation requested from inside an event handler
#[derive(Debug, Clone, PartialEq)]
pub enum SceneCommand {
    Attach {
        child: NodeId,
        parent: NodeId,
        rule: AttachmentRule,
    },
    Detach {
        node: NodeId,
        rule: DetachmentRule,
    },
    SetRelativeTransform {
        node: NodeId,
        transform: Transform,
        sweep: bool,
        teleport: TeleportType,
    },
    /// Move by a world offset; `rotation: None` keeps the current rotation
    Move {
        node: NodeId,
        delta: Vec3,
        rotation: Option<Quat>,
        sweep: bool,
        teleport: TeleportType,
    },
    Destroy {
        node: NodeId,
    },
    SetGenerateOverlapEvents {
        node: NodeId,
        enabled: bool,
    },
    UpdateOverlaps {
        node: NodeId,
    },
}

/// FIFO of pending scene commands
#[derive(Debug, Default)]
pub struct CommandQueue {
    commands: VecDeque<SceneCommand>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a command
    pub fn push(&mut self, command: SceneCommand) {
        self.commands.push_back(command);
    }

    /// Queue an attach
    pub fn attach(&mut self, child: NodeId, parent: NodeId, rule: AttachmentRule) {
        self.push(SceneCommand::Attach {
            child,
            parent,
            rule,
        });
    }

    /// Queue a detach
    pub fn detach(&mut self, node: NodeId, rule: DetachmentRule) {
        self.push(SceneCommand::Detach { node, rule });
    }

    /// Queue a world-offset move keeping the current rotation
    pub fn move_by(&mut self, node: NodeId, delta: Vec3, sweep: bool) {
        self.push(SceneCommand::Move {
            node,
            delta,
            rotation: None,
            sweep,
            teleport: TeleportType::None,
        });
    }

    /// Queue a destroy
    pub fn destroy(&mut self, node: NodeId) {
        self.push(SceneCommand::Destroy { node });
    }

    /// Queue an overlap re-evaluation
    pub fn update_overlaps(&mut self, node: NodeId) {
        self.push(SceneCommand::UpdateOverlaps { node });
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Take every queued command, leaving the queue empty
    pub(crate) fn take(&mut self) -> VecDeque<SceneCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Iterate over queued commands
    pub fn iter(&self) -> impl Iterator<Item = &SceneCommand> {
        self.commands.iter()
    }
}
