//! Collision channels, responses and profiles
//!
//! Every body has an object type (the channel it belongs to) and a response
//! per channel. When two bodies meet, each looks up the other's object type
//! in its own container and the weaker of the two responses wins:
//! `Block` only if both sides block, `Ignore` if either side ignores.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Number of channels a [`ResponseContainer`] can address
pub const MAX_CHANNELS: usize = 32;

/// A collision channel identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CollisionChannel(pub u8);

impl CollisionChannel {
    /// Static level geometry
    pub const WORLD_STATIC: Self = Self(0);
    /// Movable level geometry
    pub const WORLD_DYNAMIC: Self = Self(1);
    /// Player and AI characters
    pub const PAWN: Self = Self(2);
    /// Visibility traces
    pub const VISIBILITY: Self = Self(3);
    /// Camera traces
    pub const CAMERA: Self = Self(4);
    /// Simulated bodies
    pub const PHYSICS_BODY: Self = Self(5);
    /// Vehicles
    pub const VEHICLE: Self = Self(6);
    /// Destructible geometry
    pub const DESTRUCTIBLE: Self = Self(7);

    /// Create a custom channel
    pub const fn custom(id: u8) -> Self {
        Self(id)
    }

    /// Get the channel as a bitmask
    pub fn as_mask(&self) -> u32 {
        1 << (self.0 as u32 % MAX_CHANNELS as u32)
    }

    #[inline]
    fn slot(self) -> usize {
        self.0 as usize % MAX_CHANNELS
    }
}

impl Default for CollisionChannel {
    fn default() -> Self {
        Self::WORLD_DYNAMIC
    }
}

/// How a body reacts to another body or query on a given channel.
/// Ordered so that the weaker response compares lower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CollisionResponse {
    Ignore,
    Overlap,
    Block,
}

impl CollisionResponse {
    /// Combine two one-sided responses into the pair response
    #[inline]
    pub fn combine(self, other: Self) -> Self {
        self.min(other)
    }
}

impl Default for CollisionResponse {
    fn default() -> Self {
        Self::Block
    }
}

/// Response per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseContainer {
    responses: [CollisionResponse; MAX_CHANNELS],
}

impl ResponseContainer {
    /// Container answering `response` on every channel
    pub const fn all(response: CollisionResponse) -> Self {
        Self {
            responses: [response; MAX_CHANNELS],
        }
    }

    /// Block every channel
    pub const fn block_all() -> Self {
        Self::all(CollisionResponse::Block)
    }

    /// Overlap every channel
    pub const fn overlap_all() -> Self {
        Self::all(CollisionResponse::Overlap)
    }

    /// Ignore every channel
    pub const fn ignore_all() -> Self {
        Self::all(CollisionResponse::Ignore)
    }

    /// Set the response on every channel
    pub fn set_all(&mut self, response: CollisionResponse) {
        self.responses = [response; MAX_CHANNELS];
    }

    /// Set the response on one channel
    pub fn set(&mut self, channel: CollisionChannel, response: CollisionResponse) {
        self.responses[channel.slot()] = response;
    }

    /// Set the response on one channel (builder pattern)
    pub fn with(mut self, channel: CollisionChannel, response: CollisionResponse) -> Self {
        self.set(channel, response);
        self
    }

    /// Response on a channel
    #[inline]
    pub fn get(&self, channel: CollisionChannel) -> CollisionResponse {
        self.responses[channel.slot()]
    }

    /// Bitmask of channels answering exactly `response`
    pub fn mask_of(&self, response: CollisionResponse) -> u32 {
        self.responses
            .iter()
            .enumerate()
            .filter(|(_, r)| **r == response)
            .fold(0u32, |acc, (i, _)| acc | (1 << i))
    }
}

impl Default for ResponseContainer {
    fn default() -> Self {
        Self::block_all()
    }
}

/// Pair response between two bodies (or a query and a body)
#[inline]
pub fn pair_response(
    a_type: CollisionChannel,
    a_responses: &ResponseContainer,
    b_type: CollisionChannel,
    b_responses: &ResponseContainer,
) -> CollisionResponse {
    a_responses.get(b_type).combine(b_responses.get(a_type))
}

/// Which parts of the collision system see a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollisionEnabled {
    NoCollision,
    QueryOnly,
    PhysicsOnly,
    QueryAndPhysics,
}

impl CollisionEnabled {
    /// Whether sweeps, traces and overlap queries see the body
    #[inline]
    pub fn has_query(self) -> bool {
        matches!(self, Self::QueryOnly | Self::QueryAndPhysics)
    }

    /// Whether the simulation sees the body
    #[inline]
    pub fn has_physics(self) -> bool {
        matches!(self, Self::PhysicsOnly | Self::QueryAndPhysics)
    }
}

impl Default for CollisionEnabled {
    fn default() -> Self {
        Self::QueryAndPhysics
    }
}

/// Complete collision setup of a body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionProfile {
    pub object_type: CollisionChannel,
    pub responses: ResponseContainer,
    pub enabled: CollisionEnabled,
}

impl CollisionProfile {
    /// Blocks everything, lives on WORLD_STATIC
    pub fn block_all() -> Self {
        Self {
            object_type: CollisionChannel::WORLD_STATIC,
            responses: ResponseContainer::block_all(),
            enabled: CollisionEnabled::QueryAndPhysics,
        }
    }

    /// Blocks everything, lives on WORLD_DYNAMIC
    pub fn block_all_dynamic() -> Self {
        Self {
            object_type: CollisionChannel::WORLD_DYNAMIC,
            ..Self::block_all()
        }
    }

    /// Overlaps everything, lives on WORLD_DYNAMIC
    pub fn overlap_all_dynamic() -> Self {
        Self {
            object_type: CollisionChannel::WORLD_DYNAMIC,
            responses: ResponseContainer::overlap_all(),
            enabled: CollisionEnabled::QueryOnly,
        }
    }

    /// Character capsule: blocks the world, ignores visibility and camera
    pub fn pawn() -> Self {
        Self {
            object_type: CollisionChannel::PAWN,
            responses: ResponseContainer::block_all()
                .with(CollisionChannel::VISIBILITY, CollisionResponse::Ignore)
                .with(CollisionChannel::CAMERA, CollisionResponse::Ignore),
            enabled: CollisionEnabled::QueryAndPhysics,
        }
    }

    /// Trigger volume: overlaps everything except visibility and camera
    pub fn trigger() -> Self {
        Self {
            object_type: CollisionChannel::WORLD_DYNAMIC,
            responses: ResponseContainer::overlap_all()
                .with(CollisionChannel::VISIBILITY, CollisionResponse::Ignore)
                .with(CollisionChannel::CAMERA, CollisionResponse::Ignore),
            enabled: CollisionEnabled::QueryOnly,
        }
    }

    /// No collision at all
    pub fn no_collision() -> Self {
        Self {
            object_type: CollisionChannel::WORLD_STATIC,
            responses: ResponseContainer::ignore_all(),
            enabled: CollisionEnabled::NoCollision,
        }
    }

    /// Pair response against another profile
    pub fn response_to(&self, other: &CollisionProfile) -> CollisionResponse {
        pair_response(self.object_type, &self.responses, other.object_type, &other.responses)
    }
}

impl Default for CollisionProfile {
    fn default() -> Self {
        Self::block_all_dynamic()
    }
}

/// Named collision profiles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRegistry {
    profiles: HashMap<String, CollisionProfile>,
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register("BlockAll", CollisionProfile::block_all());
        registry.register("BlockAllDynamic", CollisionProfile::block_all_dynamic());
        registry.register("OverlapAllDynamic", CollisionProfile::overlap_all_dynamic());
        registry.register("Pawn", CollisionProfile::pawn());
        registry.register("Trigger", CollisionProfile::trigger());
        registry.register("NoCollision", CollisionProfile::no_collision());
        registry
    }
}

impl ProfileRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            profiles: HashMap::new(),
        }
    }

    /// Register (or replace) a named profile
    pub fn register(&mut self, name: &str, profile: CollisionProfile) {
        self.profiles.insert(name.to_string(), profile);
    }

    /// Get a profile by name
    pub fn get(&self, name: &str) -> Option<CollisionProfile> {
        self.profiles.get(name).copied()
    }

    /// Number of registered profiles
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Check whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
