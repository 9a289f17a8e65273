//! Collision backends implementing the query port

#[cfg(feature = "rapier")]
mod rapier;

#[cfg(feature = "rapier")]
pub use self::rapier::RapierQueryWorld;
