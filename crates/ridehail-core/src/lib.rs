//! Domain logic for the ridehail coordination core.
//!
//! This crate is runtime-free: it owns the lifecycle policy (who may drive
//! which status transition), the intent error taxonomy with its stable wire
//! kinds, the store traits behind which persistence lives, and the
//! [`Environment`] abstraction that supplies wall-clock time and randomness.
//!
//! Orchestration - the coordinator, the connection registry, fan-out, and
//! the transport - lives in `ridehail-server` and is generic over the traits
//! defined here, so tests can swap in deterministic environments and
//! fault-injecting stores.

pub mod env;
pub mod error;
pub mod lifecycle;
pub mod store;

pub use env::{Environment, SeededEnv};
pub use error::{IntentError, StoreError};
pub use store::{
    ChaoticPrincipals, ChaoticRides, MemoryPrincipals, MemoryRides, PrincipalStore, RideStore,
};
