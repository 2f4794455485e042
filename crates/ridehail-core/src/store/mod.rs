//! Store abstractions for rides and principals.
//!
//! Trait-based so the coordinator never sees a concrete backend. In-memory
//! implementations back tests and the dev server; the chaotic wrappers
//! inject deterministic failures for fault testing. A production deployment
//! implements these traits over its database of record - persisted-record
//! schema validation is that backend's concern, not ours.

mod chaotic;
mod memory;

use async_trait::async_trait;
pub use chaotic::{ChaoticPrincipals, ChaoticRides};
pub use memory::{MemoryPrincipals, MemoryRides};
use ridehail_proto::{Principal, PrincipalId, Ride, RideId};

use crate::error::StoreError;

/// Durable record of each ride's assignment and status.
///
/// Must be `Clone` (handles shared across connection tasks) and thread-safe.
/// Implementations typically share state via `Arc`, so clones access the
/// same underlying store. Writes must be atomic per record: a failed
/// `update` leaves the stored ride unchanged.
#[async_trait]
pub trait RideStore: Clone + Send + Sync + 'static {
    /// Persist a newly created ride.
    async fn create(&self, ride: Ride) -> Result<(), StoreError>;

    /// Load a ride by id. `None` if absent.
    async fn find(&self, id: RideId) -> Result<Option<Ride>, StoreError>;

    /// Overwrite an existing ride record.
    async fn update(&self, ride: &Ride) -> Result<(), StoreError>;
}

/// Durable record of principals and their presence flags.
#[async_trait]
pub trait PrincipalStore: Clone + Send + Sync + 'static {
    /// Persist a principal (registration; out-of-band seeding).
    async fn insert(&self, principal: Principal) -> Result<(), StoreError>;

    /// Load a principal by id. `None` if absent.
    async fn find(&self, id: PrincipalId) -> Result<Option<Principal>, StoreError>;

    /// Set the online flag to an absolute value.
    ///
    /// Idempotent by construction - repeated sets of the same value are
    /// indistinguishable from one. A missing principal is a no-op.
    async fn set_online(&self, id: PrincipalId, online: bool) -> Result<(), StoreError>;
}
