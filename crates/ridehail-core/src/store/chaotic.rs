//! Fault-injecting store wrappers.
//!
//! Delegate to an inner store but fail operations at a configured rate,
//! driven by a seeded linear congruential generator so chaos runs are
//! reproducible. Used to verify that a failed write inside a guarded
//! transition surfaces as an error and leaves persisted state untouched.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ridehail_proto::{Principal, PrincipalId, Ride, RideId};

use super::{PrincipalStore, RideStore};
use crate::error::StoreError;

/// Seeded LCG deciding which operations fail.
#[derive(Clone)]
struct FaultPlan {
    failure_rate: f64,
    rng: Arc<Mutex<u64>>,
}

impl FaultPlan {
    fn new(failure_rate: f64, seed: u64) -> Self {
        assert!(
            (0.0..=1.0).contains(&failure_rate),
            "failure_rate must be between 0.0 and 1.0, got {failure_rate}"
        );
        Self { failure_rate, rng: Arc::new(Mutex::new(seed)) }
    }

    #[allow(clippy::expect_used)]
    fn should_fail(&self) -> bool {
        // LCG constants from Numerical Recipes
        const A: u64 = 1_664_525;
        const C: u64 = 1_013_904_223;
        const M: u64 = 1u64 << 32;

        let mut state = self.rng.lock().expect("FaultPlan mutex poisoned");
        *state = (A.wrapping_mul(*state).wrapping_add(C)) % M;
        ((*state as f64) / (M as f64)) < self.failure_rate
    }

    fn check(&self, op: &str) -> Result<(), StoreError> {
        if self.should_fail() {
            Err(StoreError::Unavailable(format!("injected fault: {op}")))
        } else {
            Ok(())
        }
    }
}

/// Ride store wrapper that randomly injects failures.
#[derive(Clone)]
pub struct ChaoticRides<S: RideStore> {
    inner: S,
    plan: FaultPlan,
}

impl<S: RideStore> ChaoticRides<S> {
    /// Wrap `inner`, failing each operation with probability `failure_rate`.
    pub fn new(inner: S, failure_rate: f64) -> Self {
        Self::with_seed(inner, failure_rate, 0x1234_5678_9abc_def0)
    }

    /// Wrap with an explicit seed for reproducible chaos.
    pub fn with_seed(inner: S, failure_rate: f64, seed: u64) -> Self {
        Self { inner, plan: FaultPlan::new(failure_rate, seed) }
    }

    /// Underlying store, for checking invariants after chaos.
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: RideStore> RideStore for ChaoticRides<S> {
    async fn create(&self, ride: Ride) -> Result<(), StoreError> {
        self.plan.check("ride create")?;
        self.inner.create(ride).await
    }

    async fn find(&self, id: RideId) -> Result<Option<Ride>, StoreError> {
        self.plan.check("ride find")?;
        self.inner.find(id).await
    }

    async fn update(&self, ride: &Ride) -> Result<(), StoreError> {
        self.plan.check("ride update")?;
        self.inner.update(ride).await
    }
}

/// Principal store wrapper that randomly injects failures.
#[derive(Clone)]
pub struct ChaoticPrincipals<S: PrincipalStore> {
    inner: S,
    plan: FaultPlan,
}

impl<S: PrincipalStore> ChaoticPrincipals<S> {
    /// Wrap `inner`, failing each operation with probability `failure_rate`.
    pub fn new(inner: S, failure_rate: f64) -> Self {
        Self::with_seed(inner, failure_rate, 0x1234_5678_9abc_def0)
    }

    /// Wrap with an explicit seed for reproducible chaos.
    pub fn with_seed(inner: S, failure_rate: f64, seed: u64) -> Self {
        Self { inner, plan: FaultPlan::new(failure_rate, seed) }
    }

    /// Underlying store, for checking invariants after chaos.
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: PrincipalStore> PrincipalStore for ChaoticPrincipals<S> {
    async fn insert(&self, principal: Principal) -> Result<(), StoreError> {
        self.plan.check("principal insert")?;
        self.inner.insert(principal).await
    }

    async fn find(&self, id: PrincipalId) -> Result<Option<Principal>, StoreError> {
        self.plan.check("principal find")?;
        self.inner.find(id).await
    }

    async fn set_online(&self, id: PrincipalId, online: bool) -> Result<(), StoreError> {
        self.plan.check("principal set_online")?;
        self.inner.set_online(id, online).await
    }
}

#[cfg(test)]
mod tests {
    use ridehail_proto::{Location, PaymentMethod, RideStatus};

    use super::*;
    use crate::store::MemoryRides;

    fn sample_ride(id: u128) -> Ride {
        Ride {
            id: RideId(id),
            rider: PrincipalId(1),
            driver: None,
            pickup: Location::address("123 Main"),
            destination: Location::address("456 Oak"),
            fare: 0.0,
            status: RideStatus::Requested,
            payment_method: PaymentMethod::Cash,
            created_at_secs: 0,
            updated_at_secs: 0,
        }
    }

    #[tokio::test]
    async fn zero_rate_never_fails() {
        let store = ChaoticRides::new(MemoryRides::new(), 0.0);
        for i in 0..50 {
            store.create(sample_ride(i)).await.unwrap();
        }
        assert_eq!(store.inner().ride_count(), 50);
    }

    #[tokio::test]
    async fn full_rate_always_fails_and_writes_nothing() {
        let store = ChaoticRides::new(MemoryRides::new(), 1.0);
        for i in 0..10 {
            let err = store.create(sample_ride(i)).await.unwrap_err();
            assert!(matches!(err, StoreError::Unavailable(_)));
        }
        assert_eq!(store.inner().ride_count(), 0);
    }

    #[tokio::test]
    async fn same_seed_same_fault_sequence() {
        let a = ChaoticRides::with_seed(MemoryRides::new(), 0.5, 42);
        let b = ChaoticRides::with_seed(MemoryRides::new(), 0.5, 42);

        for i in 0..20 {
            let ra = a.create(sample_ride(i)).await.is_ok();
            let rb = b.create(sample_ride(i)).await.is_ok();
            assert_eq!(ra, rb, "fault sequences diverged at operation {i}");
        }
    }

    #[test]
    #[should_panic(expected = "failure_rate must be between")]
    fn out_of_range_rate_panics() {
        let _ = ChaoticRides::new(MemoryRides::new(), 1.5);
    }
}
