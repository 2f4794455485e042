//! In-memory store implementations.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use ridehail_proto::{Principal, PrincipalId, Ride, RideId};

use super::{PrincipalStore, RideStore};
use crate::error::StoreError;

/// In-memory ride store for tests and the dev server.
///
/// State lives behind `Arc<Mutex<_>>` so clones share it. Uses
/// `lock().expect()`, which panics on a poisoned mutex - acceptable for
/// test/dev code.
#[derive(Clone, Default)]
pub struct MemoryRides {
    inner: Arc<Mutex<HashMap<RideId, Ride>>>,
}

impl MemoryRides {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rides.
    #[allow(clippy::expect_used)]
    pub fn ride_count(&self) -> usize {
        self.inner.lock().expect("MemoryRides mutex poisoned").len()
    }
}

#[async_trait]
impl RideStore for MemoryRides {
    #[allow(clippy::expect_used)]
    async fn create(&self, ride: Ride) -> Result<(), StoreError> {
        let mut rides = self.inner.lock().expect("MemoryRides mutex poisoned");
        rides.insert(ride.id, ride);
        Ok(())
    }

    #[allow(clippy::expect_used)]
    async fn find(&self, id: RideId) -> Result<Option<Ride>, StoreError> {
        let rides = self.inner.lock().expect("MemoryRides mutex poisoned");
        Ok(rides.get(&id).cloned())
    }

    #[allow(clippy::expect_used)]
    async fn update(&self, ride: &Ride) -> Result<(), StoreError> {
        let mut rides = self.inner.lock().expect("MemoryRides mutex poisoned");
        rides.insert(ride.id, ride.clone());
        Ok(())
    }
}

/// In-memory principal store for tests and the dev server.
#[derive(Clone, Default)]
pub struct MemoryPrincipals {
    inner: Arc<Mutex<HashMap<PrincipalId, Principal>>>,
}

impl MemoryPrincipals {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PrincipalStore for MemoryPrincipals {
    #[allow(clippy::expect_used)]
    async fn insert(&self, principal: Principal) -> Result<(), StoreError> {
        let mut principals = self.inner.lock().expect("MemoryPrincipals mutex poisoned");
        principals.insert(principal.id, principal);
        Ok(())
    }

    #[allow(clippy::expect_used)]
    async fn find(&self, id: PrincipalId) -> Result<Option<Principal>, StoreError> {
        let principals = self.inner.lock().expect("MemoryPrincipals mutex poisoned");
        Ok(principals.get(&id).cloned())
    }

    #[allow(clippy::expect_used)]
    async fn set_online(&self, id: PrincipalId, online: bool) -> Result<(), StoreError> {
        let mut principals = self.inner.lock().expect("MemoryPrincipals mutex poisoned");
        if let Some(p) = principals.get_mut(&id) {
            p.is_online = online;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use ridehail_proto::{Location, PaymentMethod, RideStatus, Role};

    use super::*;

    fn sample_ride(id: u128) -> Ride {
        Ride {
            id: RideId(id),
            rider: PrincipalId(1),
            driver: None,
            pickup: Location::address("123 Main"),
            destination: Location::address("456 Oak"),
            fare: 10.0,
            status: RideStatus::Requested,
            payment_method: PaymentMethod::Cash,
            created_at_secs: 100,
            updated_at_secs: 100,
        }
    }

    fn sample_principal(id: u64) -> Principal {
        Principal {
            id: PrincipalId(id),
            name: "Dana".to_string(),
            email: "dana@example.com".to_string(),
            phone: String::new(),
            role: Role::Driver,
            is_online: false,
            is_approved: true,
            is_blocked: false,
            vehicle: None,
        }
    }

    #[tokio::test]
    async fn create_then_find_round_trips() {
        let store = MemoryRides::new();
        let ride = sample_ride(5);

        store.create(ride.clone()).await.unwrap();
        assert_eq!(store.find(RideId(5)).await.unwrap(), Some(ride));
        assert_eq!(store.find(RideId(6)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn update_overwrites_in_place() {
        let store = MemoryRides::new();
        let mut ride = sample_ride(5);
        store.create(ride.clone()).await.unwrap();

        ride.status = RideStatus::Accepted;
        ride.driver = Some(PrincipalId(9));
        store.update(&ride).await.unwrap();

        let loaded = store.find(RideId(5)).await.unwrap().unwrap();
        assert_eq!(loaded.status, RideStatus::Accepted);
        assert_eq!(loaded.driver, Some(PrincipalId(9)));
        assert_eq!(store.ride_count(), 1);
    }

    #[tokio::test]
    async fn clones_share_state() {
        let store = MemoryRides::new();
        let clone = store.clone();

        store.create(sample_ride(1)).await.unwrap();
        assert!(clone.find(RideId(1)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn set_online_is_an_absolute_set() {
        let store = MemoryPrincipals::new();
        store.insert(sample_principal(3)).await.unwrap();

        store.set_online(PrincipalId(3), true).await.unwrap();
        store.set_online(PrincipalId(3), true).await.unwrap();
        assert!(store.find(PrincipalId(3)).await.unwrap().unwrap().is_online);

        store.set_online(PrincipalId(3), false).await.unwrap();
        store.set_online(PrincipalId(3), false).await.unwrap();
        assert!(!store.find(PrincipalId(3)).await.unwrap().unwrap().is_online);
    }

    #[tokio::test]
    async fn set_online_on_missing_principal_is_a_noop() {
        let store = MemoryPrincipals::new();
        assert!(store.set_online(PrincipalId(404), true).await.is_ok());
    }
}
