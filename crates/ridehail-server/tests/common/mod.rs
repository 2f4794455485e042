//! Shared test world: seeded coordinator over in-memory stores.

#![allow(dead_code)]

use std::sync::Arc;

use ridehail_core::{MemoryPrincipals, MemoryRides, PrincipalStore, SeededEnv};
use ridehail_proto::{
    Event, Location, PaymentMethod, Principal, PrincipalId, RequestRide, Ride, Role, ServerMessage,
    SessionId, Vehicle,
};
use ridehail_server::{ConnectionRegistry, OutboundReceiver, RideCoordinator};
use tokio::sync::mpsc;

pub type TestCoordinator = RideCoordinator<SeededEnv, MemoryRides, MemoryPrincipals>;

/// A coordinator plus direct handles on its collaborators.
pub struct TestWorld {
    pub env: SeededEnv,
    pub rides: MemoryRides,
    pub principals: MemoryPrincipals,
    pub registry: ConnectionRegistry,
    pub coordinator: Arc<TestCoordinator>,
}

impl TestWorld {
    pub fn new() -> Self {
        let env = SeededEnv::new(0x7e57_0000_0000_0001);
        let rides = MemoryRides::new();
        let principals = MemoryPrincipals::new();
        let registry = ConnectionRegistry::new();
        let coordinator = Arc::new(RideCoordinator::new(
            env.clone(),
            rides.clone(),
            principals.clone(),
            registry.clone(),
        ));
        Self { env, rides, principals, registry, coordinator }
    }

    /// Insert a principal with explicit flags.
    pub async fn add_principal(
        &self,
        id: u64,
        role: Role,
        is_approved: bool,
        is_online: bool,
    ) -> Principal {
        let principal = Principal {
            id: PrincipalId(id),
            name: format!("principal-{id}"),
            email: format!("p{id}@example.com"),
            phone: format!("555-{id:04}"),
            role,
            is_online,
            is_approved,
            is_blocked: false,
            vehicle: (role == Role::Driver).then(|| Vehicle {
                plate: format!("RH-{id:04}"),
                model: "Corolla".to_string(),
                color: "blue".to_string(),
            }),
        };
        self.principals.insert(principal.clone()).await.unwrap();
        principal
    }

    /// An approved, online driver - ready to accept rides.
    pub async fn add_driver(&self, id: u64) -> Principal {
        self.add_principal(id, Role::Driver, true, true).await
    }

    pub async fn add_rider(&self, id: u64) -> Principal {
        self.add_principal(id, Role::Rider, false, false).await
    }

    /// Admit a live session for `principal`, returning its event stream.
    pub async fn connect(&self, principal: &Principal) -> (SessionId, OutboundReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session_id = self.coordinator.admit(principal, tx).await.unwrap();
        (session_id, rx)
    }

    /// Request a ride from `rider` with the standard test addresses.
    pub async fn request(&self, rider: PrincipalId, fare: f64) -> Ride {
        self.coordinator
            .request_ride(rider, RequestRide {
                pickup: Location::address("123 Main"),
                destination: Location::address("456 Oak"),
                fare,
                payment_method: PaymentMethod::Cash,
            })
            .await
            .unwrap()
    }
}

/// Drain every event currently queued on a session channel.
pub fn drain_events(rx: &mut OutboundReceiver) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(text) = rx.try_recv() {
        let message: ServerMessage = serde_json::from_str(&text).unwrap();
        if let ServerMessage::Event(event) = message {
            events.push(event);
        }
    }
    events
}

/// Topics of every queued event, in delivery order.
pub fn drain_topics(rx: &mut OutboundReceiver) -> Vec<&'static str> {
    drain_events(rx).iter().map(Event::topic).collect()
}
