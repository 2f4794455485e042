//! Ride lifecycle coordinator.
//!
//! Receives lifecycle intents (request, accept, status-change, presence,
//! disconnect), applies the state machine against the ride store under a
//! per-ride exclusion guard, and fans the resulting notifications out. Every
//! intent is an ordinary async call returning a result value - there are no
//! callback acks.
//!
//! # Concurrency
//!
//! Connection tasks invoke the coordinator concurrently. The critical
//! resource is one ride's `driver`/`status` pair: [`RideLocks`] serializes
//! transitions per ride id, with the guard held from before the read until
//! the persisted write and the outcome are final. Notifications for a
//! transition are emitted only by its winner, after the guard scope -
//! event emission always aligns with exactly one outcome. Delivery itself is
//! a non-blocking channel push and can never stall an intent.

use ridehail_core::{
    Environment, IntentError, PrincipalStore, RideStore, lifecycle,
};
use ridehail_proto::{
    DriverSummary, Event, Group, Notification, Principal, PrincipalId, RequestRide, Ride, RideId,
    RideStatus, Role, SessionId,
};
use serde::Serialize;

use crate::{
    fanout::Notifier,
    locks::RideLocks,
    registry::{ConnectionRegistry, OutboundSender, SessionInfo},
};

/// Success payload of an accept intent.
#[derive(Debug, Clone, Serialize)]
pub struct AcceptedRide {
    /// The ride after assignment.
    pub ride: Ride,
    /// The accepting driver's shareable profile.
    pub driver: DriverSummary,
}

/// Success payload of a presence intent.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PresenceAck {
    /// The driver's availability after the intent.
    pub is_online: bool,
}

/// Coordinates ride lifecycle transitions and presence side-effects.
///
/// Generic over the environment and both stores so tests run against a
/// seeded clock/RNG and fault-injecting stores. The connection registry is
/// injected at construction - built once at process bootstrap, never
/// re-created lazily.
pub struct RideCoordinator<E, R, P>
where
    E: Environment,
    R: RideStore,
    P: PrincipalStore,
{
    env: E,
    rides: R,
    principals: P,
    registry: ConnectionRegistry,
    notifier: Notifier,
    locks: RideLocks,
}

impl<E, R, P> RideCoordinator<E, R, P>
where
    E: Environment,
    R: RideStore,
    P: PrincipalStore,
{
    /// Build a coordinator over the process's registry and stores.
    pub fn new(env: E, rides: R, principals: P, registry: ConnectionRegistry) -> Self {
        let notifier = Notifier::new(registry.clone());
        Self { env, rides, principals, registry, notifier, locks: RideLocks::new() }
    }

    /// The registry this coordinator routes through.
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Admit an authenticated principal's connection.
    ///
    /// Joins the session (and the role's broadcast group), and for drivers
    /// persists `is_online = true`. If the presence write fails the session
    /// is rolled back out of the registry - no partial admission.
    pub async fn admit(
        &self,
        principal: &Principal,
        sender: OutboundSender,
    ) -> Result<SessionId, IntentError> {
        let info = SessionInfo { principal_id: principal.id, role: principal.role };

        // Random ids collide only in theory; loop anyway rather than assume.
        let session_id = loop {
            let candidate = SessionId(self.env.random_u64());
            if self.registry.join(candidate, info, sender.clone()) {
                break candidate;
            }
        };

        match principal.role {
            Role::Driver => {
                self.registry.join_group(session_id, Group::Drivers);
                if let Err(err) = self.principals.set_online(principal.id, true).await {
                    let _ = self.registry.leave(session_id);
                    return Err(err.into());
                }
            }
            Role::Admin => {
                self.registry.join_group(session_id, Group::Admins);
            }
            Role::Rider => {}
        }

        tracing::info!(
            session = %session_id,
            principal = %principal.id,
            role = ?principal.role,
            "session admitted"
        );
        Ok(session_id)
    }

    /// Handle a session's disconnect.
    ///
    /// Idempotent under duplicate signals: only the first removal acts, and
    /// presence flips only when the principal's *last* session is gone.
    /// Presence write failures are logged, not surfaced - there is no caller
    /// left to report to, and the flag is an absolute set a later toggle
    /// repairs.
    pub async fn disconnect(&self, session_id: SessionId) {
        let Some(left) = self.registry.leave(session_id) else {
            tracing::debug!(session = %session_id, "duplicate disconnect ignored");
            return;
        };

        tracing::info!(
            session = %session_id,
            principal = %left.info.principal_id,
            last = left.last_session,
            "session disconnected"
        );

        if left.info.role != Role::Driver || !left.last_session {
            return;
        }

        let driver_id = left.info.principal_id;
        if let Err(err) = self.principals.set_online(driver_id, false).await {
            tracing::warn!(driver = %driver_id, %err, "presence write failed on disconnect");
        }
        self.notifier.deliver(&Notification::to_group(
            Group::Drivers,
            Event::DriverOffline { driver_id },
        ));
    }

    /// Create a ride on a rider's behalf and offer it to drivers.
    pub async fn request_ride(
        &self,
        rider: PrincipalId,
        request: RequestRide,
    ) -> Result<Ride, IntentError> {
        lifecycle::validate_request(&request)?;

        let now = self.env.wall_clock_secs();
        let ride = Ride {
            id: RideId(self.env.random_u128()),
            rider,
            driver: None,
            pickup: request.pickup,
            destination: request.destination,
            fare: request.fare,
            status: RideStatus::Requested,
            payment_method: request.payment_method,
            created_at_secs: now,
            updated_at_secs: now,
        };
        self.rides.create(ride.clone()).await?;

        tracing::info!(ride = %ride.id, rider = %rider, "ride requested");
        self.notifier.deliver(&Notification::to_group(Group::Drivers, Event::RideNew {
            ride_id: ride.id,
            pickup: ride.pickup.clone(),
            destination: ride.destination.clone(),
            fare: ride.fare,
            created_at_secs: ride.created_at_secs,
        }));

        Ok(ride)
    }

    /// Claim an open ride for a driver.
    ///
    /// At most one of any number of racing accepts succeeds; the rest
    /// observe [`IntentError::AlreadyAssigned`] and emit nothing. Re-accept
    /// by the already-assigned driver is an idempotent success.
    pub async fn accept_ride(
        &self,
        ride_id: RideId,
        driver_id: PrincipalId,
    ) -> Result<AcceptedRide, IntentError> {
        let driver = self
            .principals
            .find(driver_id)
            .await?
            .ok_or(IntentError::PrincipalNotFound(driver_id))?;

        if driver.role != Role::Driver {
            return Err(IntentError::Forbidden("only drivers may accept rides".to_string()));
        }
        if !driver.is_approved {
            return Err(IntentError::Forbidden("driver not approved".to_string()));
        }
        if !driver.is_online {
            return Err(IntentError::Forbidden("driver is offline".to_string()));
        }

        let ride = {
            let _guard = self.locks.acquire(ride_id).await;

            let mut ride =
                self.rides.find(ride_id).await?.ok_or(IntentError::RideNotFound(ride_id))?;

            match ride.driver {
                Some(assigned) if assigned == driver_id => {
                    // Re-accept of an already-won ride: nothing to persist,
                    // nothing to announce.
                    tracing::debug!(ride = %ride_id, driver = %driver_id, "idempotent re-accept");
                    return Ok(AcceptedRide { ride, driver: DriverSummary::from(&driver) });
                }
                Some(_) => return Err(IntentError::AlreadyAssigned { ride_id }),
                None => {}
            }

            ride.driver = Some(driver_id);
            ride.status = RideStatus::Accepted;
            ride.updated_at_secs = self.env.wall_clock_secs();
            self.rides.update(&ride).await?;
            ride
        };

        tracing::info!(ride = %ride.id, driver = %driver_id, "ride accepted");
        let summary = DriverSummary::from(&driver);
        self.notifier.deliver_all(&[
            Notification::to_principal(ride.rider, Event::RideAccepted {
                ride_id: ride.id,
                driver: summary.clone(),
                status: ride.status,
            }),
            Notification::to_group(Group::Drivers, Event::RideRemoved { ride_id: ride.id }),
        ]);

        Ok(AcceptedRide { ride, driver: summary })
    }

    /// Advance or cancel a ride on an actor's behalf.
    ///
    /// Graph violations report [`IntentError::InvalidTransition`], actor
    /// rule violations [`IntentError::Forbidden`]; either way the ride is
    /// untouched.
    pub async fn update_status(
        &self,
        ride_id: RideId,
        new_status: RideStatus,
        actor_id: PrincipalId,
    ) -> Result<Ride, IntentError> {
        let actor = self
            .principals
            .find(actor_id)
            .await?
            .ok_or(IntentError::PrincipalNotFound(actor_id))?;

        let ride = {
            let _guard = self.locks.acquire(ride_id).await;

            let mut ride =
                self.rides.find(ride_id).await?.ok_or(IntentError::RideNotFound(ride_id))?;

            lifecycle::authorize_transition(&ride, new_status, &actor)?;

            ride.status = new_status;
            ride.updated_at_secs = self.env.wall_clock_secs();
            self.rides.update(&ride).await?;
            ride
        };

        tracing::info!(ride = %ride.id, status = %new_status, actor = %actor_id, "ride status updated");

        let update = Event::RideStatusUpdated { ride_id: ride.id, status: new_status };
        let mut notifications = vec![Notification::to_principal(ride.rider, update.clone())];
        if let Some(driver_id) = ride.driver {
            notifications.push(Notification::to_principal(driver_id, update));
        }
        if new_status.removes_from_offer_board() {
            notifications.push(Notification::to_group(Group::Drivers, Event::RideRemoved {
                ride_id: ride.id,
            }));
        }
        self.notifier.deliver_all(&notifications);

        Ok(ride)
    }

    /// Mark a driver available.
    pub async fn set_online(&self, principal_id: PrincipalId) -> Result<PresenceAck, IntentError> {
        let principal = self.require_driver(principal_id).await?;
        self.principals.set_online(principal.id, true).await?;

        for session in self.registry.sessions_for_principal(principal.id) {
            self.registry.join_group(session, Group::Drivers);
        }

        tracing::info!(driver = %principal.id, "driver online");
        self.notifier.deliver(&Notification::to_principal(principal.id, Event::DriverStatus {
            is_online: true,
        }));
        Ok(PresenceAck { is_online: true })
    }

    /// Mark a driver unavailable.
    ///
    /// Their sessions leave the drivers group first, so the offline
    /// broadcast goes only to the drivers still on the board.
    pub async fn set_offline(&self, principal_id: PrincipalId) -> Result<PresenceAck, IntentError> {
        let principal = self.require_driver(principal_id).await?;
        self.principals.set_online(principal.id, false).await?;

        for session in self.registry.sessions_for_principal(principal.id) {
            self.registry.leave_group(session, Group::Drivers);
        }

        tracing::info!(driver = %principal.id, "driver offline");
        self.notifier.deliver(&Notification::to_principal(principal.id, Event::DriverStatus {
            is_online: false,
        }));
        self.notifier.deliver(&Notification::to_group(Group::Drivers, Event::DriverOffline {
            driver_id: principal.id,
        }));
        Ok(PresenceAck { is_online: false })
    }

    async fn require_driver(&self, principal_id: PrincipalId) -> Result<Principal, IntentError> {
        let principal = self
            .principals
            .find(principal_id)
            .await?
            .ok_or(IntentError::PrincipalNotFound(principal_id))?;

        if principal.role != Role::Driver {
            return Err(IntentError::Forbidden(
                "presence toggles are for drivers only".to_string(),
            ));
        }
        Ok(principal)
    }
}

impl<E, R, P> std::fmt::Debug for RideCoordinator<E, R, P>
where
    E: Environment,
    R: RideStore,
    P: PrincipalStore,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RideCoordinator")
            .field("session_count", &self.registry.session_count())
            .field("locks", &self.locks)
            .finish()
    }
}
