//! Notification events and their target selectors.
//!
//! Events are produced by the coordinator after a transition is durable and
//! consumed within one fan-out cycle - they are never persisted. A
//! reconnecting client re-syncs from ride state, not from an event replay.

use serde::{Deserialize, Serialize};

use crate::{
    ids::{PrincipalId, RideId},
    principal::DriverSummary,
    ride::{Location, RideStatus},
};

/// A named broadcast group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Group {
    /// All currently connected drivers.
    Drivers,
    /// All currently connected admins.
    Admins,
}

/// Who an event is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Every live session of one principal.
    Principal(PrincipalId),
    /// Every session in a group.
    Group(Group),
}

/// A one-way notification pushed to clients.
///
/// The `topic` tag is the stable wire contract; clients switch on it and
/// must not depend on payload field order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "topic", content = "data")]
pub enum Event {
    /// A new ride is open for drivers to accept.
    #[serde(rename = "ride:new")]
    RideNew {
        /// The new ride.
        ride_id: RideId,
        /// Pickup point.
        pickup: Location,
        /// Destination point.
        destination: Location,
        /// Quoted fare.
        fare: f64,
        /// Unix seconds at creation.
        created_at_secs: u64,
    },

    /// A driver accepted the rider's ride.
    #[serde(rename = "ride:accepted")]
    RideAccepted {
        /// The accepted ride.
        ride_id: RideId,
        /// The accepting driver's profile summary.
        driver: DriverSummary,
        /// New status (`accepted`).
        status: RideStatus,
    },

    /// A ride left the open-offer board; drivers should retract it.
    #[serde(rename = "ride:removed")]
    RideRemoved {
        /// The removed ride.
        ride_id: RideId,
    },

    /// A ride moved to a new lifecycle state.
    #[serde(rename = "ride:statusUpdated")]
    RideStatusUpdated {
        /// The transitioned ride.
        ride_id: RideId,
        /// The new status.
        status: RideStatus,
    },

    /// A driver's own availability changed (sent to that driver).
    #[serde(rename = "driver:status")]
    DriverStatus {
        /// The new availability.
        is_online: bool,
    },

    /// A driver went offline (sent to the drivers group).
    #[serde(rename = "driver:offline")]
    DriverOffline {
        /// The departing driver.
        driver_id: PrincipalId,
    },
}

impl Event {
    /// Stable topic string for this event.
    pub fn topic(&self) -> &'static str {
        match self {
            Self::RideNew { .. } => "ride:new",
            Self::RideAccepted { .. } => "ride:accepted",
            Self::RideRemoved { .. } => "ride:removed",
            Self::RideStatusUpdated { .. } => "ride:statusUpdated",
            Self::DriverStatus { .. } => "driver:status",
            Self::DriverOffline { .. } => "driver:offline",
        }
    }
}

/// An event addressed to a target, ready for fan-out.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Where to deliver.
    pub target: Target,
    /// What to deliver.
    pub event: Event,
}

impl Notification {
    /// Address an event to every live session of one principal.
    pub fn to_principal(principal: PrincipalId, event: Event) -> Self {
        Self { target: Target::Principal(principal), event }
    }

    /// Address an event to a broadcast group.
    pub fn to_group(group: Group, event: Event) -> Self {
        Self { target: Target::Group(group), event }
    }
}
