//! Intents: requested state changes submitted to the coordinator.
//!
//! The acting principal is never part of the intent body - the transport
//! layer fills it in from the authenticated session, so a client cannot act
//! on another principal's behalf.

use serde::{Deserialize, Serialize};

use crate::{
    ids::RideId,
    ride::{Location, PaymentMethod, RideStatus},
};

/// Inputs for creating a new ride.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestRide {
    /// Pickup point; address must be non-empty.
    pub pickup: Location,
    /// Destination point; address must be non-empty.
    pub destination: Location,
    /// Quoted fare. Defaults to zero.
    #[serde(default)]
    pub fare: f64,
    /// Payment method. Defaults to cash.
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

/// A requested state change, as received from a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Intent {
    /// Rider requests a new ride.
    RequestRide(RequestRide),
    /// Driver claims an open ride.
    AcceptRide {
        /// The ride to claim.
        ride_id: RideId,
    },
    /// Advance or cancel a ride.
    UpdateStatus {
        /// The ride to transition.
        ride_id: RideId,
        /// The requested next status.
        status: RideStatus,
    },
    /// Driver marks themselves available.
    SetOnline,
    /// Driver marks themselves unavailable.
    SetOffline,
}
