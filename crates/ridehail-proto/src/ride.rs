//! Ride records and the status graph.
//!
//! `RideStatus::allows` encodes the raw lifecycle graph. Who may drive a
//! given transition is policy, and lives in `ridehail-core`.

use serde::{Deserialize, Serialize};

use crate::ids::{PrincipalId, RideId};

/// A pickup or destination point.
///
/// Coordinates are optional; address-only requests are accepted and the
/// coordinates can be filled in later.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Street address. Required; validated non-empty at request time.
    pub address: String,
    /// Latitude, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    /// Longitude, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
}

impl Location {
    /// Build an address-only location.
    pub fn address(addr: impl Into<String>) -> Self {
        Self { address: addr.into(), lat: None, lng: None }
    }
}

/// How the rider intends to pay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash on completion (the default).
    #[default]
    Cash,
    /// Card on file.
    Card,
    /// Prepaid wallet balance.
    Wallet,
}

/// Lifecycle state of a ride.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RideStatus {
    /// Created by a rider; no driver assigned yet.
    Requested,
    /// A driver accepted the ride.
    Accepted,
    /// The driver picked the rider up.
    PickedUp,
    /// En route to the destination.
    InTransit,
    /// Terminal: the ride finished.
    Completed,
    /// Terminal: abandoned before pickup.
    Cancelled,
}

impl RideStatus {
    /// Every status, for exhaustive property tests.
    pub const ALL: [Self; 6] = [
        Self::Requested,
        Self::Accepted,
        Self::PickedUp,
        Self::InTransit,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Whether the lifecycle graph permits moving from `self` to `next`.
    ///
    /// The graph is linear with a cancel escape hatch before pickup:
    /// `requested → accepted → picked_up → in_transit → completed`, with
    /// `cancelled` reachable from `requested` and `accepted` only.
    pub fn allows(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Requested, Self::Accepted | Self::Cancelled)
                | (Self::Accepted, Self::PickedUp | Self::Cancelled)
                | (Self::PickedUp, Self::InTransit)
                | (Self::InTransit, Self::Completed)
        )
    }

    /// Terminal states accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// The wire name of this status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::Accepted => "accepted",
            Self::PickedUp => "picked_up",
            Self::InTransit => "in_transit",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether entering this status takes the ride off the open-offer board.
    ///
    /// Used to decide when the drivers group gets a removal notice.
    pub fn removes_from_offer_board(self) -> bool {
        self.is_terminal()
    }
}

impl std::fmt::Display for RideStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single trip record.
///
/// Created by a rider intent, mutated only through coordinator-validated
/// transitions, never deleted - terminal rides are retained for history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ride {
    /// Unique id.
    pub id: RideId,
    /// The requesting rider.
    pub rider: PrincipalId,
    /// Assigned driver. `None` exactly while status is `requested`.
    pub driver: Option<PrincipalId>,
    /// Pickup point.
    pub pickup: Location,
    /// Destination point.
    pub destination: Location,
    /// Quoted fare.
    pub fare: f64,
    /// Current lifecycle state.
    pub status: RideStatus,
    /// Payment method chosen at request time.
    pub payment_method: PaymentMethod,
    /// Unix seconds at creation.
    pub created_at_secs: u64,
    /// Unix seconds at the last transition.
    pub updated_at_secs: u64,
}
