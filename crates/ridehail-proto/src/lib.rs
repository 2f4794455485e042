//! Shared data model and JSON wire types for the ridehail protocol.
//!
//! This crate holds everything both sides of the wire agree on: identifiers,
//! the ride and principal records, the intent messages clients submit, the
//! notification events the server pushes, and the envelopes that frame both.
//! Logic lives elsewhere - `ridehail-core` owns the lifecycle policy and the
//! store traits, `ridehail-server` owns orchestration and I/O.
//!
//! All wire messages are JSON. Payload structs derive `Serialize`/
//! `Deserialize`; enums use internal tags so a message is self-describing
//! without a separate opcode header.

pub mod event;
pub mod ids;
pub mod intent;
pub mod principal;
pub mod ride;
pub mod wire;

pub use event::{Event, Group, Notification, Target};
pub use ids::{PrincipalId, RideId, SessionId};
pub use intent::{Intent, RequestRide};
pub use principal::{DriverSummary, Principal, Role, Vehicle};
pub use ride::{Location, PaymentMethod, Ride, RideStatus};
pub use wire::{ClientEnvelope, ErrorBody, Reply, ServerMessage, WireError};
