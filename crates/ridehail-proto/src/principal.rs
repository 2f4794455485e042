//! Principal records and the driver summary shared with riders.

use serde::{Deserialize, Serialize};

use crate::ids::PrincipalId;

/// Role of an authenticated principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Requests rides.
    Rider,
    /// Accepts and executes rides.
    Driver,
    /// Administrative principal; may force any valid lifecycle transition.
    Admin,
}

/// Vehicle details for a driver's profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    /// License plate.
    pub plate: String,
    /// Vehicle model.
    pub model: String,
    /// Vehicle color.
    pub color: String,
}

/// A registered identity.
///
/// Owned by the principal store. `is_online` toggles with the connection
/// lifecycle; `is_approved` and `is_blocked` are set administratively.
/// Principals are created at registration and never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    /// Unique id.
    pub id: PrincipalId,
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Contact phone number.
    pub phone: String,
    /// Role of this principal.
    pub role: Role,
    /// Whether a live connection currently marks this principal reachable.
    pub is_online: bool,
    /// Driver approval flag (admin-granted; required to accept rides).
    pub is_approved: bool,
    /// Blocked principals are refused admission at the session bootstrap.
    pub is_blocked: bool,
    /// Vehicle profile; present for drivers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle: Option<Vehicle>,
}

impl Principal {
    /// Whether this principal may currently take ride assignments.
    pub fn can_drive(&self) -> bool {
        self.role == Role::Driver && self.is_approved && self.is_online
    }
}

/// The subset of a driver's profile shared with a rider on acceptance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverSummary {
    /// Driver id.
    pub id: PrincipalId,
    /// Display name.
    pub name: String,
    /// Contact phone number.
    pub phone: String,
    /// Vehicle details, if the driver registered one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle: Option<Vehicle>,
}

impl From<&Principal> for DriverSummary {
    fn from(p: &Principal) -> Self {
        Self { id: p.id, name: p.name.clone(), phone: p.phone.clone(), vehicle: p.vehicle.clone() }
    }
}
