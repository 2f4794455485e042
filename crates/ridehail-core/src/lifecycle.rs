//! Lifecycle policy: which actor may drive which status transition.
//!
//! The raw graph lives on [`RideStatus`]; this module layers the
//! role-validated actor rules over it. Graph violations take precedence over
//! authorization - a caller asking for an impossible transition learns that
//! first, regardless of who they are.
//!
//! Exactly one rule set exists. The assigned driver advances the ride, the
//! ride's own rider may only cancel, and admins may force any graph-valid
//! transition.

use ridehail_proto::{Principal, RequestRide, Ride, RideStatus, Role};

use crate::error::IntentError;

/// Validate a ride request before any store access.
///
/// Pickup and destination must each carry a non-empty address. Coordinates
/// and fare are unchecked - zero-fare, address-only requests are legal.
pub fn validate_request(req: &RequestRide) -> Result<(), IntentError> {
    if req.pickup.address.trim().is_empty() {
        return Err(IntentError::Validation("pickup address required".to_string()));
    }
    if req.destination.address.trim().is_empty() {
        return Err(IntentError::Validation("destination address required".to_string()));
    }
    Ok(())
}

/// Check that `actor` may move `ride` to `next`.
///
/// Returns `InvalidTransition` when the graph forbids the edge, `Forbidden`
/// when the graph allows it but the actor does not. The ride itself is
/// untouched; the caller applies the transition only on `Ok`.
pub fn authorize_transition(
    ride: &Ride,
    next: RideStatus,
    actor: &Principal,
) -> Result<(), IntentError> {
    if !ride.status.allows(next) {
        return Err(IntentError::InvalidTransition { from: ride.status, to: next });
    }

    match actor.role {
        Role::Admin => Ok(()),

        Role::Driver => {
            if ride.driver != Some(actor.id) {
                return Err(IntentError::Forbidden(
                    "only the assigned driver may update this ride".to_string(),
                ));
            }
            if next == RideStatus::Cancelled {
                return Err(IntentError::Forbidden("drivers cannot cancel rides".to_string()));
            }
            Ok(())
        }

        Role::Rider => {
            if ride.rider != actor.id {
                return Err(IntentError::Forbidden("not your ride".to_string()));
            }
            if next != RideStatus::Cancelled {
                return Err(IntentError::Forbidden(
                    "riders may only cancel their ride".to_string(),
                ));
            }
            Ok(())
        }
    }
}
