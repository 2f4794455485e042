//! Error taxonomy for lifecycle intents and store access.
//!
//! Every failure reaches the originating caller synchronously as an
//! [`IntentError`] with a stable wire kind. Nothing is silently swallowed
//! except best-effort side notifications, and nothing retries automatically
//! - resubmission is the caller's decision.

use ridehail_proto::{PrincipalId, RideId, RideStatus};
use thiserror::Error;

/// Persistence-layer failures.
///
/// A `StoreError` during a guarded transition is fatal for that intent and
/// must leave the ride's persisted state exactly as it was before the guard
/// was acquired.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Failed to encode/decode a record.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Underlying storage system error.
    #[error("I/O error: {0}")]
    Io(String),

    /// The store refused the operation (injected fault, backend down).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Failures reported for a lifecycle intent.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum IntentError {
    /// Malformed intent input; rejected before any store access.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The referenced ride does not exist.
    #[error("ride not found: {0}")]
    RideNotFound(RideId),

    /// The referenced principal does not exist.
    #[error("principal not found: {0}")]
    PrincipalNotFound(PrincipalId),

    /// An authorization rule was violated (role, approval, ownership).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Lost the per-ride race: another driver already holds the slot.
    #[error("ride {ride_id} is already assigned to another driver")]
    AlreadyAssigned {
        /// The contested ride.
        ride_id: RideId,
    },

    /// The requested transition is not in the lifecycle graph.
    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition {
        /// Status the ride was in.
        from: RideStatus,
        /// Status that was requested.
        to: RideStatus,
    },

    /// Credential verification failed at session bootstrap.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The persistence layer failed; the intent was not applied.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl IntentError {
    /// Stable kind tag reported on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_failed",
            Self::RideNotFound(_) | Self::PrincipalNotFound(_) => "not_found",
            Self::Forbidden(_) => "forbidden",
            Self::AlreadyAssigned { .. } => "already_assigned",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::Unauthorized(_) => "unauthorized",
            Self::Store(_) => "store_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_stable() {
        assert_eq!(IntentError::Validation("x".into()).kind(), "validation_failed");
        assert_eq!(IntentError::RideNotFound(RideId(1)).kind(), "not_found");
        assert_eq!(IntentError::PrincipalNotFound(PrincipalId(1)).kind(), "not_found");
        assert_eq!(IntentError::AlreadyAssigned { ride_id: RideId(1) }.kind(), "already_assigned");
        assert_eq!(
            IntentError::InvalidTransition {
                from: RideStatus::Completed,
                to: RideStatus::Cancelled
            }
            .kind(),
            "invalid_transition"
        );
        assert_eq!(
            IntentError::Store(StoreError::Io("disk".into())).kind(),
            "store_error"
        );
    }

    #[test]
    fn store_error_converts() {
        let err: IntentError = StoreError::Unavailable("injected".into()).into();
        assert!(matches!(err, IntentError::Store(_)));
    }

    #[test]
    fn display_names_statuses() {
        let err = IntentError::InvalidTransition {
            from: RideStatus::Completed,
            to: RideStatus::Requested,
        };
        assert_eq!(err.to_string(), "invalid transition: completed -> requested");
    }
}
