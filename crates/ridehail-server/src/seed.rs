//! Demo data for the dev server.
//!
//! Provisions one principal per role with a static token each, so a fresh
//! server is immediately drivable from a WebSocket client. Production
//! deployments provision principals through their identity stack instead.

use ridehail_core::{PrincipalStore, StoreError};
use ridehail_proto::{Principal, PrincipalId, Role, Vehicle};

use crate::bootstrap::TokenTable;

/// Fixed dev identities: (token, id, name, role).
const DEMO: [(&str, u64, &str, Role); 3] = [
    ("rider-token", 1, "Avery Rider", Role::Rider),
    ("driver-token", 2, "Dana Driver", Role::Driver),
    ("admin-token", 3, "Alex Admin", Role::Admin),
];

/// Insert the demo principals and issue their tokens.
pub async fn seed_demo<P: PrincipalStore>(
    principals: &P,
    tokens: &TokenTable,
) -> Result<(), StoreError> {
    for (token, id, name, role) in DEMO {
        let principal = Principal {
            id: PrincipalId(id),
            name: name.to_string(),
            email: format!("{}@ridehail.dev", token.trim_end_matches("-token")),
            phone: format!("555-010{id}"),
            role,
            is_online: false,
            is_approved: role == Role::Driver,
            is_blocked: false,
            vehicle: (role == Role::Driver).then(|| Vehicle {
                plate: "RH-0042".to_string(),
                model: "Model 3".to_string(),
                color: "white".to_string(),
            }),
        };
        principals.insert(principal).await?;
        tokens.issue(token, PrincipalId(id));
        tracing::info!(token, role = ?role, "seeded demo principal");
    }
    Ok(())
}
