//! WebSocket transport.
//!
//! One logical task per live connection: the HTTP handler authenticates the
//! token *before* upgrading, the upgraded socket is admitted to the registry,
//! and a writer task drains the session's outbound channel into the sink so
//! replies and events share one ordered stream. Intent dispatch itself is
//! transport-agnostic - it only talks to the coordinator.

use std::{net::SocketAddr, sync::Arc};

use axum::{
    Router,
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use futures::{SinkExt, StreamExt};
use ridehail_core::{
    Environment, IntentError, MemoryPrincipals, MemoryRides, PrincipalStore, RideStore, StoreError,
};
use ridehail_proto::{ClientEnvelope, Intent, Principal, Reply, ServerMessage};
use serde::Deserialize;
use tokio::{net::TcpListener, sync::mpsc};
use tower_http::trace::TraceLayer;

use crate::{
    bootstrap::{SessionBootstrap, TokenTable},
    coordinator::RideCoordinator,
    error::ServerError,
    system_env::SystemEnv,
};

/// Coordinator wired with the production environment and dev stores.
pub type AppCoordinator = RideCoordinator<SystemEnv, MemoryRides, MemoryPrincipals>;

/// Bootstrap wired with the dev token table.
pub type AppBootstrap = SessionBootstrap<TokenTable, MemoryPrincipals>;

/// Shared state for the axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// The process's single coordinator.
    pub coordinator: Arc<AppCoordinator>,
    /// Session bootstrap guarding `/ws`.
    pub bootstrap: AppBootstrap,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0:8080`).
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_address: "0.0.0.0:8080".to_string() }
    }
}

/// Build the HTTP router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until shutdown.
pub async fn serve(config: ServerConfig, state: AppState) -> Result<(), ServerError> {
    let addr: SocketAddr = config.bind_address.parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

#[derive(Debug, Deserialize)]
struct WsQuery {
    token: String,
}

/// Authenticate, then upgrade.
///
/// Authentication happens on the HTTP request so a bad token is refused with
/// 401 before any socket exists - no partial join.
async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Response {
    match state.bootstrap.authenticate(&query.token).await {
        Ok(principal) => ws.on_upgrade(move |socket| run_session(socket, principal, state)),
        Err(err) => {
            tracing::debug!(%err, "connection refused");
            (StatusCode::UNAUTHORIZED, err.to_string()).into_response()
        }
    }
}

/// Drive one admitted connection until it drops.
async fn run_session(socket: WebSocket, principal: Principal, state: AppState) {
    let (tx, mut rx) = mpsc::unbounded_channel();

    let session_id = match state.coordinator.admit(&principal, tx.clone()).await {
        Ok(id) => id,
        Err(err) => {
            tracing::warn!(principal = %principal.id, %err, "admission failed");
            return;
        }
    };

    let (mut sink, mut stream) = socket.split();

    // Writer task: single ordered drain of replies and events.
    let writer = tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = stream.next().await {
        match message {
            Message::Text(text) => {
                let reply = dispatch(&state.coordinator, &principal, text.as_str()).await;
                match ServerMessage::Reply(reply).encode() {
                    Ok(encoded) => {
                        if tx.send(encoded).is_err() {
                            break;
                        }
                    }
                    Err(err) => tracing::error!(%err, "reply encoding failed"),
                }
            }
            Message::Close(_) => break,
            Message::Binary(_) | Message::Ping(_) | Message::Pong(_) => {}
        }
    }

    // The abrupt-drop path and the graceful path converge here; disconnect
    // is idempotent so racing duplicate signals are harmless.
    state.coordinator.disconnect(session_id).await;
    writer.abort();
}

/// Turn one wire message into one reply.
///
/// The acting principal always comes from the authenticated session, never
/// from the message body.
pub async fn dispatch<E, R, P>(
    coordinator: &RideCoordinator<E, R, P>,
    principal: &Principal,
    text: &str,
) -> Reply
where
    E: Environment,
    R: RideStore,
    P: PrincipalStore,
{
    let envelope = match ClientEnvelope::decode(text) {
        Ok(envelope) => envelope,
        Err(err) => return Reply::failure(0, "validation_failed", err.to_string()),
    };

    let id = envelope.id;
    let result = match envelope.intent {
        Intent::RequestRide(request) => {
            payload(coordinator.request_ride(principal.id, request).await)
        }
        Intent::AcceptRide { ride_id } => {
            payload(coordinator.accept_ride(ride_id, principal.id).await)
        }
        Intent::UpdateStatus { ride_id, status } => {
            payload(coordinator.update_status(ride_id, status, principal.id).await)
        }
        Intent::SetOnline => payload(coordinator.set_online(principal.id).await),
        Intent::SetOffline => payload(coordinator.set_offline(principal.id).await),
    };

    match result {
        Ok(value) => Reply::success(id, value),
        Err(err) => Reply::failure(id, err.kind(), err.to_string()),
    }
}

fn payload<T: serde::Serialize>(
    result: Result<T, IntentError>,
) -> Result<serde_json::Value, IntentError> {
    result.and_then(|value| {
        serde_json::to_value(value)
            .map_err(|err| IntentError::Store(StoreError::Serialization(err.to_string())))
    })
}

#[cfg(test)]
mod tests {
    use ridehail_core::SeededEnv;
    use ridehail_proto::{PrincipalId, Role};

    use super::*;
    use crate::registry::ConnectionRegistry;

    type TestCoordinator = RideCoordinator<SeededEnv, MemoryRides, MemoryPrincipals>;

    async fn coordinator_with_rider() -> (TestCoordinator, Principal) {
        let principals = MemoryPrincipals::new();
        let rider = Principal {
            id: PrincipalId(1),
            name: "Avery".to_string(),
            email: "avery@example.com".to_string(),
            phone: String::new(),
            role: Role::Rider,
            is_online: false,
            is_approved: false,
            is_blocked: false,
            vehicle: None,
        };
        principals.insert(rider.clone()).await.unwrap();

        let coordinator = RideCoordinator::new(
            SeededEnv::new(1),
            MemoryRides::new(),
            principals,
            ConnectionRegistry::new(),
        );
        (coordinator, rider)
    }

    #[tokio::test]
    async fn malformed_message_yields_validation_failure() {
        let (coordinator, rider) = coordinator_with_rider().await;

        let reply = dispatch(&coordinator, &rider, "{not json").await;
        assert!(!reply.ok);
        assert_eq!(reply.error.unwrap().kind, "validation_failed");
    }

    #[tokio::test]
    async fn request_ride_replies_with_the_ride() {
        let (coordinator, rider) = coordinator_with_rider().await;

        let text = r#"{
            "id": 5,
            "intent": "request_ride",
            "pickup": { "address": "123 Main" },
            "destination": { "address": "456 Oak" },
            "fare": 12.5
        }"#;

        let reply = dispatch(&coordinator, &rider, text).await;
        assert!(reply.ok, "unexpected failure: {:?}", reply.error);
        assert_eq!(reply.id, 5);

        let data = reply.data.unwrap();
        assert_eq!(data["status"], "requested");
        assert_eq!(data["pickup"]["address"], "123 Main");
        assert!(data["driver"].is_null());
    }

    #[tokio::test]
    async fn errors_carry_stable_kinds() {
        let (coordinator, rider) = coordinator_with_rider().await;

        // A rider toggling presence is not a driver.
        let reply = dispatch(&coordinator, &rider, r#"{ "id": 9, "intent": "set_online" }"#).await;
        assert!(!reply.ok);
        assert_eq!(reply.id, 9);
        assert_eq!(reply.error.unwrap().kind, "forbidden");
    }
}
