//! Ridehail coordination server.
//!
//! Single-node event-distribution point for ride lifecycle coordination:
//! riders request trips, drivers accept and execute them, and both sides get
//! live updates over WebSocket as a ride moves through its lifecycle.
//!
//! # Architecture
//!
//! - [`ConnectionRegistry`]: authenticated sessions, their broadcast groups,
//!   and their outbound channels. Built once at bootstrap, passed by handle.
//! - [`RideCoordinator`]: applies lifecycle intents against the stores under
//!   a per-ride exclusion guard and produces notifications.
//! - [`Notifier`]: resolves notification targets and delivers fire-and-forget.
//! - [`SessionBootstrap`]: verifies credentials before a connection is
//!   admitted.
//! - [`transport`]: the axum WebSocket surface and intent dispatch.
//!
//! Data flow: connection → bootstrap (auth) → registry (join) → coordinator
//! (intents) → stores (persist) → notifier (emit) → registry (route).

pub mod bootstrap;
pub mod coordinator;
pub mod error;
pub mod fanout;
pub mod locks;
pub mod registry;
pub mod seed;
pub mod system_env;
pub mod transport;

pub use bootstrap::{CredentialError, CredentialVerifier, SessionBootstrap, TokenTable};
pub use coordinator::{AcceptedRide, PresenceAck, RideCoordinator};
pub use error::ServerError;
pub use fanout::Notifier;
pub use locks::{RideGuard, RideLocks};
pub use registry::{ConnectionRegistry, LeftSession, OutboundReceiver, OutboundSender, SessionInfo};
pub use system_env::SystemEnv;
pub use transport::{AppBootstrap, AppCoordinator, AppState, ServerConfig, router, serve};
