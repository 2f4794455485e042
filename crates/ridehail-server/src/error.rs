//! Server startup and transport errors.
//!
//! Lifecycle intents report through `ridehail_core::IntentError`; this type
//! covers the paths around them - binding the listener, bad configuration.

use thiserror::Error;

/// Errors that can occur while starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Invalid configuration (unparseable bind address, bad seed data).
    ///
    /// Fatal at startup; fix the configuration and restart.
    #[error("configuration error: {0}")]
    Config(String),

    /// Listener/network failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Store failure during startup provisioning.
    #[error("store error: {0}")]
    Store(#[from] ridehail_core::StoreError),
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<std::net::AddrParseError> for ServerError {
    fn from(err: std::net::AddrParseError) -> Self {
        Self::Config(err.to_string())
    }
}
