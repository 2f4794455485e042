//! Ridehail server binary.
//!
//! # Usage
//!
//! ```bash
//! # Dev server with seeded demo principals (rider-token / driver-token / admin-token)
//! ridehail-server --bind 0.0.0.0:8080
//!
//! # Without demo data
//! ridehail-server --bind 0.0.0.0:8080 --no-seed
//! ```

use std::sync::Arc;

use clap::Parser;
use ridehail_core::{MemoryPrincipals, MemoryRides};
use ridehail_server::{
    AppState, ConnectionRegistry, RideCoordinator, ServerConfig, SessionBootstrap, SystemEnv,
    TokenTable, seed,
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Ridehail coordination server
#[derive(Parser, Debug)]
#[command(name = "ridehail-server")]
#[command(about = "Realtime ride coordination server")]
#[command(version)]
struct Args {
    /// Address to bind to
    #[arg(short, long, default_value = "0.0.0.0:8080")]
    bind: String,

    /// Skip seeding demo principals and tokens
    #[arg(long)]
    no_seed: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!("ridehail server starting");

    let rides = MemoryRides::new();
    let principals = MemoryPrincipals::new();
    let tokens = TokenTable::new();

    if args.no_seed {
        tracing::warn!("running without seeded principals - no token can authenticate yet");
    } else {
        seed::seed_demo(&principals, &tokens).await?;
    }

    // The registry is built exactly once here and handed to every consumer
    // by handle; nothing re-creates it lazily.
    let registry = ConnectionRegistry::new();
    let coordinator = RideCoordinator::new(
        SystemEnv::new(),
        rides,
        principals.clone(),
        registry,
    );
    let bootstrap = SessionBootstrap::new(tokens, principals);

    let state = AppState { coordinator: Arc::new(coordinator), bootstrap };
    let config = ServerConfig { bind_address: args.bind };

    ridehail_server::serve(config, state).await?;

    Ok(())
}
