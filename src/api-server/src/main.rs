//! Pantry API server
//!
//! ```bash
//! PANTRY_DEV_USERS=alice,bob RUST_LOG=debug pantry-server
//! pantry-server --host 127.0.0.1 --port 9090 --dev-users alice
//! ```

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use pantry_api_server::{AppState, Server, ServerConfig};
use pantry_authz::InMemorySessions;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::parse();
    init_tracing(&config);

    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let sessions = Arc::new(InMemorySessions::new());
    for user in config.session_users() {
        let token = sessions.issue(user);
        info!(user = %user, token = %token, "Issued development session");
    }

    let state = AppState::new(&config, sessions);
    let server = Server::new(config, state);

    if let Err(e) = server.run().await {
        error!("Server error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

fn init_tracing(config: &ServerConfig) {
    let filter = tracing_subscriber::EnvFilter::try_new(&config.log_level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}
