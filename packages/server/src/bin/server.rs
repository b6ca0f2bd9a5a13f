//! Real-time message relay server.
//!
//! Run with:
//! ```not_rust
//! PARLEY_JWT_SECRET=secret cargo run --bin parley-server
//! cargo run --bin parley-server -- --host 0.0.0.0 --port 3000 --jwt-secret secret
//! ```

use std::{sync::Arc, time::Duration};

use clap::Parser;
use parley_server::{
    config::RelayConfig,
    infrastructure::{identity::JwtIdentityVerifier, store::InMemoryMessageStore},
    ui::Server,
    usecase::RelayServices,
};
use parley_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "parley-server")]
#[command(about = "Real-time chat message relay over WebSocket", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "PARLEY_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "PARLEY_PORT", default_value = "8080")]
    port: u16,

    /// HS256 secret used to verify access tokens
    #[arg(long, env = "PARLEY_JWT_SECRET", hide_env_values = true)]
    jwt_secret: String,

    /// Seconds a client has to present its credential
    #[arg(long, env = "PARLEY_HANDSHAKE_TIMEOUT_SECS", default_value = "5")]
    handshake_timeout_secs: u64,

    /// Outbound messages buffered per connection before it is dropped
    #[arg(long, env = "PARLEY_OUTBOUND_QUEUE_CAPACITY", default_value = "256")]
    outbound_queue_capacity: usize,

    /// Seconds a single socket write may take
    #[arg(long, env = "PARLEY_WRITE_TIMEOUT_SECS", default_value = "10")]
    write_timeout_secs: u64,

    /// Accept connections without a credential as receive-only sessions
    #[arg(long, env = "PARLEY_ALLOW_ANONYMOUS")]
    allow_anonymous: bool,
}

impl From<Args> for RelayConfig {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            jwt_secret: args.jwt_secret,
            handshake_timeout: Duration::from_secs(args.handshake_timeout_secs),
            outbound_queue_capacity: args.outbound_queue_capacity,
            write_timeout: Duration::from_secs(args.write_timeout_secs),
            allow_anonymous: args.allow_anonymous,
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let config = RelayConfig::from(Args::parse());

    // Initialize dependencies in order:
    // 1. Message Store
    // 2. Identity Verifier
    // 3. UseCases (Registry and Router are created inside)
    // 4. Server
    let store = Arc::new(InMemoryMessageStore::new(Arc::new(SystemClock)));
    let verifier = Arc::new(JwtIdentityVerifier::new(&config.jwt_secret));
    let services = Arc::new(RelayServices::new(store, verifier, config.allow_anonymous));

    if config.allow_anonymous {
        tracing::warn!("Anonymous sessions are enabled");
    }

    let server = Server::new(services, config);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
