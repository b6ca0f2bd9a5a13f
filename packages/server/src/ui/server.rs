//! Server execution logic.

use std::{future::Future, io, sync::Arc};

use axum::{Router, routing::get};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{config::RelayConfig, usecase::RelayServices};

use super::{
    handler::{get_history, get_stats, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("server error: {0}")]
    Io(#[from] io::Error),
}

/// Real-time message relay server
///
/// # Example
///
/// ```ignore
/// let services = Arc::new(RelayServices::new(store, verifier, false));
/// Server::new(services, RelayConfig::default()).run().await?;
/// ```
pub struct Server {
    services: Arc<RelayServices>,
    config: RelayConfig,
}

impl Server {
    pub fn new(services: Arc<RelayServices>, config: RelayConfig) -> Self {
        Self {
            services,
            config: config.normalized(),
        }
    }

    /// Build the axum router with every relay endpoint
    pub fn router(&self) -> Router {
        let app_state = Arc::new(AppState {
            services: Arc::clone(&self.services),
            config: self.config.clone(),
        });

        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/messages/{conversation_id}", get(get_history))
            .route("/api/stats", get(get_stats))
            .layer(TraceLayer::new_for_http())
            .with_state(app_state)
    }

    /// Bind the configured address and serve until Ctrl+C / SIGTERM
    pub async fn run(self) -> Result<(), ServerError> {
        let addr = self.config.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        tracing::info!("Press Ctrl+C to shutdown gracefully");
        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local_addr = listener.local_addr()?;
        tracing::info!("Relay listening on {}", local_addr);
        tracing::info!("Connect to: ws://{}/ws", local_addr);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}
