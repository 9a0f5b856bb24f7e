use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::AppState;

/// PVL HTTP server.
pub struct PvlServer {
    state: AppState,
}

impl PvlServer {
    /// Open the configured store and prepare the ledger.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        Ok(Self {
            state: AppState::open(config)?,
        })
    }

    pub fn from_state(state: AppState) -> Self {
        Self { state }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.state.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    /// Start serving requests until Ctrl-C.
    pub async fn serve(self) -> ServerResult<()> {
        let addr = self.state.config.bind_addr;
        let app = self.router();
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(
            %addr,
            records = self.state.ledger.len().unwrap_or(0),
            "PVL server listening"
        );
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
