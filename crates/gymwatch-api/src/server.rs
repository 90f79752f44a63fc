//! HTTP server lifecycle.
//!
//! [`start_server`] binds the listener and serves until `Ctrl-C`.

use std::net::SocketAddr;
use std::sync::Arc;

use gymwatch_core::config::ApiConfig;
use tokio::net::TcpListener;
use tracing::info;

use crate::router::build_router;
use crate::state::AppState;

/// Bind address of the API server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to listen on.
    pub host: String,
    /// Listening port.
    pub port: u16,
}

impl From<&ApiConfig> for ServerConfig {
    fn from(api: &ApiConfig) -> Self {
        Self {
            host: api.host.clone(),
            port: api.port,
        }
    }
}

impl ServerConfig {
    fn socket_addr(&self) -> Result<SocketAddr, ServerError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ServerError::Bind(format!("invalid address: {e}")))
    }
}

/// Serve the API until `Ctrl-C`.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] if the address is invalid or cannot be
/// bound, and [`ServerError::Serve`] on a fatal I/O error.
pub async fn start_server(config: &ServerConfig, state: Arc<AppState>) -> Result<(), ServerError> {
    let addr = config.socket_addr()?;
    let router = build_router(state);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Bind(format!("{addr}: {e}")))?;

    info!(%addr, "API server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServerError::Serve(e.to_string()))?;

    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

/// Server lifecycle failures.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The address is invalid or already in use.
    #[error("cannot listen: {0}")]
    Bind(String),

    /// Serving stopped on an I/O error.
    #[error("server stopped: {0}")]
    Serve(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_from_api_settings() {
        let api = ApiConfig {
            host: String::from("127.0.0.1"),
            port: 9090,
        };
        let config = ServerConfig::from(&api);
        assert_eq!(config.socket_addr().ok(), "127.0.0.1:9090".parse().ok());
    }

    #[test]
    fn bad_host_is_bind_error() {
        let config = ServerConfig {
            host: String::from("not a host"),
            port: 1,
        };
        assert!(matches!(config.socket_addr(), Err(ServerError::Bind(_))));
    }
}
