//! TCP server used by the notification listener.
//!
//! HTTP/1.1 over TCP using Axum's built-in server, with graceful shutdown
//! driven by a cancellation token.

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::error::{OneM2MError, Result};

/// TCP/HTTP server bound to a single address.
#[derive(Debug, Clone)]
pub struct TcpServer {
    /// Address to listen on.
    listen_addr: SocketAddr,
}

impl TcpServer {
    /// Create a new TCP server.
    pub fn new(listen_addr: SocketAddr) -> Self {
        Self { listen_addr }
    }

    /// Create with default localhost address.
    pub fn localhost(port: u16) -> Self {
        Self::new(SocketAddr::from(([127, 0, 0, 1], port)))
    }

    /// Configured listen address
    pub fn listen_addr(&self) -> SocketAddr {
        self.listen_addr
    }

    /// Bind the socket. Port 0 binds an ephemeral port; see `local_addr`.
    pub async fn bind(&self) -> Result<TcpListener> {
        TcpListener::bind(self.listen_addr).await.map_err(|e| {
            OneM2MError::Listener(format!("Failed to bind TCP to {}: {}", self.listen_addr, e))
        })
    }

    /// Serve `router` on an already bound listener until `shutdown` is cancelled.
    pub async fn serve(
        listener: TcpListener,
        router: Router,
        shutdown: CancellationToken,
    ) -> Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!("TCP server listening on {}", addr);

        axum::serve(listener, router)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .map_err(|e| OneM2MError::Listener(format!("TCP server error: {}", e)))?;

        tracing::info!("TCP server on {} stopped", addr);
        Ok(())
    }
}
