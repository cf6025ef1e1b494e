//! Background server startup.
//!
//! Provides [`spawn_server`] which binds eagerly and then serves on a
//! background Tokio task, returning the bound address. Used by the
//! end-to-end tests and by embedders that run other work alongside the
//! server.
//!
//! # Usage
//!
//! ```rust,ignore
//! use todosync_server::startup::spawn_server;
//! use todosync_server::{AppState, ServerConfig};
//! use todosync_db::MemoryItemStore;
//! use std::sync::Arc;
//!
//! let state = Arc::new(AppState::new(MemoryItemStore::new()));
//! let running = spawn_server(&ServerConfig::default(), state).await?;
//! println!("listening on {}", running.addr);
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::server::{self, ServerConfig, ServerError};
use crate::state::AppState;

/// Errors that can occur when spawning the server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// A server running on a background task.
#[derive(Debug)]
pub struct RunningServer {
    /// The address the listener is bound to.
    pub addr: SocketAddr,
    /// The serving task.
    pub handle: JoinHandle<()>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl RunningServer {
    /// Ask the server to stop accepting connections and wait for it.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            // The receiver is gone only if the server already exited.
            let _ = tx.send(());
        }
        if let Err(e) = self.handle.await {
            tracing::warn!(error = %e, "Server task ended abnormally");
        }
    }
}

/// Bind and serve on a background Tokio task.
///
/// Binding happens before the task is spawned, so a port conflict is
/// reported to the caller and `config.port = 0` yields the real port
/// in [`RunningServer::addr`].
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the server cannot bind.
pub async fn spawn_server(
    config: &ServerConfig,
    state: Arc<AppState>,
) -> Result<RunningServer, StartupError> {
    let listener = server::bind(config).await?;
    let addr = listener
        .local_addr()
        .map_err(|e| ServerError::Bind(format!("local address unavailable: {e}")))?;

    let (tx, rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(async move {
        let shutdown = async move {
            let _ = rx.await;
        };
        if let Err(e) = server::serve(listener, state, shutdown).await {
            tracing::error!(error = %e, "todosync server exited with error");
        }
    });

    tracing::info!(%addr, "todosync server spawned on background task");

    Ok(RunningServer {
        addr,
        handle,
        shutdown: Some(tx),
    })
}
