//! HTTP server for the reflex live-reload notifier.
//!
//! Serves the watched folder's contents over HTTP and pushes a reload
//! notification to every connected `/poll` client whenever a file write
//! inside the folder settles.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::path::PathBuf;
//! use std::time::Duration;
//! use reflex_server::{ServerConfig, run_server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig {
//!         host: "127.0.0.1".to_owned(),
//!         port: 8080,
//!         folder: PathBuf::from("public"),
//!         delay: Duration::from_millis(100),
//!     };
//!
//!     run_server(config).await.unwrap();
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! Browser ──HTTP──► axum server (reflex-server)
//!                        │
//!                        ├─► GET /poll (SSE) ◄── Broadcaster ◄── Debouncer
//!                        │                                          ▲
//!                        │                                  notify watcher
//!                        │
//!                        └─► Static files (tower-http ServeDir)
//! ```

mod app;
mod error;
pub mod live_reload;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

pub use error::ServerError;
use live_reload::{ClientRegistry, LiveReloadManager};
use state::AppState;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Folder to watch and serve.
    pub folder: PathBuf,
    /// Debounce quiet period.
    pub delay: Duration,
}

/// Run the server.
///
/// # Errors
///
/// Returns an error if the watcher cannot be started, the listen address
/// is invalid, or the socket cannot be bound. All of these abort startup;
/// the server never partially starts.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let registry = Arc::new(ClientRegistry::new());

    let mut manager =
        LiveReloadManager::new(config.folder.clone(), config.delay, Arc::clone(&registry));
    manager.start()?;

    let state = Arc::new(AppState { registry });
    let app = app::create_router(state, &config.folder);

    let addr = SocketAddr::from_str(&format!("{}:{}", config.host, config.port))?;
    tracing::info!(address = %addr, folder = %config.folder.display(), "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(ServerError::Bind)?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)?;

    // Watching stops when the manager drops with the server.
    drop(manager);

    Ok(())
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}

/// Create server configuration from a loaded reflex config.
#[must_use]
pub fn server_config_from_config(config: &reflex_config::Config) -> ServerConfig {
    ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        folder: config.watch_resolved.folder.clone(),
        delay: config.watch_resolved.delay(),
    }
}
