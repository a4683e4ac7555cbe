//! Server error types.

use std::net::AddrParseError;

/// Fatal server errors.
///
/// Everything here means the service cannot do its job at all; per-file
/// and per-subscriber failures are handled where they occur and never
/// surface as a `ServerError`.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// File watcher could not be created or attached to the folder.
    #[error("Failed to start file watcher: {0}")]
    Watch(#[from] notify::Error),

    /// Listen address could not be parsed.
    #[error("Invalid listen address: {0}")]
    Addr(#[from] AddrParseError),

    /// Listen socket could not be bound.
    #[error("Failed to bind listener: {0}")]
    Bind(std::io::Error),

    /// The HTTP server failed while running.
    #[error("Server error: {0}")]
    Serve(std::io::Error),
}
