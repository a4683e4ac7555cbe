//! Application state.
//!
//! Shared state for all request handlers.

use std::sync::Arc;

use crate::live_reload::ClientRegistry;

/// Application state shared across all handlers.
pub(crate) struct AppState {
    /// Registry of connected notification subscribers.
    pub(crate) registry: Arc<ClientRegistry>,
}
