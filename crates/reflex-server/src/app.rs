//! Router construction.
//!
//! Builds the axum router: the `/poll` notification endpoint plus
//! off-the-shelf static serving of the watched folder.

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::live_reload;
use crate::state::AppState;

/// Create the application router.
///
/// `/poll` streams reload notifications; every other path is served from
/// the watched folder's contents.
pub(crate) fn create_router(state: Arc<AppState>, folder: &Path) -> Router {
    Router::new()
        .route("/poll", get(live_reload::poll_handler))
        .fallback_service(ServeDir::new(folder))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
