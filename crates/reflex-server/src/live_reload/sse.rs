//! Notification endpoint.
//!
//! `GET /poll` holds a server-sent-events stream open and forwards each
//! reload frame from the subscriber's outbound channel to the client.
//! Per-connection lifecycle: register on connect, stream until either
//! the registry evicts the subscriber (channel closed) or the client
//! disconnects (stream dropped), then unregister.

use std::sync::Arc;

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;

use super::registry::{ClientRegistry, SubscriberId};
use crate::state::AppState;

/// Unregisters the subscriber when the connection's stream is dropped.
///
/// Disconnect is observed from the write side (send fails, axum drops
/// the stream) or from the registry side (eviction closes the channel);
/// unregistering is idempotent so both paths are safe.
struct UnregisterOnDrop {
    registry: Arc<ClientRegistry>,
    id: SubscriberId,
}

impl Drop for UnregisterOnDrop {
    fn drop(&mut self) {
        self.registry.unregister(self.id);
    }
}

/// Handle `GET /poll`.
pub(crate) async fn poll_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (id, rx) = state.registry.register();
    let guard = UnregisterOnDrop {
        registry: Arc::clone(&state.registry),
        id,
    };

    let stream = ReceiverStream::new(rx).map(move |frame| {
        let _held = &guard;
        Event::default().json_data(&frame)
    });

    (
        [(header::CACHE_CONTROL, "no-cache")],
        Sse::new(stream).keep_alive(KeepAlive::default()),
    )
}
