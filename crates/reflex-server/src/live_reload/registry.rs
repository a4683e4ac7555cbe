//! Subscriber registry for live reload.
//!
//! Tracks the set of currently-connected notification subscribers. Each
//! subscriber owns a dedicated bounded outbound channel so one slow
//! client can never starve the others.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

use tokio::sync::mpsc;
use uuid::Uuid;

use super::broadcast::ReloadFrame;

/// Identifier handed out by [`ClientRegistry::register`].
pub type SubscriberId = Uuid;

/// Capacity of each subscriber's outbound channel.
///
/// Reload notifications are small and rare; a subscriber with this many
/// undelivered frames is not reading its connection.
const OUTBOUND_CAPACITY: usize = 16;

/// One registered notification subscriber.
struct Subscriber {
    tx: mpsc::Sender<ReloadFrame>,
    registered_at: Instant,
}

/// Thread-safe registry of connected subscribers.
///
/// Membership changes are atomic with respect to broadcast iteration: a
/// broadcast works from a [`snapshot`](ClientRegistry::snapshot), so the
/// lock is never held across a potentially slow delivery.
#[derive(Default)]
pub struct ClientRegistry {
    subscribers: Mutex<HashMap<SubscriberId, Subscriber>>,
}

impl ClientRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber.
    ///
    /// Returns the subscriber's id and the receiving end of its outbound
    /// channel. The caller streams frames from the receiver and passes
    /// the id back to [`unregister`](Self::unregister) on disconnect.
    pub fn register(&self) -> (SubscriberId, mpsc::Receiver<ReloadFrame>) {
        let (tx, rx) = mpsc::channel(OUTBOUND_CAPACITY);
        let id = Uuid::new_v4();

        let mut subscribers = self.subscribers.lock().unwrap();
        subscribers.insert(
            id,
            Subscriber {
                tx,
                registered_at: Instant::now(),
            },
        );
        tracing::debug!(subscriber = %id, total = subscribers.len(), "Subscriber registered");

        (id, rx)
    }

    /// Remove a subscriber.
    ///
    /// Idempotent: disconnects can be detected from either side of the
    /// same connection, so removing an already-absent id is a no-op.
    pub fn unregister(&self, id: SubscriberId) {
        let mut subscribers = self.subscribers.lock().unwrap();
        if let Some(subscriber) = subscribers.remove(&id) {
            tracing::debug!(
                subscriber = %id,
                connected_secs = subscriber.registered_at.elapsed().as_secs(),
                total = subscribers.len(),
                "Subscriber unregistered"
            );
        }
    }

    /// Consistent snapshot of current subscribers for broadcasting.
    pub(crate) fn snapshot(&self) -> Vec<(SubscriberId, mpsc::Sender<ReloadFrame>)> {
        let subscribers = self.subscribers.lock().unwrap();
        subscribers
            .iter()
            .map(|(id, subscriber)| (*id, subscriber.tx.clone()))
            .collect()
    }

    /// Number of currently registered subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers.lock().unwrap().len()
    }

    /// Whether the registry has no subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_register_inserts_subscriber() {
        let registry = ClientRegistry::new();
        assert!(registry.is_empty());

        let (_id, _rx) = registry.register();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unregister_removes_subscriber() {
        let registry = ClientRegistry::new();
        let (id, _rx) = registry.register();

        registry.unregister(id);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unregister_absent_id_is_noop() {
        let registry = ClientRegistry::new();
        let (id, _rx) = registry.register();

        registry.unregister(id);
        registry.unregister(id);
        registry.unregister(Uuid::new_v4());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_snapshot_reflects_membership() {
        let registry = ClientRegistry::new();
        let (id_a, _rx_a) = registry.register();
        let (id_b, _rx_b) = registry.register();

        registry.unregister(id_a);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].0, id_b);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_register_unregister_stays_consistent() {
        let registry = Arc::new(ClientRegistry::new());

        let mut handles = Vec::new();
        for _ in 0..100 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                let (id, _rx) = registry.register();
                tokio::task::yield_now().await;
                registry.unregister(id);
            }));
        }
        // Snapshots taken concurrently with churn must never observe a
        // duplicate or panic.
        for _ in 0..10 {
            let snapshot = registry.snapshot();
            let mut ids: Vec<_> = snapshot.iter().map(|(id, _)| *id).collect();
            ids.sort_unstable();
            ids.dedup();
            assert_eq!(ids.len(), snapshot.len());
            tokio::task::yield_now().await;
        }

        for handle in handles {
            handle.await.unwrap();
        }
        assert!(registry.is_empty());
    }
}
