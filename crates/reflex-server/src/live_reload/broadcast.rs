//! Reload notification fan-out.
//!
//! Delivers one settled change to every registered subscriber without
//! letting any single subscriber delay or fail delivery to the rest.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc::error::TrySendError;

use super::registry::ClientRegistry;

/// One reload notification as delivered to a subscriber.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct ReloadFrame {
    /// Path of the settled change, relative to the watched folder when
    /// possible.
    pub path: String,
    /// Content of the changed file. `None` is the empty marker used when
    /// the file could not be read at settle time.
    pub content: Option<String>,
}

impl ReloadFrame {
    /// Build a frame for a settled change.
    pub(crate) fn new(path: &Path, content: Option<String>) -> Self {
        Self {
            path: path.display().to_string(),
            content,
        }
    }
}

/// Pushes reload frames to every registered subscriber.
#[derive(Clone)]
pub struct Broadcaster {
    registry: Arc<ClientRegistry>,
}

impl Broadcaster {
    /// Create a broadcaster over the given registry.
    #[must_use]
    pub fn new(registry: Arc<ClientRegistry>) -> Self {
        Self { registry }
    }

    /// Deliver `frame` to every currently registered subscriber.
    ///
    /// Delivery enqueues into each subscriber's bounded channel and never
    /// blocks. A subscriber whose channel is full or closed is treated as
    /// dead: its frame is dropped and it is removed from the registry.
    /// Within one subscriber's channel, frames arrive in publish order.
    pub fn publish(&self, frame: &ReloadFrame) {
        for (id, tx) in self.registry.snapshot() {
            match tx.try_send(frame.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(subscriber = %id, "Subscriber not draining, dropping it");
                    self.registry.unregister(id);
                }
                Err(TrySendError::Closed(_)) => {
                    self.registry.unregister(id);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;
    use std::time::Duration;
    use tokio::time::timeout;

    fn frame(n: usize) -> ReloadFrame {
        ReloadFrame::new(&PathBuf::from(format!("/site/{n}.html")), None)
    }

    #[test]
    fn test_frame_serializes_content_and_empty_marker() {
        let with_content =
            ReloadFrame::new(&PathBuf::from("index.html"), Some("hello".to_owned()));
        let json = serde_json::to_value(&with_content).unwrap();
        assert_eq!(json["path"], "index.html");
        assert_eq!(json["content"], "hello");

        let empty = ReloadFrame::new(&PathBuf::from("gone.html"), None);
        let json = serde_json::to_value(&empty).unwrap();
        assert!(json["content"].is_null());
    }

    #[tokio::test]
    async fn test_registered_subscriber_receives_publish() {
        let registry = Arc::new(ClientRegistry::new());
        let broadcaster = Broadcaster::new(Arc::clone(&registry));
        let (_id, mut rx) = registry.register();

        broadcaster.publish(&frame(1));

        assert_eq!(rx.recv().await.unwrap(), frame(1));
    }

    #[tokio::test]
    async fn test_unregistered_subscriber_does_not_receive() {
        let registry = Arc::new(ClientRegistry::new());
        let broadcaster = Broadcaster::new(Arc::clone(&registry));
        let (id, mut rx) = registry.register();

        registry.unregister(id);
        broadcaster.publish(&frame(1));

        // Sender side was dropped with the registry entry.
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_publish_preserves_order_per_subscriber() {
        let registry = Arc::new(ClientRegistry::new());
        let broadcaster = Broadcaster::new(Arc::clone(&registry));
        let (_id, mut rx) = registry.register();

        for n in 0..5 {
            broadcaster.publish(&frame(n));
        }
        for n in 0..5 {
            assert_eq!(rx.recv().await.unwrap(), frame(n));
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_slow_subscriber_dropped_without_blocking_fast_one() {
        let registry = Arc::new(ClientRegistry::new());
        let broadcaster = Broadcaster::new(Arc::clone(&registry));

        // Slow: never drains. Fast: drains continuously.
        let (slow_id, slow_rx) = registry.register();
        let (_fast_id, mut fast_rx) = registry.register();

        let total = 24;
        let drain = tokio::spawn(async move {
            let mut received = Vec::new();
            while received.len() < total {
                match timeout(Duration::from_secs(2), fast_rx.recv()).await {
                    Ok(Some(frame)) => received.push(frame),
                    _ => break,
                }
            }
            received
        });

        for n in 0..total {
            broadcaster.publish(&frame(n));
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        // The fast subscriber got everything, in order, regardless of the
        // slow subscriber's backlog.
        let received = drain.await.unwrap();
        assert_eq!(received.len(), total);
        assert_eq!(received[0], frame(0));
        assert_eq!(received[total - 1], frame(total - 1));

        // The slow subscriber was evicted once its channel filled.
        assert_eq!(registry.len(), 1);
        assert!(registry.snapshot().iter().all(|(id, _)| *id != slow_id));
        drop(slow_rx);
    }

    #[tokio::test]
    async fn test_publish_evicts_closed_channel() {
        let registry = Arc::new(ClientRegistry::new());
        let broadcaster = Broadcaster::new(Arc::clone(&registry));

        let (_id, rx) = registry.register();
        drop(rx);

        broadcaster.publish(&frame(1));
        assert!(registry.is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_churn_and_publish() {
        let registry = Arc::new(ClientRegistry::new());
        let broadcaster = Broadcaster::new(Arc::clone(&registry));

        let mut handles = Vec::new();
        for _ in 0..100 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                let (id, mut rx) = registry.register();
                // Drain whatever arrives while registered.
                let _ = timeout(Duration::from_millis(1), rx.recv()).await;
                registry.unregister(id);
            }));
        }
        for n in 0..10 {
            broadcaster.publish(&frame(n));
            tokio::task::yield_now().await;
        }

        for handle in handles {
            handle.await.unwrap();
        }
        assert!(registry.is_empty());
    }
}
