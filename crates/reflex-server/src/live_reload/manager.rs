//! Live reload manager.
//!
//! Owns the filesystem watcher and wires it to the debouncer and the
//! broadcaster: raw watch events are filtered to plain writes, debounced
//! into settled changes, enriched with the changed file's content, and
//! fanned out to every subscriber.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use super::broadcast::{Broadcaster, ReloadFrame};
use super::debouncer::{Debouncer, SettledChange};
use super::registry::ClientRegistry;

/// Capacity of the bridge channel between the watcher callback and the
/// async event consumer.
const WATCH_CHANNEL_CAPACITY: usize = 100;

/// Manages file watching and broadcasting of reload notifications.
///
/// The watcher handle must stay alive for the lifetime of the server;
/// dropping the manager stops watching.
pub struct LiveReloadManager {
    folder: PathBuf,
    delay: Duration,
    broadcaster: Broadcaster,
    watcher: Option<RecommendedWatcher>,
}

impl LiveReloadManager {
    /// Create a new live reload manager.
    ///
    /// # Arguments
    ///
    /// * `folder` - Directory to watch for changes
    /// * `delay` - Debounce quiet period; zero disables coalescing
    /// * `registry` - Registry of subscribers to notify
    #[must_use]
    pub fn new(folder: PathBuf, delay: Duration, registry: Arc<ClientRegistry>) -> Self {
        Self {
            folder,
            delay,
            broadcaster: Broadcaster::new(registry),
            watcher: None,
        }
    }

    /// Start the file watcher.
    ///
    /// Spawns background tasks that consume raw watch events and publish
    /// settled reload notifications to registered subscribers.
    ///
    /// # Errors
    ///
    /// Returns an error if the watcher cannot be created or the folder
    /// cannot be watched (missing folder, permission). Both are fatal at
    /// startup; errors reported by the watcher later are logged and the
    /// watch loop continues.
    pub fn start(&mut self) -> Result<(), notify::Error> {
        let (tx, mut rx) = mpsc::channel::<Result<Event, notify::Error>>(WATCH_CHANNEL_CAPACITY);

        // The notify callback is sync, hence blocking_send.
        let mut watcher =
            notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
                let _ = tx.blocking_send(res);
            })?;
        watcher.watch(&self.folder, RecursiveMode::Recursive)?;
        self.watcher = Some(watcher);

        let (debouncer, mut settled_rx) = Debouncer::new(self.delay);

        // Raw event consumer: filter and feed the debouncer.
        tokio::spawn(async move {
            while let Some(res) = rx.recv().await {
                match res {
                    Ok(event) => Self::record_event(&event, &debouncer),
                    Err(err) => {
                        tracing::warn!(error = %err, "Watch error, continuing");
                    }
                }
            }
        });

        // Settled consumer: attach file content and broadcast.
        let broadcaster = self.broadcaster.clone();
        let folder = self.folder.clone();
        tokio::spawn(async move {
            while let Some(change) = settled_rx.recv().await {
                let frame = Self::frame_for(&change, &folder).await;
                broadcaster.publish(&frame);
                tracing::info!(path = %frame.path, "Reload notification published");
            }
        });

        Ok(())
    }

    /// Record a raw filesystem event into the debouncer.
    ///
    /// Only plain write/data modifications count; create, remove, rename
    /// and metadata changes (chmod) are ignored.
    fn record_event(event: &Event, debouncer: &Debouncer) {
        if !matches!(
            event.kind,
            EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any)
        ) {
            return;
        }

        for path in &event.paths {
            tracing::debug!(path = %path.display(), "Modified file");
            debouncer.record(path.clone());
        }
    }

    /// Build the reload frame for a settled change.
    ///
    /// A file that cannot be read at settle time (deleted mid-event)
    /// still produces a notification, with the empty marker as payload.
    async fn frame_for(change: &SettledChange, folder: &Path) -> ReloadFrame {
        let display_path = change.path.strip_prefix(folder).unwrap_or(&change.path);

        match tokio::fs::read(&change.path).await {
            Ok(bytes) => {
                let content = String::from_utf8_lossy(&bytes).into_owned();
                ReloadFrame::new(display_path, Some(content))
            }
            Err(err) => {
                tracing::warn!(
                    path = %change.path.display(),
                    error = %err,
                    "Failed to read changed file, notifying with empty payload"
                );
                ReloadFrame::new(display_path, None)
            }
        }
    }
}
