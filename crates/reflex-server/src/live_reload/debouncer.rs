//! Write-burst debouncing for live reload.
//!
//! Editors routinely emit several write events per save. The debouncer
//! collapses a burst of writes into a single settled change, emitted
//! only after the configured quiet period has elapsed with no new write.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::task::AbortHandle;

/// A filesystem change confirmed quiet for the full debounce window.
///
/// When several distinct files change within one window, the settled
/// change references only the most recently written path. Callers that
/// need per-file granularity must not treat `path` as exhaustive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SettledChange {
    /// Most recently written path in the window.
    pub path: PathBuf,
}

/// Mutable debounce state, one instance per watched root.
struct DebounceState {
    last_event_at: Instant,
    last_path: PathBuf,
    pending: Option<AbortHandle>,
}

/// Thread-safe single-window debouncer.
///
/// Each recorded write re-arms a single delayed timer; at any instant at
/// most one timer is pending. A timer that fires concurrently with a new
/// write resolves the race by re-checking the elapsed time under the
/// state lock rather than relying on cancellation being atomic.
pub struct Debouncer {
    inner: Arc<Inner>,
}

struct Inner {
    delay: Duration,
    state: Mutex<DebounceState>,
    settled_tx: mpsc::UnboundedSender<SettledChange>,
}

impl Debouncer {
    /// Create a debouncer and the channel on which settled changes arrive.
    ///
    /// A `delay` of zero disables coalescing: every recorded write is
    /// emitted immediately.
    pub fn new(delay: Duration) -> (Self, mpsc::UnboundedReceiver<SettledChange>) {
        let (settled_tx, settled_rx) = mpsc::unbounded_channel();
        let debouncer = Self {
            inner: Arc::new(Inner {
                delay,
                state: Mutex::new(DebounceState {
                    last_event_at: Instant::now(),
                    last_path: PathBuf::new(),
                    pending: None,
                }),
                settled_tx,
            }),
        };
        (debouncer, settled_rx)
    }

    /// Record one raw write event.
    ///
    /// Thread-safe; must be called from within a tokio runtime so the
    /// replacement timer task can be spawned.
    pub fn record(&self, path: PathBuf) {
        if self.inner.delay.is_zero() {
            let _ = self.inner.settled_tx.send(SettledChange { path });
            return;
        }

        let mut state = self.inner.state.lock().unwrap();
        state.last_event_at = Instant::now();
        state.last_path = path;

        // Replace the pending timer rather than stacking a second one.
        if let Some(pending) = state.pending.take() {
            pending.abort();
        }

        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(inner.delay).await;
            inner.fire();
        });
        state.pending = Some(handle.abort_handle());
    }
}

impl Inner {
    /// Timer callback: emit the settled change if the window is still quiet.
    fn fire(&self) {
        let mut state = self.state.lock().unwrap();

        // A newer write re-armed the window while this timer was in
        // flight; its own timer will fire later.
        if state.last_event_at.elapsed() < self.delay {
            return;
        }

        state.pending = None;
        let change = SettledChange {
            path: state.last_path.clone(),
        };
        drop(state);

        let _ = self.settled_tx.send(change);
    }
}
