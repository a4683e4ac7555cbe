//! Live reload engine.
//!
//! Data flow: watch source → [`Debouncer`] → [`Broadcaster`] →
//! [`ClientRegistry`] → each subscriber's `/poll` stream.

mod broadcast;
mod debouncer;
mod manager;
mod registry;
mod sse;

pub use broadcast::{Broadcaster, ReloadFrame};
pub use debouncer::{Debouncer, SettledChange};
pub use manager::LiveReloadManager;
pub use registry::{ClientRegistry, SubscriberId};
pub(crate) use sse::poll_handler;
