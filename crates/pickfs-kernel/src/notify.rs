//! Change notification.
//!
//! The store reports every path it mutates, plus that path's parent, to a
//! [`ChangeSink`]. Notifications are advisory cache invalidation: they fire
//! after the mutation is applied and are never transactional with it. What a
//! path means to the outside world (a URI, a cursor key) is the sink's concern.

use std::sync::Mutex;

use tokio::sync::mpsc;

/// A single change notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Change {
    /// The node at this path (or the listing of this folder) changed.
    Document(String),
    /// The set of roots changed. Issued by a full reset.
    Roots,
}

impl Change {
    /// The path this change refers to, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            Change::Document(path) => Some(path),
            Change::Roots => None,
        }
    }
}

/// Receives change notifications from the store.
pub trait ChangeSink: Send + Sync {
    fn notify(&self, change: Change);
}

impl<F> ChangeSink for F
where
    F: Fn(Change) + Send + Sync,
{
    fn notify(&self, change: Change) {
        self(change)
    }
}

/// Discards every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ChangeSink for NullSink {
    fn notify(&self, _change: Change) {}
}

/// Records notifications in arrival order.
#[derive(Debug, Default)]
pub struct ChangeLog {
    entries: Mutex<Vec<Change>>,
}

impl ChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every change recorded so far.
    pub fn changes(&self) -> Vec<Change> {
        self.lock().clone()
    }

    /// Paths of recorded `Document` changes, in arrival order.
    pub fn paths(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|c| c.path().map(str::to_owned))
            .collect()
    }

    /// Whether a `Document` change for `path` was recorded.
    pub fn contains(&self, path: &str) -> bool {
        self.lock().iter().any(|c| c.path() == Some(path))
    }

    /// Whether a `Roots` change was recorded.
    pub fn saw_roots(&self) -> bool {
        self.lock().iter().any(|c| *c == Change::Roots)
    }

    /// Remove and return everything recorded so far.
    pub fn drain(&self) -> Vec<Change> {
        std::mem::take(&mut *self.lock())
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Change>> {
        // A panic while holding the lock cannot leave a Vec half-pushed.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ChangeSink for ChangeLog {
    fn notify(&self, change: Change) {
        self.lock().push(change);
    }
}

/// Forwards notifications into a bounded channel.
///
/// Uses `try_send`: when the channel is full the notification is dropped.
/// Consumers only learn "this path changed", so a missed duplicate is harmless.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<Change>,
}

impl ChannelSink {
    /// Create a sink and the receiver that consumes its notifications.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Change>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl ChangeSink for ChannelSink {
    fn notify(&self, change: Change) {
        if let Err(e) = self.tx.try_send(change) {
            tracing::debug!(error = %e, "dropped change notification");
        }
    }
}
