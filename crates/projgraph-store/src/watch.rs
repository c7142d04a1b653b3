//! Boundary to the file-system watch subsystem.
//!
//! Projects hold one [`WatchToken`] per tracked file and release it when the
//! file stops being tracked. Change notifications travel the other way, as
//! [`FileChangeEvent`]s on an unbounded tokio channel, so they arrive on
//! whatever task drains the channel rather than on the caller's thread.
//!
//! [`InMemoryWatcher`] is the in-process implementation: it counts active
//! watches and lets the host (or a test) raise change events by hand.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::mpsc;

/// Handle for one active watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchToken(pub u64);

/// A file the watch subsystem saw change on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChangeEvent {
    pub path: String,
}

/// Watch subsystem contract consumed by project registries.
pub trait FileWatcher: Send + Sync {
    /// Starts watching `path`.
    fn watch(&self, path: &str) -> WatchToken;

    /// Releases a watch. Unknown tokens are ignored.
    fn unwatch(&self, token: WatchToken);
}

/// In-process watcher with an optional change feed.
#[derive(Debug)]
pub struct InMemoryWatcher {
    next_token: AtomicU64,
    active: DashMap<WatchToken, String>,
    feed: Option<mpsc::UnboundedSender<FileChangeEvent>>,
}

impl InMemoryWatcher {
    /// A watcher without a change feed; [`InMemoryWatcher::raise_change`]
    /// reports nothing.
    pub fn new() -> Self {
        InMemoryWatcher {
            next_token: AtomicU64::new(1),
            active: DashMap::new(),
            feed: None,
        }
    }

    /// A watcher whose change events are delivered to the returned receiver.
    pub fn with_feed() -> (Self, mpsc::UnboundedReceiver<FileChangeEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let watcher = InMemoryWatcher {
            feed: Some(tx),
            ..Self::new()
        };
        (watcher, rx)
    }

    /// Number of watches currently held.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Returns true if at least one watch covers `path`.
    pub fn is_watching(&self, path: &str) -> bool {
        self.active.iter().any(|entry| entry.value() == path)
    }

    /// Raises a change event for `path` if it is watched. Returns true if an
    /// event was sent.
    pub fn raise_change(&self, path: &str) -> bool {
        if !self.is_watching(path) {
            return false;
        }
        match &self.feed {
            Some(feed) => feed
                .send(FileChangeEvent {
                    path: path.to_string(),
                })
                .is_ok(),
            None => false,
        }
    }
}

impl Default for InMemoryWatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl FileWatcher for InMemoryWatcher {
    fn watch(&self, path: &str) -> WatchToken {
        let token = WatchToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        self.active.insert(token, path.to_string());
        token
    }

    fn unwatch(&self, token: WatchToken) {
        if self.active.remove(&token).is_none() {
            tracing::debug!(token = token.0, "unwatch of unknown token ignored");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watch_and_unwatch_track_count() {
        let watcher = InMemoryWatcher::new();
        let a = watcher.watch("a.cs");
        let b = watcher.watch("b.cs");
        assert_ne!(a, b);
        assert_eq!(watcher.active_count(), 2);
        assert!(watcher.is_watching("a.cs"));

        watcher.unwatch(a);
        watcher.unwatch(a);
        assert_eq!(watcher.active_count(), 1);
        assert!(!watcher.is_watching("a.cs"));
    }

    #[tokio::test]
    async fn raise_change_only_for_watched_paths() {
        let (watcher, mut rx) = InMemoryWatcher::with_feed();
        watcher.watch("a.cs");

        assert!(watcher.raise_change("a.cs"));
        assert!(!watcher.raise_change("b.cs"));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.path, "a.cs");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn raise_change_without_feed_reports_nothing() {
        let watcher = InMemoryWatcher::new();
        watcher.watch("a.cs");
        assert!(!watcher.raise_change("a.cs"));
    }
}
