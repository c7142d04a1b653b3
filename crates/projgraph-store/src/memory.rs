//! In-memory implementation of [`SnapshotStore`].
//!
//! [`InMemoryStore`] keeps the current snapshot behind an `RwLock<Arc<_>>`
//! so readers clone a pointer and never wait on a commit in progress.
//! Commits are serialized by a separate mutex: each one reads the current
//! version, runs the transition, stamps the next version number, and swaps
//! the pointer. Every commit is appended to a transition log.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use projgraph_core::{ProjectId, Snapshot};

use crate::error::StoreError;
use crate::traits::{SnapshotStore, TransitionFn};

/// One committed transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRecord {
    /// Version the transition produced.
    pub version: u64,
    /// Project that submitted it.
    pub project: ProjectId,
}

/// In-memory snapshot store.
#[derive(Debug)]
pub struct InMemoryStore {
    current: RwLock<Arc<Snapshot>>,
    commit_lock: Mutex<()>,
    log: Mutex<Vec<TransitionRecord>>,
}

impl InMemoryStore {
    /// Creates a store holding an empty snapshot at version zero.
    pub fn new() -> Self {
        Self::with_snapshot(Snapshot::new())
    }

    /// Creates a store whose current version is `snapshot`.
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        InMemoryStore {
            current: RwLock::new(Arc::new(snapshot)),
            commit_lock: Mutex::new(()),
            log: Mutex::new(Vec::new()),
        }
    }

    /// Number of transitions committed so far.
    pub fn transition_count(&self) -> usize {
        self.log.lock().len()
    }

    /// Number of transitions committed on behalf of `project`.
    pub fn transitions_for(&self, project: ProjectId) -> usize {
        self.log.lock().iter().filter(|r| r.project == project).count()
    }

    /// The full transition log, oldest first.
    pub fn transitions(&self) -> Vec<TransitionRecord> {
        self.log.lock().clone()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotStore for InMemoryStore {
    fn current(&self) -> Arc<Snapshot> {
        Arc::clone(&self.current.read())
    }

    fn transform(
        &self,
        project: ProjectId,
        transition: &TransitionFn<'_>,
    ) -> Result<Arc<Snapshot>, StoreError> {
        let _commit = self.commit_lock.lock();

        let base = self.current();
        let version = base.version() + 1;
        let next = Arc::new(transition(&base)?.with_version(version));

        *self.current.write() = Arc::clone(&next);
        self.log.lock().push(TransitionRecord { version, project });
        tracing::debug!(project = %project, version, "snapshot transition committed");

        Ok(next)
    }
}
