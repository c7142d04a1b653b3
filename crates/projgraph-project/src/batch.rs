//! Batch scopes.
//!
//! [`TransactionCoordinator`] counts open scopes for one project. Each
//! [`BatchScope`] decrements the count exactly once, on an explicit
//! [`BatchScope::release`] or on drop, and releasing the outermost scope
//! flushes the project's pending changes in one snapshot transition.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::ProjectError;
use crate::project::Project;

/// Nesting counter for a project's batch scopes.
#[derive(Debug, Default)]
pub struct TransactionCoordinator {
    depth: usize,
}

impl TransactionCoordinator {
    /// Opens one nesting level. Returns the new depth.
    pub fn enter(&mut self) -> usize {
        self.depth += 1;
        self.depth
    }

    /// Closes one nesting level. Returns true when the outermost level was
    /// closed and the caller must flush.
    pub fn exit(&mut self) -> bool {
        match self.depth {
            0 => {
                tracing::warn!("batch exit without a matching enter");
                false
            }
            1 => {
                self.depth = 0;
                true
            }
            _ => {
                self.depth -= 1;
                false
            }
        }
    }

    pub fn is_batching(&self) -> bool {
        self.depth > 0
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// Handle for one open batch nesting level.
///
/// Dropping the handle releases it. A flush failure during drop cannot be
/// returned, so it is logged and the pending changes are kept for
/// [`Project::commit_pending`].
#[must_use = "dropping a BatchScope immediately closes the batch"]
pub struct BatchScope {
    project: Project,
    released: AtomicBool,
}

impl BatchScope {
    pub(crate) fn new(project: Project) -> Self {
        BatchScope {
            project,
            released: AtomicBool::new(false),
        }
    }

    /// Closes this nesting level, flushing if it was the outermost one.
    /// Releasing an already released scope does nothing.
    pub fn release(&self) -> Result<(), ProjectError> {
        if self.released.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.project.end_batch()
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for BatchScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchScope")
            .field("project", &self.project.id())
            .field("released", &self.is_released())
            .finish()
    }
}

impl Drop for BatchScope {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            tracing::error!(project = %self.project.id(), error = %err, "batch flush on drop failed");
        }
    }
}
