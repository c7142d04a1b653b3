//! The [`SnapshotStore`] trait: the commit contract projects rely on.
//!
//! A store owns the current [`Snapshot`]. Projects never keep a private
//! copy; they read the current version and submit a pure transition
//! function. The store applies it to the current version and publishes the
//! result as the next version, indivisibly from the point of view of
//! readers. Single-operation commits and batched flushes use the same
//! primitive.

use std::sync::Arc;

use projgraph_core::{CoreError, ProjectId, Snapshot};

use crate::error::StoreError;

/// A pure function from the current snapshot to the proposed next one.
pub type TransitionFn<'a> = dyn Fn(&Snapshot) -> Result<Snapshot, CoreError> + 'a;

/// Atomic snapshot store shared by every project of a host.
pub trait SnapshotStore: Send + Sync {
    /// The current snapshot version.
    fn current(&self) -> Arc<Snapshot>;

    /// Applies `transition` to the current snapshot on behalf of `project`
    /// and publishes the result as the next version.
    ///
    /// If the transition fails, nothing is published and the error is
    /// returned as-is. Returns the published snapshot.
    fn transform(
        &self,
        project: ProjectId,
        transition: &TransitionFn<'_>,
    ) -> Result<Arc<Snapshot>, StoreError>;
}
