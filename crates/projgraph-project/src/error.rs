//! Error taxonomy for project facade operations.
//!
//! Validation failures (`InvalidArgument`, `DuplicateEntry`, `NotFound`)
//! are raised before any state changes, so a rejected call leaves the
//! registries, the pending change set, and the output-path index exactly as
//! they were. Store failures are propagated unchanged and never retried.

use projgraph_core::{CoreError, ProjectId};
use projgraph_store::StoreError;

/// Errors returned by [`Project`](crate::Project) and
/// [`Workspace`](crate::Workspace) operations.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    /// Empty path, self reference, or otherwise unusable argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The path, buffer, or reference is already tracked.
    #[error("duplicate entry: {0}")]
    DuplicateEntry(String),

    /// The path, buffer, or reference is not tracked.
    #[error("not found: {0}")]
    NotFound(String),

    /// The project was removed from the workspace.
    #[error("project {0} has been removed")]
    Removed(ProjectId),

    /// The snapshot store rejected a commit.
    #[error("commit failed: {0}")]
    Store(#[from] StoreError),
}

impl From<CoreError> for ProjectError {
    fn from(err: CoreError) -> Self {
        match &err {
            CoreError::ProjectNotFound { .. }
            | CoreError::DocumentNotFound { .. }
            | CoreError::ReferenceNotFound { .. } => ProjectError::NotFound(err.to_string()),
            CoreError::DuplicateProject { .. }
            | CoreError::DuplicateDocument { .. }
            | CoreError::DuplicateReference { .. } => ProjectError::DuplicateEntry(err.to_string()),
            CoreError::CycleDetected { .. } => ProjectError::InvalidArgument(err.to_string()),
        }
    }
}

/// Rejects empty or whitespace-only paths.
pub(crate) fn require_path(path: &str) -> Result<(), ProjectError> {
    if path.trim().is_empty() {
        return Err(ProjectError::InvalidArgument("path must not be empty".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_onto_taxonomy() {
        let id = ProjectId::new_unique();
        assert!(matches!(
            ProjectError::from(CoreError::ProjectNotFound { id }),
            ProjectError::NotFound(_)
        ));
        assert!(matches!(
            ProjectError::from(CoreError::DuplicateProject { id }),
            ProjectError::DuplicateEntry(_)
        ));
        assert!(matches!(
            ProjectError::from(CoreError::CycleDetected { from: id, to: id }),
            ProjectError::InvalidArgument(_)
        ));
    }

    #[test]
    fn empty_paths_rejected() {
        assert!(matches!(require_path(""), Err(ProjectError::InvalidArgument(_))));
        assert!(matches!(require_path("  "), Err(ProjectError::InvalidArgument(_))));
        assert!(require_path("a.cs").is_ok());
    }
}
