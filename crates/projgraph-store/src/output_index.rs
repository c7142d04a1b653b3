//! Cross-project output-path index.
//!
//! [`OutputPathIndex`] records which project publishes which output path.
//! It lives outside the snapshot and is updated synchronously, so reference
//! reconciliation sees output-path changes before the owning project's
//! batch commits. A path claimed by more than one project has no owner:
//! converting a reference to it would be ambiguous.

use dashmap::DashMap;

use projgraph_core::ProjectId;

use crate::paths::PathComparison;

/// Concurrent map from output path to the projects publishing it.
#[derive(Debug, Default)]
pub struct OutputPathIndex {
    comparison: PathComparison,
    owners: DashMap<String, Vec<ProjectId>>,
}

impl OutputPathIndex {
    pub fn new(comparison: PathComparison) -> Self {
        OutputPathIndex {
            comparison,
            owners: DashMap::new(),
        }
    }

    /// Records that `project` publishes `path`. Registering the same pair
    /// twice is a no-op.
    pub fn register_output_path(&self, project: ProjectId, path: &str) {
        let mut owners = self.owners.entry(self.comparison.key(path)).or_default();
        if !owners.contains(&project) {
            owners.push(project);
        }
    }

    /// Forgets that `project` publishes `path`. Returns false if it was not
    /// registered.
    pub fn unregister_output_path(&self, project: ProjectId, path: &str) -> bool {
        let key = self.comparison.key(path);
        let removed = match self.owners.get_mut(&key) {
            Some(mut owners) => {
                let before = owners.len();
                owners.retain(|p| *p != project);
                owners.len() != before
            }
            None => false,
        };
        self.owners.remove_if(&key, |_, owners| owners.is_empty());
        removed
    }

    /// Forgets every path `project` publishes. Returns how many were removed.
    pub fn unregister_project(&self, project: ProjectId) -> usize {
        let mut removed = 0;
        self.owners.retain(|_, owners| {
            let before = owners.len();
            owners.retain(|p| *p != project);
            removed += before - owners.len();
            !owners.is_empty()
        });
        removed
    }

    /// The single project publishing `path`, if exactly one does.
    pub fn find_owning_project(&self, path: &str) -> Option<ProjectId> {
        self.owners
            .get(&self.comparison.key(path))
            .and_then(|owners| match owners.as_slice() {
                [only] => Some(*only),
                _ => None,
            })
    }

    /// Number of distinct registered paths.
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}
