//! Differences between two snapshot versions.
//!
//! Compares an older snapshot against a newer one and categorizes projects
//! as added, removed, or changed. For a changed project, [`ProjectDiff`]
//! lists the documents and references that came and went. Document content
//! changes (reloads) are detected by hash, so a reload shows up as a changed
//! document even though its identity is unchanged.

use std::collections::{BTreeSet, HashMap, HashSet};

use projgraph_core::{
    DocumentCollection, DocumentId, MetadataReference, ProjectId, ProjectReference, ProjectState,
    Snapshot,
};

use crate::error::StoreError;
use crate::hash::{hash_document, hash_project};

/// What changed inside one project between two versions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectDiff {
    pub added_documents: BTreeSet<DocumentId>,
    pub removed_documents: BTreeSet<DocumentId>,
    /// Same identity, different content (e.g. reloaded).
    pub changed_documents: BTreeSet<DocumentId>,
    pub added_metadata_references: Vec<MetadataReference>,
    pub removed_metadata_references: Vec<MetadataReference>,
    pub added_project_references: Vec<ProjectReference>,
    pub removed_project_references: Vec<ProjectReference>,
    pub analyzer_references_changed: bool,
    /// Any scalar property (names, paths, options) changed.
    pub properties_changed: bool,
}

impl ProjectDiff {
    /// Compares two versions of the same project.
    pub fn between(old: &ProjectState, new: &ProjectState) -> Result<Self, StoreError> {
        let mut diff = ProjectDiff::default();

        for collection in [DocumentCollection::Source, DocumentCollection::Additional] {
            let old_docs = old.documents(collection);
            let new_docs = new.documents(collection);
            for (id, doc) in new_docs {
                match old_docs.get(id) {
                    None => {
                        diff.added_documents.insert(*id);
                    }
                    Some(prev) if prev != doc => {
                        if hash_document(prev)? != hash_document(doc)? {
                            diff.changed_documents.insert(*id);
                        }
                    }
                    Some(_) => {}
                }
            }
            for id in old_docs.keys() {
                if !new_docs.contains_key(id) {
                    diff.removed_documents.insert(*id);
                }
            }
        }

        diff.added_metadata_references = missing_from(new.metadata_references(), old.metadata_references());
        diff.removed_metadata_references = missing_from(old.metadata_references(), new.metadata_references());
        diff.added_project_references = missing_from(new.project_references(), old.project_references());
        diff.removed_project_references = missing_from(old.project_references(), new.project_references());
        diff.analyzer_references_changed = old.analyzer_references() != new.analyzer_references();
        diff.properties_changed = old.name != new.name
            || old.assembly_name != new.assembly_name
            || old.file_path != new.file_path
            || old.output_file_path != new.output_file_path
            || old.output_ref_file_path != new.output_ref_file_path
            || old.compilation_options != new.compilation_options
            || old.parse_options != new.parse_options;

        Ok(diff)
    }

    /// Returns true if nothing changed.
    pub fn is_clean(&self) -> bool {
        self.added_documents.is_empty()
            && self.removed_documents.is_empty()
            && self.changed_documents.is_empty()
            && self.added_metadata_references.is_empty()
            && self.removed_metadata_references.is_empty()
            && self.added_project_references.is_empty()
            && self.removed_project_references.is_empty()
            && !self.analyzer_references_changed
            && !self.properties_changed
    }
}

/// The set of projects that differ between two snapshots.
#[derive(Debug, Clone, Default)]
pub struct SnapshotDiff {
    pub added: HashSet<ProjectId>,
    pub removed: HashSet<ProjectId>,
    pub changed: HashMap<ProjectId, ProjectDiff>,
}

impl SnapshotDiff {
    /// Returns true if the two snapshots hold the same content.
    pub fn is_clean(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    /// Total number of added, removed, and changed projects.
    pub fn total(&self) -> usize {
        self.added.len() + self.removed.len() + self.changed.len()
    }
}

/// Computes the diff from `old` to `new`.
///
/// Projects whose allocation is shared by both snapshots are skipped
/// without hashing; projects rebuilt with identical content are reported
/// as unchanged.
pub fn compute_snapshot_diff(old: &Snapshot, new: &Snapshot) -> Result<SnapshotDiff, StoreError> {
    let mut diff = SnapshotDiff::default();

    for project in new.projects() {
        match old.project(project.id) {
            None => {
                diff.added.insert(project.id);
            }
            Some(_) if new.shares_project_with(old, project.id) => {}
            Some(prev) => {
                if hash_project(prev)? != hash_project(project)? {
                    let project_diff = ProjectDiff::between(prev, project)?;
                    diff.changed.insert(project.id, project_diff);
                }
            }
        }
    }

    for id in old.project_ids() {
        if !new.contains_project(id) {
            diff.removed.insert(id);
        }
    }

    Ok(diff)
}

fn missing_from<T: Clone + PartialEq>(items: &[T], other: &[T]) -> Vec<T> {
    items
        .iter()
        .filter(|item| !other.contains(*item))
        .cloned()
        .collect()
}
