//! Pending reference and property changes of one batch.
//!
//! Documents are tracked by the registries; everything else a batch defers
//! lands here. Adding an item whose removal is pending (or the reverse)
//! cancels the pending operation instead of queueing both, so an add and a
//! remove of the same item within a batch nets to nothing.

use indexmap::IndexSet;
use serde::Serialize;

use projgraph_core::{AnalyzerReference, MetadataReference, ProjectProperty, ProjectReference};

/// A set of pending adds and removes of one item type.
#[derive(Debug, Clone)]
pub struct PendingSet<T> {
    added: IndexSet<T>,
    removed: IndexSet<T>,
}

impl<T> Default for PendingSet<T> {
    fn default() -> Self {
        PendingSet {
            added: IndexSet::new(),
            removed: IndexSet::new(),
        }
    }
}

impl<T: std::hash::Hash + Eq> PendingSet<T> {
    /// Queues an add, or cancels a pending remove of the same item.
    pub fn add(&mut self, item: T) {
        if !self.removed.shift_remove(&item) {
            self.added.insert(item);
        }
    }

    /// Queues a remove, or cancels a pending add of the same item.
    pub fn remove(&mut self, item: T) {
        if !self.added.shift_remove(&item) {
            self.removed.insert(item);
        }
    }

    pub fn added(&self) -> impl Iterator<Item = &T> {
        self.added.iter()
    }

    pub fn removed(&self) -> impl Iterator<Item = &T> {
        self.removed.iter()
    }

    /// Drops pending adds and removes for which `keep` returns false.
    pub fn retain(&mut self, keep: impl Fn(&T) -> bool) {
        self.added.retain(|item| keep(item));
        self.removed.retain(|item| keep(item));
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Everything a batch defers apart from documents.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    pub metadata_references: PendingSet<MetadataReference>,
    pub project_references: PendingSet<ProjectReference>,
    pub analyzer_references: PendingSet<AnalyzerReference>,
    properties: Vec<ProjectProperty>,
}

impl ChangeSet {
    /// Queues a property rewrite. Rewrites apply in insertion order.
    pub fn push_property(&mut self, property: ProjectProperty) {
        self.properties.push(property);
    }

    pub fn properties(&self) -> &[ProjectProperty] {
        &self.properties
    }

    pub fn is_empty(&self) -> bool {
        self.metadata_references.is_empty()
            && self.project_references.is_empty()
            && self.analyzer_references.is_empty()
            && self.properties.is_empty()
    }

    /// Clears the set and releases its storage.
    pub fn release(&mut self) {
        *self = ChangeSet::default();
    }
}

/// Counts of what the next flush would commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PendingChanges {
    pub documents_added: usize,
    pub documents_removed: usize,
    pub metadata_references_added: usize,
    pub metadata_references_removed: usize,
    pub project_references_added: usize,
    pub project_references_removed: usize,
    pub analyzer_references_added: usize,
    pub analyzer_references_removed: usize,
    pub property_rewrites: usize,
}

impl PendingChanges {
    pub(crate) fn from_change_set(changes: &ChangeSet, documents_added: usize, documents_removed: usize) -> Self {
        PendingChanges {
            documents_added,
            documents_removed,
            metadata_references_added: changes.metadata_references.added.len(),
            metadata_references_removed: changes.metadata_references.removed.len(),
            project_references_added: changes.project_references.added.len(),
            project_references_removed: changes.project_references.removed.len(),
            analyzer_references_added: changes.analyzer_references.added.len(),
            analyzer_references_removed: changes.analyzer_references.removed.len(),
            property_rewrites: changes.properties.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == PendingChanges::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use projgraph_core::ReferenceProperties;

    fn lib(path: &str) -> MetadataReference {
        MetadataReference::new(path, ReferenceProperties::assembly())
    }

    #[test]
    fn add_then_remove_cancels() {
        let mut changes = ChangeSet::default();
        changes.metadata_references.add(lib("x.dll"));
        changes.metadata_references.remove(lib("x.dll"));
        assert!(changes.is_empty());
    }

    #[test]
    fn remove_then_add_cancels() {
        let mut changes = ChangeSet::default();
        changes.analyzer_references.remove(AnalyzerReference::new("a.dll"));
        changes.analyzer_references.add(AnalyzerReference::new("a.dll"));
        assert!(changes.is_empty());
    }

    #[test]
    fn distinct_items_accumulate_in_order() {
        let mut changes = ChangeSet::default();
        changes.metadata_references.add(lib("b.dll"));
        changes.metadata_references.add(lib("a.dll"));
        changes.metadata_references.remove(lib("c.dll"));
        let added: Vec<_> = changes.metadata_references.added().map(|r| r.path.as_str()).collect();
        assert_eq!(added, vec!["b.dll", "a.dll"]);
        assert_eq!(changes.metadata_references.removed().count(), 1);
    }

    #[test]
    fn properties_keep_insertion_order_and_release_clears() {
        let mut changes = ChangeSet::default();
        changes.push_property(ProjectProperty::AssemblyName("One".into()));
        changes.push_property(ProjectProperty::AssemblyName("Two".into()));
        assert_eq!(changes.properties().len(), 2);

        let summary = PendingChanges::from_change_set(&changes, 3, 1);
        assert_eq!(summary.property_rewrites, 2);
        assert_eq!(summary.documents_added, 3);
        assert!(!summary.is_empty());

        changes.release();
        assert!(changes.is_empty());
        assert!(PendingChanges::from_change_set(&changes, 0, 0).is_empty());
    }

    #[test]
    fn summary_serializes_counts() {
        let mut changes = ChangeSet::default();
        changes.project_references.remove(ProjectReference::new(projgraph_core::ProjectId::new_unique()));
        let json = serde_json::to_value(PendingChanges::from_change_set(&changes, 1, 0)).unwrap();
        assert_eq!(json["documents_added"], 1);
        assert_eq!(json["project_references_removed"], 1);
        assert_eq!(json["property_rewrites"], 0);
    }
}
