//! Reference reconciliation.
//!
//! Decides whether a metadata reference is content bearing or should become
//! a project reference because its path is the output of another project.
//! The decision is a pure function of the reference, the output-path index
//! and the snapshot it is applied to. It is recomputed identically for an
//! add and for the matching remove and never stored on the reference.

use projgraph_core::{
    MetadataReference, ProjectDependencyGraph, ProjectId, ProjectReference, ReferenceKind, Snapshot,
};
use projgraph_store::OutputPathIndex;

/// How a metadata reference is represented in the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Reconciled {
    /// The path is another project's output.
    Structural(ProjectReference),
    /// The reference is resolved by reading the file.
    ContentBearing(MetadataReference),
}

impl Reconciled {
    pub fn is_structural(&self) -> bool {
        matches!(self, Reconciled::Structural(_))
    }
}

/// Reconciles `reference` for project `owner`.
///
/// Converts only assembly references whose path has a unique owning project
/// other than `owner` that exists in `snapshot`, and only when the
/// resulting edge keeps the project graph acyclic.
pub fn reconcile(
    owner: ProjectId,
    reference: &MetadataReference,
    index: &OutputPathIndex,
    snapshot: &Snapshot,
) -> Reconciled {
    let content = || Reconciled::ContentBearing(reference.clone());

    if reference.properties.kind != ReferenceKind::Assembly {
        return content();
    }
    let Some(target) = index.find_owning_project(&reference.path) else {
        return content();
    };
    if target == owner || !snapshot.contains_project(target) {
        return content();
    }
    if ProjectDependencyGraph::from_snapshot(snapshot).would_create_cycle(owner, target) {
        tracing::debug!(
            project = %owner,
            target = %target,
            path = %reference.path,
            "conversion would create a cycle; keeping metadata reference"
        );
        return content();
    }

    tracing::debug!(project = %owner, target = %target, path = %reference.path, "converted to project reference");
    Reconciled::Structural(ProjectReference::converted_from(target, &reference.properties))
}
