//! Batch flush planning.
//!
//! [`plan_flush`] turns a project's pending registry entries and change set
//! into the ordered transition list committed by one `transform` call:
//!
//! 1. document additions (source, then additional)
//! 2. document removals
//! 3. metadata reference additions, reconciled
//! 4. metadata reference removals, reconciled the same way
//! 5. direct project reference additions, then removals
//! 6. analyzer reference additions, then removals
//! 7. property rewrites in insertion order
//!
//! Empty steps produce no transition. Planning runs inside the store's
//! transform closure so reconciliation sees the snapshot it is applied to.

use projgraph_core::{ProjectId, Snapshot};
use projgraph_store::OutputPathIndex;

use crate::changeset::ChangeSet;
use crate::reconcile::reconcile;
use crate::registry::PathKeyedRegistry;
use crate::transition::Transition;

/// Builds the flush plan for `project`.
pub fn plan_flush(
    project: ProjectId,
    registries: [&PathKeyedRegistry; 2],
    changes: &ChangeSet,
    snapshot: &Snapshot,
    index: &OutputPathIndex,
) -> Vec<Transition> {
    let mut plan = Vec::new();

    for registry in registries {
        let documents = registry.pending_add_documents();
        if !documents.is_empty() {
            plan.push(Transition::AddDocuments {
                collection: registry.collection(),
                documents,
            });
        }
    }
    for registry in registries {
        let ids = registry.pending_remove_ids();
        if !ids.is_empty() {
            plan.push(Transition::RemoveDocuments {
                collection: registry.collection(),
                ids,
            });
        }
    }

    let metadata = &changes.metadata_references;
    plan.extend(
        metadata
            .added()
            .map(|r| Transition::AddReference(reconcile(project, r, index, snapshot))),
    );
    plan.extend(
        metadata
            .removed()
            .map(|r| Transition::RemoveReference(reconcile(project, r, index, snapshot))),
    );

    let projects = &changes.project_references;
    plan.extend(projects.added().cloned().map(Transition::AddProjectReference));
    plan.extend(projects.removed().cloned().map(Transition::RemoveProjectReference));

    let analyzers = &changes.analyzer_references;
    plan.extend(analyzers.added().cloned().map(Transition::AddAnalyzerReference));
    plan.extend(analyzers.removed().cloned().map(Transition::RemoveAnalyzerReference));

    plan.extend(changes.properties().iter().cloned().map(Transition::SetProperty));
    plan
}
