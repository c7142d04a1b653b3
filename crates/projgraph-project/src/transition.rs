//! Snapshot transitions as explicit values.
//!
//! Every change a project submits to the store is a list of [`Transition`]s
//! folded over the current snapshot inside one `transform` call. Immediate
//! operations submit a single transition; a batch flush submits the whole
//! ordered plan built by [`plan_flush`](crate::flush::plan_flush).

use projgraph_core::{
    AnalyzerReference, CoreError, DocumentCollection, DocumentId, DocumentInfo, ProjectId,
    ProjectProperty, ProjectReference, ReferenceHolder, Snapshot, TextLoader,
};

use crate::reconcile::Reconciled;

/// One rewrite of a project in the snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    AddDocuments {
        collection: DocumentCollection,
        documents: Vec<DocumentInfo>,
    },
    RemoveDocuments {
        collection: DocumentCollection,
        ids: Vec<DocumentId>,
    },
    /// Replaces a document's loader, keeping its identity.
    ReloadDocument {
        collection: DocumentCollection,
        id: DocumentId,
        loader: TextLoader,
    },
    /// Adds a reconciled metadata reference.
    AddReference(Reconciled),
    /// Removes a reconciled metadata reference. Skipped with a warning when
    /// the recomputed representation is not in the snapshot.
    RemoveReference(Reconciled),
    AddProjectReference(ProjectReference),
    RemoveProjectReference(ProjectReference),
    AddAnalyzerReference(AnalyzerReference),
    RemoveAnalyzerReference(AnalyzerReference),
    SetProperty(ProjectProperty),
}

impl Transition {
    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Transition::AddDocuments { .. } => "add_documents",
            Transition::RemoveDocuments { .. } => "remove_documents",
            Transition::ReloadDocument { .. } => "reload_document",
            Transition::AddReference(_) => "add_reference",
            Transition::RemoveReference(_) => "remove_reference",
            Transition::AddProjectReference(_) => "add_project_reference",
            Transition::RemoveProjectReference(_) => "remove_project_reference",
            Transition::AddAnalyzerReference(_) => "add_analyzer_reference",
            Transition::RemoveAnalyzerReference(_) => "remove_analyzer_reference",
            Transition::SetProperty(_) => "set_property",
        }
    }

    /// Applies this transition to `project` in the working copy `snapshot`.
    pub fn apply(&self, snapshot: &mut Snapshot, project: ProjectId) -> Result<(), CoreError> {
        match self {
            Transition::AddDocuments { collection, documents } => snapshot
                .project_mut(project)?
                .add_documents(*collection, documents.iter().cloned()),
            Transition::RemoveDocuments { collection, ids } => snapshot
                .project_mut(project)?
                .remove_documents(*collection, ids.iter().copied()),
            Transition::ReloadDocument { collection, id, loader } => snapshot
                .project_mut(project)?
                .replace_loader(*collection, *id, loader.clone()),
            Transition::AddReference(Reconciled::ContentBearing(reference)) => snapshot
                .project_mut(project)?
                .add_metadata_reference(reference.clone()),
            Transition::AddReference(Reconciled::Structural(reference)) => {
                snapshot.hold_project_reference(project, reference.clone(), ReferenceHolder::Converted)
            }
            Transition::RemoveReference(reconciled) => {
                let state = snapshot.require_project(project)?;
                let present = match reconciled {
                    Reconciled::ContentBearing(r) => state.has_metadata_reference(r),
                    Reconciled::Structural(r) => state.is_held_by(r, ReferenceHolder::Converted),
                };
                if !present {
                    tracing::warn!(
                        project = %project,
                        reference = ?reconciled,
                        "reference representation changed since it was added; removal skipped"
                    );
                    return Ok(());
                }
                let state = snapshot.project_mut(project)?;
                match reconciled {
                    Reconciled::ContentBearing(r) => state.remove_metadata_reference(r),
                    Reconciled::Structural(r) => state.release_project_reference(r, ReferenceHolder::Converted),
                }
            }
            Transition::AddProjectReference(reference) => {
                snapshot.hold_project_reference(project, reference.clone(), ReferenceHolder::Direct)
            }
            Transition::RemoveProjectReference(reference) => snapshot
                .project_mut(project)?
                .release_project_reference(reference, ReferenceHolder::Direct),
            Transition::AddAnalyzerReference(reference) => snapshot
                .project_mut(project)?
                .add_analyzer_reference(reference.clone()),
            Transition::RemoveAnalyzerReference(reference) => snapshot
                .project_mut(project)?
                .remove_analyzer_reference(reference),
            Transition::SetProperty(property) => {
                snapshot.project_mut(project)?.apply_property(property.clone());
                Ok(())
            }
        }
    }
}

/// Folds `transitions` over a copy of `base`.
pub fn apply_all(base: &Snapshot, project: ProjectId, transitions: &[Transition]) -> Result<Snapshot, CoreError> {
    let mut next = base.clone();
    for transition in transitions {
        transition.apply(&mut next, project)?;
    }
    Ok(next)
}
