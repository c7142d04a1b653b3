//! Core error types for projgraph-core.
//!
//! Raised by snapshot rewrites when a rewrite refers to an entity that is
//! missing, duplicates one that exists, or would make the project
//! dependency graph cyclic.

use thiserror::Error;

use crate::id::{DocumentId, ProjectId};

/// Core errors produced by the projgraph-core crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// No project with this identity exists in the snapshot.
    #[error("project not found: {id}")]
    ProjectNotFound { id: ProjectId },

    /// A project with this identity is already in the snapshot.
    #[error("duplicate project: {id}")]
    DuplicateProject { id: ProjectId },

    /// The document is not part of the project.
    #[error("document not found: {id} in project {project}")]
    DocumentNotFound { project: ProjectId, id: DocumentId },

    /// The document identity is already part of the project.
    #[error("duplicate document: {id} in project {project}")]
    DuplicateDocument { project: ProjectId, id: DocumentId },

    /// The reference is not part of the project.
    #[error("reference not found: '{reference}' in project {project}")]
    ReferenceNotFound { project: ProjectId, reference: String },

    /// An identical reference is already part of the project.
    #[error("duplicate reference: '{reference}' in project {project}")]
    DuplicateReference { project: ProjectId, reference: String },

    /// Adding the project reference would make the dependency graph cyclic.
    #[error("project reference {from} -> {to} would create a cycle")]
    CycleDetected { from: ProjectId, to: ProjectId },
}
