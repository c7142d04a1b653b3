//! Snapshot data model for projgraph.
//!
//! A [`Snapshot`] is an immutable, versioned value describing every project
//! known to a tooling host: its documents, references, and opaque compiler
//! options. Snapshots are never mutated in place. Rewrites clone the
//! snapshot (cheaply, since each project is behind an `Arc`) and only deep
//! copy the projects they touch.
//!
//! # Modules
//!
//! - [`id`]: ProjectId, DocumentId, BufferId identity newtypes
//! - [`options`]: opaque option values, source kinds, scalar properties
//! - [`document`]: DocumentInfo and TextLoader
//! - [`reference`]: metadata, project, and analyzer references
//! - [`snapshot`]: Snapshot and ProjectState with copy-on-write rewrites
//! - [`graph`]: project dependency graph (cycle detection, build order)
//! - [`error`]: CoreError enum

pub mod document;
pub mod error;
pub mod graph;
pub mod id;
pub mod options;
pub mod reference;
pub mod snapshot;

// Re-export commonly used types
pub use document::{DocumentInfo, TextLoader};
pub use error::CoreError;
pub use graph::ProjectDependencyGraph;
pub use id::{BufferId, DocumentId, ProjectId};
pub use options::{OpaqueOptions, ProjectProperty, SourceCodeKind};
pub use reference::{
    AnalyzerReference, MetadataReference, ProjectReference, ReferenceHolder, ReferenceKind,
    ReferenceProperties,
};
pub use snapshot::{DocumentCollection, ProjectInfo, ProjectState, Snapshot};
