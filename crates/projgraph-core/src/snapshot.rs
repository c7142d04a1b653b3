//! Snapshot: the immutable, versioned value holding every project.
//!
//! A [`Snapshot`] maps project identities to `Arc<ProjectState>`. Cloning a
//! snapshot clones the map of pointers, not the projects. Rewrites go
//! through [`Snapshot::project_mut`], which uses `Arc::make_mut` so a
//! project is deep-copied only when a rewrite actually touches it and an
//! older snapshot still shares it. Readers holding the old snapshot never
//! observe the change.
//!
//! The version number is stamped by whoever commits the snapshot (the
//! store), not by the rewrites themselves.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::document::{DocumentInfo, TextLoader};
use crate::error::CoreError;
use crate::graph::ProjectDependencyGraph;
use crate::id::{DocumentId, ProjectId};
use crate::options::{OpaqueOptions, ProjectProperty};
use crate::reference::{AnalyzerReference, MetadataReference, ProjectReference, ReferenceHolder};

/// Which of a project's two document collections an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentCollection {
    /// Compiled source documents.
    Source,
    /// Additional (non-compiled) documents passed to analyzers.
    Additional,
}

impl std::fmt::Display for DocumentCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentCollection::Source => write!(f, "source"),
            DocumentCollection::Additional => write!(f, "additional"),
        }
    }
}

/// Everything needed to add an empty project to a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub id: ProjectId,
    pub language: String,
    pub name: String,
    pub assembly_name: String,
    pub file_path: Option<String>,
    pub output_file_path: Option<String>,
    pub output_ref_file_path: Option<String>,
    pub compilation_options: OpaqueOptions,
    pub parse_options: OpaqueOptions,
}

impl ProjectInfo {
    /// A project with the given language and name. The assembly name
    /// defaults to the display name.
    pub fn new(id: ProjectId, language: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        ProjectInfo {
            id,
            language: language.into(),
            assembly_name: name.clone(),
            name,
            file_path: None,
            output_file_path: None,
            output_ref_file_path: None,
            compilation_options: OpaqueOptions::default(),
            parse_options: OpaqueOptions::default(),
        }
    }

    pub fn with_assembly_name(mut self, assembly_name: impl Into<String>) -> Self {
        self.assembly_name = assembly_name.into();
        self
    }

    pub fn with_file_path(mut self, path: impl Into<String>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    pub fn with_output_file_path(mut self, path: impl Into<String>) -> Self {
        self.output_file_path = Some(path.into());
        self
    }

    pub fn with_output_ref_file_path(mut self, path: impl Into<String>) -> Self {
        self.output_ref_file_path = Some(path.into());
        self
    }

    pub fn with_compilation_options(mut self, options: OpaqueOptions) -> Self {
        self.compilation_options = options;
        self
    }

    pub fn with_parse_options(mut self, options: OpaqueOptions) -> Self {
        self.parse_options = options;
        self
    }
}

/// One project as recorded in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectState {
    pub id: ProjectId,
    pub language: String,
    pub name: String,
    pub assembly_name: String,
    pub file_path: Option<String>,
    pub output_file_path: Option<String>,
    pub output_ref_file_path: Option<String>,
    pub compilation_options: OpaqueOptions,
    pub parse_options: OpaqueOptions,
    documents: IndexMap<DocumentId, DocumentInfo>,
    additional_documents: IndexMap<DocumentId, DocumentInfo>,
    metadata_references: Vec<MetadataReference>,
    project_references: Vec<ProjectReference>,
    analyzer_references: Vec<AnalyzerReference>,
    /// Holders of project reference edges. Edges without an entry are held
    /// by a direct reference only.
    #[serde(skip)]
    reference_holders: IndexMap<ProjectReference, Holders>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Holders {
    direct: bool,
    converted: usize,
}

impl Default for Holders {
    fn default() -> Self {
        Holders {
            direct: true,
            converted: 0,
        }
    }
}

impl Holders {
    fn holds(&self, holder: ReferenceHolder) -> bool {
        match holder {
            ReferenceHolder::Direct => self.direct,
            ReferenceHolder::Converted => self.converted > 0,
        }
    }

    fn is_empty(&self) -> bool {
        !self.direct && self.converted == 0
    }
}

impl ProjectState {
    /// An empty project described by `info`.
    pub fn new(info: ProjectInfo) -> Self {
        ProjectState {
            id: info.id,
            language: info.language,
            name: info.name,
            assembly_name: info.assembly_name,
            file_path: info.file_path,
            output_file_path: info.output_file_path,
            output_ref_file_path: info.output_ref_file_path,
            compilation_options: info.compilation_options,
            parse_options: info.parse_options,
            documents: IndexMap::new(),
            additional_documents: IndexMap::new(),
            metadata_references: Vec::new(),
            project_references: Vec::new(),
            analyzer_references: Vec::new(),
            reference_holders: IndexMap::new(),
        }
    }

    // -------------------------------------------------------------------
    // Read accessors
    // -------------------------------------------------------------------

    /// Documents in the given collection, in insertion order.
    pub fn documents(&self, collection: DocumentCollection) -> &IndexMap<DocumentId, DocumentInfo> {
        match collection {
            DocumentCollection::Source => &self.documents,
            DocumentCollection::Additional => &self.additional_documents,
        }
    }

    pub fn document(&self, collection: DocumentCollection, id: DocumentId) -> Option<&DocumentInfo> {
        self.documents(collection).get(&id)
    }

    /// Finds a document by file path.
    pub fn document_by_path(
        &self,
        collection: DocumentCollection,
        path: &str,
    ) -> Option<&DocumentInfo> {
        self.documents(collection)
            .values()
            .find(|doc| doc.file_path.as_deref() == Some(path))
    }

    pub fn metadata_references(&self) -> &[MetadataReference] {
        &self.metadata_references
    }

    pub fn project_references(&self) -> &[ProjectReference] {
        &self.project_references
    }

    pub fn analyzer_references(&self) -> &[AnalyzerReference] {
        &self.analyzer_references
    }

    pub fn has_metadata_reference(&self, reference: &MetadataReference) -> bool {
        self.metadata_references.contains(reference)
    }

    pub fn has_project_reference(&self, reference: &ProjectReference) -> bool {
        self.project_references.contains(reference)
    }

    /// Returns true if `holder` keeps the edge `reference` in this project.
    pub fn is_held_by(&self, reference: &ProjectReference, holder: ReferenceHolder) -> bool {
        self.has_project_reference(reference) && self.holders(reference).holds(holder)
    }

    fn holders(&self, reference: &ProjectReference) -> Holders {
        self.reference_holders.get(reference).copied().unwrap_or_default()
    }

    fn set_holders(&mut self, reference: ProjectReference, holders: Holders) {
        if holders == Holders::default() {
            self.reference_holders.shift_remove(&reference);
        } else {
            self.reference_holders.insert(reference, holders);
        }
    }

    /// Returns true if any project reference targets `target`.
    pub fn references_project(&self, target: ProjectId) -> bool {
        self.project_references
            .iter()
            .any(|r| r.project_id == target)
    }

    // -------------------------------------------------------------------
    // Rewrites (applied to a working copy obtained via Snapshot::project_mut)
    // -------------------------------------------------------------------

    /// Adds documents to a collection. Fails on the first identity already
    /// present.
    pub fn add_documents<I>(&mut self, collection: DocumentCollection, docs: I) -> Result<(), CoreError>
    where
        I: IntoIterator<Item = DocumentInfo>,
    {
        let project = self.id;
        let map = self.documents_mut(collection);
        for doc in docs {
            if map.contains_key(&doc.id) {
                return Err(CoreError::DuplicateDocument {
                    project,
                    id: doc.id,
                });
            }
            map.insert(doc.id, doc);
        }
        Ok(())
    }

    /// Removes documents from a collection, preserving the order of the rest.
    pub fn remove_documents<I>(&mut self, collection: DocumentCollection, ids: I) -> Result<(), CoreError>
    where
        I: IntoIterator<Item = DocumentId>,
    {
        let project = self.id;
        let map = self.documents_mut(collection);
        for id in ids {
            if map.shift_remove(&id).is_none() {
                return Err(CoreError::DocumentNotFound { project, id });
            }
        }
        Ok(())
    }

    /// Replaces a document's loader in place. The identity is unchanged.
    pub fn replace_loader(
        &mut self,
        collection: DocumentCollection,
        id: DocumentId,
        loader: TextLoader,
    ) -> Result<(), CoreError> {
        let project = self.id;
        let doc = self
            .documents_mut(collection)
            .get_mut(&id)
            .ok_or(CoreError::DocumentNotFound { project, id })?;
        doc.loader = loader;
        Ok(())
    }

    pub fn add_metadata_reference(&mut self, reference: MetadataReference) -> Result<(), CoreError> {
        if self.metadata_references.contains(&reference) {
            return Err(CoreError::DuplicateReference {
                project: self.id,
                reference: reference.path,
            });
        }
        self.metadata_references.push(reference);
        Ok(())
    }

    pub fn remove_metadata_reference(&mut self, reference: &MetadataReference) -> Result<(), CoreError> {
        match self.metadata_references.iter().position(|r| r == reference) {
            Some(pos) => {
                self.metadata_references.remove(pos);
                Ok(())
            }
            None => Err(CoreError::ReferenceNotFound {
                project: self.id,
                reference: reference.path.clone(),
            }),
        }
    }

    /// Adds a project reference without a cycle check. Use
    /// [`Snapshot::add_project_reference`] for the checked variant.
    fn push_project_reference(&mut self, reference: ProjectReference) -> Result<(), CoreError> {
        if self.project_references.contains(&reference) {
            return Err(CoreError::DuplicateReference {
                project: self.id,
                reference: reference.project_id.to_string(),
            });
        }
        self.project_references.push(reference);
        Ok(())
    }

    /// Drops the edge `reference` whatever holds it.
    pub fn remove_project_reference(&mut self, reference: &ProjectReference) -> Result<(), CoreError> {
        match self.project_references.iter().position(|r| r == reference) {
            Some(pos) => {
                self.project_references.remove(pos);
                self.reference_holders.shift_remove(reference);
                Ok(())
            }
            None => Err(CoreError::ReferenceNotFound {
                project: self.id,
                reference: reference.project_id.to_string(),
            }),
        }
    }

    /// Releases `holder`'s claim on the edge `reference`, dropping the edge
    /// once nothing holds it.
    pub fn release_project_reference(
        &mut self,
        reference: &ProjectReference,
        holder: ReferenceHolder,
    ) -> Result<(), CoreError> {
        if !self.is_held_by(reference, holder) {
            return Err(CoreError::ReferenceNotFound {
                project: self.id,
                reference: reference.project_id.to_string(),
            });
        }
        let mut holders = self.holders(reference);
        match holder {
            ReferenceHolder::Direct => holders.direct = false,
            ReferenceHolder::Converted => holders.converted -= 1,
        }
        if holders.is_empty() {
            self.remove_project_reference(reference)
        } else {
            self.set_holders(reference.clone(), holders);
            Ok(())
        }
    }

    pub fn add_analyzer_reference(&mut self, reference: AnalyzerReference) -> Result<(), CoreError> {
        if self.analyzer_references.contains(&reference) {
            return Err(CoreError::DuplicateReference {
                project: self.id,
                reference: reference.path,
            });
        }
        self.analyzer_references.push(reference);
        Ok(())
    }

    pub fn remove_analyzer_reference(&mut self, reference: &AnalyzerReference) -> Result<(), CoreError> {
        match self.analyzer_references.iter().position(|r| r == reference) {
            Some(pos) => {
                self.analyzer_references.remove(pos);
                Ok(())
            }
            None => Err(CoreError::ReferenceNotFound {
                project: self.id,
                reference: reference.path.clone(),
            }),
        }
    }

    /// Applies one scalar property rewrite.
    pub fn apply_property(&mut self, property: ProjectProperty) {
        match property {
            ProjectProperty::AssemblyName(v) => self.assembly_name = v,
            ProjectProperty::FilePath(v) => self.file_path = v,
            ProjectProperty::DisplayName(v) => self.name = v,
            ProjectProperty::CompilationOptions(v) => self.compilation_options = v,
            ProjectProperty::ParseOptions(v) => self.parse_options = v,
            ProjectProperty::OutputFilePath(v) => self.output_file_path = v,
            ProjectProperty::OutputRefFilePath(v) => self.output_ref_file_path = v,
        }
    }

    fn documents_mut(&mut self, collection: DocumentCollection) -> &mut IndexMap<DocumentId, DocumentInfo> {
        match collection {
            DocumentCollection::Source => &mut self.documents,
            DocumentCollection::Additional => &mut self.additional_documents,
        }
    }
}

/// The immutable, versioned graph of all projects.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    version: u64,
    projects: IndexMap<ProjectId, Arc<ProjectState>>,
}

impl Snapshot {
    /// An empty snapshot at version zero.
    pub fn new() -> Self {
        Snapshot::default()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns this snapshot stamped with `version`.
    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    pub fn project(&self, id: ProjectId) -> Option<&ProjectState> {
        self.projects.get(&id).map(Arc::as_ref)
    }

    /// Like [`Snapshot::project`] but fails with `ProjectNotFound`.
    pub fn require_project(&self, id: ProjectId) -> Result<&ProjectState, CoreError> {
        self.project(id).ok_or(CoreError::ProjectNotFound { id })
    }

    pub fn contains_project(&self, id: ProjectId) -> bool {
        self.projects.contains_key(&id)
    }

    /// Projects in the order they were added.
    pub fn projects(&self) -> impl Iterator<Item = &ProjectState> {
        self.projects.values().map(Arc::as_ref)
    }

    pub fn project_ids(&self) -> impl Iterator<Item = ProjectId> + '_ {
        self.projects.keys().copied()
    }

    pub fn project_count(&self) -> usize {
        self.projects.len()
    }

    /// Returns true if both snapshots hold the very same allocation for
    /// project `id`, i.e. no rewrite has touched it in between.
    pub fn shares_project_with(&self, other: &Snapshot, id: ProjectId) -> bool {
        match (self.projects.get(&id), other.projects.get(&id)) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Mutable access to one project of this working copy, cloning it first
    /// if another snapshot still shares it.
    pub fn project_mut(&mut self, id: ProjectId) -> Result<&mut ProjectState, CoreError> {
        self.projects
            .get_mut(&id)
            .map(Arc::make_mut)
            .ok_or(CoreError::ProjectNotFound { id })
    }

    /// Adds an empty project.
    pub fn add_project(&mut self, info: ProjectInfo) -> Result<(), CoreError> {
        if self.projects.contains_key(&info.id) {
            return Err(CoreError::DuplicateProject { id: info.id });
        }
        self.projects.insert(info.id, Arc::new(ProjectState::new(info)));
        Ok(())
    }

    /// Removes a project, along with every project reference that targets it.
    pub fn remove_project(&mut self, id: ProjectId) -> Result<(), CoreError> {
        if self.projects.shift_remove(&id).is_none() {
            return Err(CoreError::ProjectNotFound { id });
        }
        for state in self.projects.values_mut() {
            if state.references_project(id) {
                let state = Arc::make_mut(state);
                state.project_references.retain(|r| r.project_id != id);
                state.reference_holders.retain(|r, _| r.project_id != id);
            }
        }
        Ok(())
    }

    /// Adds a project reference `from -> reference.project_id`, rejecting
    /// self references and references that would close a cycle.
    pub fn add_project_reference(
        &mut self,
        from: ProjectId,
        reference: ProjectReference,
    ) -> Result<(), CoreError> {
        let to = reference.project_id;
        if ProjectDependencyGraph::from_snapshot(self).would_create_cycle(from, to) {
            return Err(CoreError::CycleDetected { from, to });
        }
        self.project_mut(from)?.push_project_reference(reference)
    }

    /// Adds `holder` to the edge `from -> reference.project_id`. The first
    /// holder creates the edge with the checks of
    /// [`add_project_reference`](Self::add_project_reference). A direct
    /// holder may hold an edge once; converted holders are counted.
    pub fn hold_project_reference(
        &mut self,
        from: ProjectId,
        reference: ProjectReference,
        holder: ReferenceHolder,
    ) -> Result<(), CoreError> {
        let state = self.require_project(from)?;
        if !state.has_project_reference(&reference) {
            self.add_project_reference(from, reference.clone())?;
            if holder == ReferenceHolder::Converted {
                let holders = Holders {
                    direct: false,
                    converted: 1,
                };
                self.project_mut(from)?.set_holders(reference, holders);
            }
            return Ok(());
        }

        let mut holders = state.holders(&reference);
        match holder {
            ReferenceHolder::Direct if holders.direct => {
                return Err(CoreError::DuplicateReference {
                    project: from,
                    reference: reference.project_id.to_string(),
                });
            }
            ReferenceHolder::Direct => holders.direct = true,
            ReferenceHolder::Converted => holders.converted += 1,
        }
        self.project_mut(from)?.set_holders(reference, holders);
        Ok(())
    }
}
