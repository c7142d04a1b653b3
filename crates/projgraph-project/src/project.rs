//! The per-project facade.
//!
//! [`Project`] is the mutable view callers use to edit one project of the
//! snapshot. Every operation runs under the project's exclusive section
//! (one `parking_lot::Mutex` around [`FacadeState`]). Outside a batch an
//! operation is validated, committed as its own transition and only then
//! recorded. Inside a batch it only updates the registries and the change
//! set; the outermost [`BatchScope`] release commits everything at once.
//! Changes a failed flush left pending are committed ahead of the next
//! operation outside a batch. File-change reloads are the one exception to
//! batching: they always commit on their own.
//!
//! Editor notifications produced by an operation are collected while the
//! section is held and dispatched after it is released.

use std::sync::Arc;

use indexmap::IndexSet;
use parking_lot::{Mutex, MutexGuard};

use projgraph_core::{
    AnalyzerReference, BufferId, CoreError, DocumentCollection, DocumentId, DocumentInfo,
    MetadataReference, OpaqueOptions, ProjectDependencyGraph, ProjectId, ProjectInfo, ProjectProperty,
    ProjectReference, ProjectState, ReferenceProperties, Snapshot, SourceCodeKind,
};

use crate::batch::{BatchScope, TransactionCoordinator};
use crate::changeset::{ChangeSet, PendingChanges};
use crate::editor::{self, EditorNotification};
use crate::error::{require_path, ProjectError};
use crate::flush::plan_flush;
use crate::reconcile::reconcile;
use crate::registry::{EntryState, PathKeyedRegistry, Removal};
use crate::transition::{apply_all, Transition};
use crate::workspace::HostServices;

/// Scalar properties as the facade currently sees them. Updated
/// immediately, even inside a batch.
#[derive(Debug, Clone)]
struct Properties {
    name: String,
    assembly_name: String,
    file_path: Option<String>,
    output_file_path: Option<String>,
    output_ref_file_path: Option<String>,
    compilation_options: OpaqueOptions,
    parse_options: OpaqueOptions,
}

impl Properties {
    fn from_info(info: &ProjectInfo) -> Self {
        Properties {
            name: info.name.clone(),
            assembly_name: info.assembly_name.clone(),
            file_path: info.file_path.clone(),
            output_file_path: info.output_file_path.clone(),
            output_ref_file_path: info.output_ref_file_path.clone(),
            compilation_options: info.compilation_options.clone(),
            parse_options: info.parse_options.clone(),
        }
    }

    fn holds(&self, property: &ProjectProperty) -> bool {
        match property {
            ProjectProperty::AssemblyName(v) => self.assembly_name == *v,
            ProjectProperty::FilePath(v) => self.file_path == *v,
            ProjectProperty::DisplayName(v) => self.name == *v,
            ProjectProperty::CompilationOptions(v) => self.compilation_options == *v,
            ProjectProperty::ParseOptions(v) => self.parse_options == *v,
            ProjectProperty::OutputFilePath(v) => self.output_file_path == *v,
            ProjectProperty::OutputRefFilePath(v) => self.output_ref_file_path == *v,
        }
    }

    /// Installs `property` and returns the value it replaced.
    fn replace(&mut self, property: ProjectProperty) -> ProjectProperty {
        use std::mem::replace;
        match property {
            ProjectProperty::AssemblyName(v) => {
                ProjectProperty::AssemblyName(replace(&mut self.assembly_name, v))
            }
            ProjectProperty::FilePath(v) => ProjectProperty::FilePath(replace(&mut self.file_path, v)),
            ProjectProperty::DisplayName(v) => ProjectProperty::DisplayName(replace(&mut self.name, v)),
            ProjectProperty::CompilationOptions(v) => {
                ProjectProperty::CompilationOptions(replace(&mut self.compilation_options, v))
            }
            ProjectProperty::ParseOptions(v) => {
                ProjectProperty::ParseOptions(replace(&mut self.parse_options, v))
            }
            ProjectProperty::OutputFilePath(v) => {
                ProjectProperty::OutputFilePath(replace(&mut self.output_file_path, v))
            }
            ProjectProperty::OutputRefFilePath(v) => {
                ProjectProperty::OutputRefFilePath(replace(&mut self.output_ref_file_path, v))
            }
        }
    }

    fn output_paths(&self) -> impl Iterator<Item = &str> {
        [self.output_file_path.as_deref(), self.output_ref_file_path.as_deref()]
            .into_iter()
            .flatten()
    }
}

/// Everything guarded by a project's exclusive section.
#[derive(Debug)]
struct FacadeState {
    coordinator: TransactionCoordinator,
    sources: PathKeyedRegistry,
    additional: PathKeyedRegistry,
    changes: ChangeSet,
    metadata_references: IndexSet<MetadataReference>,
    project_references: IndexSet<ProjectReference>,
    analyzer_references: IndexSet<AnalyzerReference>,
    properties: Properties,
    removed: bool,
}

impl FacadeState {
    fn registry(&self, collection: DocumentCollection) -> &PathKeyedRegistry {
        match collection {
            DocumentCollection::Source => &self.sources,
            DocumentCollection::Additional => &self.additional,
        }
    }

    fn registry_mut(&mut self, collection: DocumentCollection) -> &mut PathKeyedRegistry {
        match collection {
            DocumentCollection::Source => &mut self.sources,
            DocumentCollection::Additional => &mut self.additional,
        }
    }

    fn has_pending(&self) -> bool {
        self.sources.has_pending() || self.additional.has_pending() || !self.changes.is_empty()
    }

    fn pending_summary(&self) -> PendingChanges {
        let (source_adds, source_removes) = self.sources.pending_counts();
        let (extra_adds, extra_removes) = self.additional.pending_counts();
        PendingChanges::from_change_set(&self.changes, source_adds + extra_adds, source_removes + extra_removes)
    }

    fn project_reference_to(&self, target: ProjectId) -> Option<&ProjectReference> {
        self.project_references.iter().find(|r| r.project_id == target)
    }
}

struct ProjectInner {
    id: ProjectId,
    language: String,
    services: HostServices,
    state: Mutex<FacadeState>,
}

/// Mutable facade over one project of the snapshot. Cheap to clone; clones
/// share the same state.
///
/// File-change reloads ([`Project::on_file_changed`]) bypass batching and
/// commit their own transitions even while a batch is open.
#[derive(Clone)]
pub struct Project {
    inner: Arc<ProjectInner>,
}

impl std::fmt::Debug for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Project")
            .field("id", &self.inner.id)
            .field("language", &self.inner.language)
            .finish_non_exhaustive()
    }
}

impl Project {
    /// Creates the facade for a project already present in the snapshot.
    pub(crate) fn new(info: &ProjectInfo, services: HostServices) -> Self {
        let comparison = services.path_comparison;
        let state = FacadeState {
            coordinator: TransactionCoordinator::default(),
            sources: PathKeyedRegistry::new(DocumentCollection::Source, comparison),
            additional: PathKeyedRegistry::new(DocumentCollection::Additional, comparison),
            changes: ChangeSet::default(),
            metadata_references: IndexSet::new(),
            project_references: IndexSet::new(),
            analyzer_references: IndexSet::new(),
            properties: Properties::from_info(info),
            removed: false,
        };
        Project {
            inner: Arc::new(ProjectInner {
                id: info.id,
                language: info.language.clone(),
                services,
                state: Mutex::new(state),
            }),
        }
    }

    pub fn id(&self) -> ProjectId {
        self.inner.id
    }

    pub fn language(&self) -> &str {
        &self.inner.language
    }

    // -------------------------------------------------------------------
    // Batching
    // -------------------------------------------------------------------

    /// Opens a batch nesting level. Until the outermost scope is released,
    /// mutations are recorded but not committed.
    pub fn begin_batch(&self) -> Result<BatchScope, ProjectError> {
        let depth = self.lock()?.coordinator.enter();
        tracing::debug!(project = %self.inner.id, depth, "batch opened");
        Ok(BatchScope::new(self.clone()))
    }

    /// Closes one nesting level; flushes when it was the outermost.
    pub(crate) fn end_batch(&self) -> Result<(), ProjectError> {
        let notifications = {
            let mut state = self.inner.state.lock();
            if !state.coordinator.exit() {
                return Ok(());
            }
            if state.removed {
                return Ok(());
            }
            self.flush(&mut state)?
        };
        self.notify(notifications);
        Ok(())
    }

    /// Commits changes left pending by a failed flush. Does nothing while a
    /// batch is open; the outermost release will flush them.
    pub fn commit_pending(&self) -> Result<(), ProjectError> {
        let notifications = {
            let mut state = self.lock()?;
            if state.coordinator.is_batching() {
                tracing::debug!(project = %self.inner.id, "batch open; pending changes flush on release");
                return Ok(());
            }
            self.flush(&mut state)?
        };
        self.notify(notifications);
        Ok(())
    }

    /// Current batch nesting depth.
    pub fn batch_depth(&self) -> usize {
        self.inner.state.lock().coordinator.depth()
    }

    /// What the next flush would commit.
    pub fn pending_changes(&self) -> PendingChanges {
        self.inner.state.lock().pending_summary()
    }

    // -------------------------------------------------------------------
    // Documents
    // -------------------------------------------------------------------

    pub fn add_source_file(
        &self,
        path: &str,
        kind: SourceCodeKind,
        folders: &[String],
    ) -> Result<DocumentId, ProjectError> {
        self.add_file(DocumentCollection::Source, path, kind, folders)
    }

    pub fn add_additional_file(&self, path: &str, folders: &[String]) -> Result<DocumentId, ProjectError> {
        self.add_file(DocumentCollection::Additional, path, SourceCodeKind::Regular, folders)
    }

    pub fn remove_source_file(&self, path: &str) -> Result<(), ProjectError> {
        self.remove_file(DocumentCollection::Source, path)
    }

    pub fn remove_additional_file(&self, path: &str) -> Result<(), ProjectError> {
        self.remove_file(DocumentCollection::Additional, path)
    }

    pub fn contains_source_file(&self, path: &str) -> bool {
        self.document_id(DocumentCollection::Source, path).is_some()
    }

    pub fn contains_additional_file(&self, path: &str) -> bool {
        self.document_id(DocumentCollection::Additional, path).is_some()
    }

    /// Adds a file-backed document and starts watching its path.
    pub fn add_file(
        &self,
        collection: DocumentCollection,
        path: &str,
        kind: SourceCodeKind,
        folders: &[String],
    ) -> Result<DocumentId, ProjectError> {
        require_path(path)?;
        let info = DocumentInfo::from_file(DocumentId::new_unique(), path, kind, folders);
        let id = info.id;

        self.update(|state, notifications| {
            state.registry(collection).ensure_can_add(Some(path), None)?;
            let watch = self.inner.services.watcher.watch(path);

            if state.coordinator.is_batching() {
                state
                    .registry_mut(collection)
                    .insert(info, None, Some(watch), EntryState::PendingAdd);
                tracing::debug!(project = %self.inner.id, %collection, path, "document add deferred");
                return Ok(id);
            }
            let transition = Transition::AddDocuments {
                collection,
                documents: vec![info.clone()],
            };
            if let Err(err) = self.commit(vec![transition]) {
                self.inner.services.watcher.unwatch(watch);
                return Err(err);
            }
            state
                .registry_mut(collection)
                .insert(info, None, Some(watch), EntryState::Committed);
            notifications.push(EditorNotification::CheckOpen {
                document: id,
                path: path.to_string(),
            });
            Ok(id)
        })
    }

    /// Stops tracking the document at `path` and releases its watch.
    pub fn remove_file(&self, collection: DocumentCollection, path: &str) -> Result<(), ProjectError> {
        require_path(path)?;
        self.update(|state, notifications| {
            let id = state.registry(collection).lookup_path(path)?;
            self.remove_document(state, collection, id, notifications)
        })
    }

    /// Adds a document whose text comes from a live editor buffer. Without
    /// a path the document is keyed only by `buffer`.
    pub fn add_text_container(
        &self,
        collection: DocumentCollection,
        buffer: BufferId,
        path: Option<&str>,
        kind: SourceCodeKind,
        folders: &[String],
    ) -> Result<DocumentId, ProjectError> {
        if let Some(path) = path {
            require_path(path)?;
        }
        let info = DocumentInfo::from_buffer(DocumentId::new_unique(), buffer, path, kind, folders);
        let id = info.id;

        self.update(|state, notifications| {
            state.registry(collection).ensure_can_add(path, Some(buffer))?;

            if state.coordinator.is_batching() {
                state
                    .registry_mut(collection)
                    .insert(info, Some(buffer), None, EntryState::PendingAdd);
                tracing::debug!(project = %self.inner.id, %collection, %buffer, "text container add deferred");
                return Ok(id);
            }
            self.commit(vec![Transition::AddDocuments {
                collection,
                documents: vec![info.clone()],
            }])?;
            state
                .registry_mut(collection)
                .insert(info, Some(buffer), None, EntryState::Committed);
            notifications.push(EditorNotification::Opened { document: id });
            Ok(id)
        })
    }

    pub fn remove_text_container(&self, collection: DocumentCollection, buffer: BufferId) -> Result<(), ProjectError> {
        self.update(|state, notifications| {
            let id = state.registry(collection).lookup_buffer(buffer)?;
            self.remove_document(state, collection, id, notifications)
        })
    }

    pub fn contains_text_container(&self, collection: DocumentCollection, buffer: BufferId) -> bool {
        self.inner.state.lock().registry(collection).contains_buffer(buffer)
    }

    /// The identity of the tracked document at `path`.
    pub fn document_id(&self, collection: DocumentCollection, path: &str) -> Option<DocumentId> {
        self.inner.state.lock().registry(collection).lookup_path(path).ok()
    }

    /// Tracked documents of `collection`, including pending adds.
    pub fn documents(&self, collection: DocumentCollection) -> Vec<DocumentId> {
        self.inner.state.lock().registry(collection).document_ids()
    }

    fn remove_document(
        &self,
        state: &mut FacadeState,
        collection: DocumentCollection,
        id: DocumentId,
        notifications: &mut Vec<EditorNotification>,
    ) -> Result<(), ProjectError> {
        let watcher = &self.inner.services.watcher;
        if state.coordinator.is_batching() {
            match state.registry_mut(collection).remove_in_batch(id) {
                Some(Removal::Cancelled { watch }) => {
                    if let Some(token) = watch {
                        watcher.unwatch(token);
                    }
                    tracing::debug!(project = %self.inner.id, %collection, document = %id, "pending add cancelled");
                }
                Some(Removal::Deferred { watch }) => {
                    if let Some(token) = watch {
                        watcher.unwatch(token);
                    }
                    tracing::debug!(project = %self.inner.id, %collection, document = %id, "document removal deferred");
                }
                None => {}
            }
            return Ok(());
        }

        self.commit(vec![Transition::RemoveDocuments {
            collection,
            ids: vec![id],
        }])?;
        if let Some(forgotten) = state.registry_mut(collection).forget(id) {
            if let Some(token) = forgotten.watch {
                watcher.unwatch(token);
            }
            if forgotten.closed {
                notifications.push(EditorNotification::Closed { document: id });
            }
        }
        Ok(())
    }

    /// Handles a change notification for `path`. A committed, file-backed
    /// document not open in the editor is reloaded in place. Returns true if
    /// a document was reloaded.
    ///
    /// Reloads bypass batching: each one commits its own transition even
    /// while a batch is open.
    pub fn on_file_changed(&self, path: &str) -> Result<bool, ProjectError> {
        let mut state = self.inner.state.lock();
        if state.removed {
            return Ok(false);
        }

        let mut reloaded = false;
        for collection in [DocumentCollection::Source, DocumentCollection::Additional] {
            if !state.registry(collection).knows_path(path) {
                continue;
            }
            let Some((id, loader)) = state.registry(collection).reload_candidate(path) else {
                tracing::warn!(project = %self.inner.id, %collection, path, "file change for uncommitted document dropped");
                continue;
            };
            if self.inner.services.editor.is_open(path) {
                tracing::debug!(project = %self.inner.id, path, "document open in editor; reload skipped");
                continue;
            }
            self.commit(vec![Transition::ReloadDocument {
                collection,
                id,
                loader: loader.clone(),
            }])?;
            state.registry_mut(collection).set_loader(id, loader);
            tracing::debug!(project = %self.inner.id, %collection, document = %id, "document reloaded");
            reloaded = true;
        }
        Ok(reloaded)
    }

    // -------------------------------------------------------------------
    // References
    // -------------------------------------------------------------------

    /// Adds a metadata reference. The pair `(path, properties)` must be new.
    pub fn add_metadata_reference(&self, path: &str, properties: ReferenceProperties) -> Result<(), ProjectError> {
        require_path(path)?;
        let reference = MetadataReference::new(path, properties);
        self.update(|state, _| {
            if state.metadata_references.contains(&reference) {
                return Err(ProjectError::DuplicateEntry(format!(
                    "metadata reference '{path}' is already tracked"
                )));
            }

            if state.coordinator.is_batching() {
                state.changes.metadata_references.add(reference.clone());
            } else {
                let (id, index) = (self.inner.id, &self.inner.services.output_paths);
                self.submit(&|snapshot: &Snapshot| {
                    vec![Transition::AddReference(reconcile(id, &reference, index, snapshot))]
                })?;
            }
            state.metadata_references.insert(reference.clone());
            Ok(())
        })
    }

    /// Removes a metadata reference, recomputing how it is represented.
    pub fn remove_metadata_reference(&self, path: &str, properties: ReferenceProperties) -> Result<(), ProjectError> {
        require_path(path)?;
        let reference = MetadataReference::new(path, properties);
        self.update(|state, _| {
            if !state.metadata_references.contains(&reference) {
                return Err(ProjectError::NotFound(format!("metadata reference '{path}' is not tracked")));
            }

            if state.coordinator.is_batching() {
                state.changes.metadata_references.remove(reference.clone());
            } else {
                let (id, index) = (self.inner.id, &self.inner.services.output_paths);
                self.submit(&|snapshot: &Snapshot| {
                    vec![Transition::RemoveReference(reconcile(id, &reference, index, snapshot))]
                })?;
            }
            state.metadata_references.shift_remove(&reference);
            Ok(())
        })
    }

    pub fn contains_metadata_reference(&self, path: &str, properties: &ReferenceProperties) -> bool {
        let reference = MetadataReference::new(path, properties.clone());
        self.inner.state.lock().metadata_references.contains(&reference)
    }

    pub fn metadata_references(&self) -> Vec<MetadataReference> {
        self.inner.state.lock().metadata_references.iter().cloned().collect()
    }

    /// Adds a reference to another project. Self references and references
    /// closing a cycle are rejected. A metadata reference already converted
    /// into the same edge shares it.
    pub fn add_project_reference(&self, reference: ProjectReference) -> Result<(), ProjectError> {
        let (id, target) = (self.inner.id, reference.project_id);
        if target == id {
            return Err(ProjectError::InvalidArgument(format!("project {id} cannot reference itself")));
        }
        self.update(|state, _| {
            if state.project_reference_to(target).is_some() {
                return Err(ProjectError::DuplicateEntry(format!(
                    "project reference to {target} is already tracked"
                )));
            }
            let current = self.inner.services.store.current();
            if ProjectDependencyGraph::from_snapshot(&current).would_create_cycle(id, target) {
                return Err(CoreError::CycleDetected { from: id, to: target }.into());
            }

            if state.coordinator.is_batching() {
                state.changes.project_references.add(reference.clone());
            } else {
                self.commit(vec![Transition::AddProjectReference(reference.clone())])?;
            }
            state.project_references.insert(reference.clone());
            Ok(())
        })
    }

    pub fn remove_project_reference(&self, target: ProjectId) -> Result<(), ProjectError> {
        self.update(|state, _| {
            let reference = state
                .project_reference_to(target)
                .cloned()
                .ok_or_else(|| ProjectError::NotFound(format!("project reference to {target} is not tracked")))?;

            if state.coordinator.is_batching() {
                state.changes.project_references.remove(reference.clone());
            } else {
                self.commit(vec![Transition::RemoveProjectReference(reference.clone())])?;
            }
            state.project_references.shift_remove(&reference);
            Ok(())
        })
    }

    pub fn contains_project_reference(&self, target: ProjectId) -> bool {
        self.inner.state.lock().project_reference_to(target).is_some()
    }

    pub fn project_references(&self) -> Vec<ProjectReference> {
        self.inner.state.lock().project_references.iter().cloned().collect()
    }

    /// Forgets tracked and pending references to a project that left the
    /// workspace. The snapshot side is handled by the project removal.
    pub(crate) fn forget_references_to(&self, target: ProjectId) {
        let mut state = self.inner.state.lock();
        state.project_references.retain(|r| r.project_id != target);
        state.changes.project_references.retain(|r| r.project_id != target);
    }

    pub fn add_analyzer_reference(&self, path: &str) -> Result<(), ProjectError> {
        require_path(path)?;
        let reference = AnalyzerReference::new(path);
        self.update(|state, _| {
            if state.analyzer_references.contains(&reference) {
                return Err(ProjectError::DuplicateEntry(format!("analyzer '{path}' is already tracked")));
            }

            if state.coordinator.is_batching() {
                state.changes.analyzer_references.add(reference.clone());
            } else {
                self.commit(vec![Transition::AddAnalyzerReference(reference.clone())])?;
            }
            state.analyzer_references.insert(reference.clone());
            Ok(())
        })
    }

    pub fn remove_analyzer_reference(&self, path: &str) -> Result<(), ProjectError> {
        require_path(path)?;
        let reference = AnalyzerReference::new(path);
        self.update(|state, _| {
            if !state.analyzer_references.contains(&reference) {
                return Err(ProjectError::NotFound(format!("analyzer '{path}' is not tracked")));
            }

            if state.coordinator.is_batching() {
                state.changes.analyzer_references.remove(reference.clone());
            } else {
                self.commit(vec![Transition::RemoveAnalyzerReference(reference.clone())])?;
            }
            state.analyzer_references.shift_remove(&reference);
            Ok(())
        })
    }

    pub fn contains_analyzer_reference(&self, path: &str) -> bool {
        self.inner
            .state
            .lock()
            .analyzer_references
            .contains(&AnalyzerReference::new(path))
    }

    pub fn analyzer_references(&self) -> Vec<AnalyzerReference> {
        self.inner.state.lock().analyzer_references.iter().cloned().collect()
    }

    // -------------------------------------------------------------------
    // Properties
    // -------------------------------------------------------------------

    pub fn set_assembly_name(&self, name: impl Into<String>) -> Result<bool, ProjectError> {
        self.set_property(ProjectProperty::AssemblyName(name.into()))
    }

    pub fn set_display_name(&self, name: impl Into<String>) -> Result<bool, ProjectError> {
        self.set_property(ProjectProperty::DisplayName(name.into()))
    }

    pub fn set_file_path(&self, path: Option<String>) -> Result<bool, ProjectError> {
        self.set_property(ProjectProperty::FilePath(path))
    }

    pub fn set_compilation_options(&self, options: OpaqueOptions) -> Result<bool, ProjectError> {
        self.set_property(ProjectProperty::CompilationOptions(options))
    }

    pub fn set_parse_options(&self, options: OpaqueOptions) -> Result<bool, ProjectError> {
        self.set_property(ProjectProperty::ParseOptions(options))
    }

    pub fn set_output_file_path(&self, path: Option<String>) -> Result<bool, ProjectError> {
        self.set_property(ProjectProperty::OutputFilePath(path))
    }

    pub fn set_output_ref_file_path(&self, path: Option<String>) -> Result<bool, ProjectError> {
        self.set_property(ProjectProperty::OutputRefFilePath(path))
    }

    /// Sets one scalar property. Returns false, and records nothing, when
    /// the value is unchanged.
    ///
    /// The facade's value changes immediately. Output paths also update the
    /// output-path index right away, batch or not.
    pub fn set_property(&self, property: ProjectProperty) -> Result<bool, ProjectError> {
        if let ProjectProperty::OutputFilePath(Some(path)) | ProjectProperty::OutputRefFilePath(Some(path)) = &property {
            require_path(path)?;
        }
        self.update(|state, _| {
            if state.properties.holds(&property) {
                return Ok(false);
            }

            let name = property.name();
            let previous = state.properties.replace(property.clone());
            self.sync_output_paths(&previous, &state.properties);

            if state.coordinator.is_batching() {
                state.changes.push_property(property.clone());
                tracing::debug!(project = %self.inner.id, property = name, "property rewrite deferred");
            } else if let Err(err) = self.commit(vec![Transition::SetProperty(property.clone())]) {
                let attempted = state.properties.replace(previous);
                self.sync_output_paths(&attempted, &state.properties);
                return Err(err);
            }
            Ok(true)
        })
    }

    fn sync_output_paths(&self, previous: &ProjectProperty, properties: &Properties) {
        let old = match previous {
            ProjectProperty::OutputFilePath(old) | ProjectProperty::OutputRefFilePath(old) => old,
            _ => return,
        };
        let index = &self.inner.services.output_paths;
        if let Some(old) = old {
            index.unregister_output_path(self.inner.id, old);
        }
        // The other output property may publish the same path.
        for path in properties.output_paths() {
            index.register_output_path(self.inner.id, path);
        }
    }

    pub fn name(&self) -> String {
        self.inner.state.lock().properties.name.clone()
    }

    pub fn assembly_name(&self) -> String {
        self.inner.state.lock().properties.assembly_name.clone()
    }

    pub fn file_path(&self) -> Option<String> {
        self.inner.state.lock().properties.file_path.clone()
    }

    pub fn output_file_path(&self) -> Option<String> {
        self.inner.state.lock().properties.output_file_path.clone()
    }

    pub fn output_ref_file_path(&self) -> Option<String> {
        self.inner.state.lock().properties.output_ref_file_path.clone()
    }

    pub fn compilation_options(&self) -> OpaqueOptions {
        self.inner.state.lock().properties.compilation_options.clone()
    }

    pub fn parse_options(&self) -> OpaqueOptions {
        self.inner.state.lock().properties.parse_options.clone()
    }

    // -------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------

    /// The project as recorded in the current snapshot.
    pub fn committed_state(&self) -> Option<ProjectState> {
        self.inner.services.store.current().project(self.inner.id).cloned()
    }

    pub fn is_removed(&self) -> bool {
        self.inner.state.lock().removed
    }

    /// Removes the project from the snapshot, releases every watch and
    /// unregisters its output paths. Later mutations fail with `Removed`.
    pub(crate) fn remove_from_workspace(&self) -> Result<(), ProjectError> {
        let id = self.inner.id;
        let notifications = {
            let mut state = self.lock()?;
            self.inner.services.store.transform(id, &|snapshot: &Snapshot| -> Result<Snapshot, CoreError> {
                let mut next = snapshot.clone();
                next.remove_project(id)?;
                Ok(next)
            })?;

            let mut notifications = Vec::new();
            for collection in [DocumentCollection::Source, DocumentCollection::Additional] {
                for forgotten in state.registry_mut(collection).drain_all() {
                    if let Some(token) = forgotten.watch {
                        self.inner.services.watcher.unwatch(token);
                    }
                    if forgotten.closed {
                        notifications.push(EditorNotification::Closed { document: forgotten.id });
                    }
                }
            }
            let unregistered = self.inner.services.output_paths.unregister_project(id);
            state.changes.release();
            state.removed = true;
            tracing::info!(project = %id, output_paths = unregistered, "project removed");
            notifications
        };
        self.notify(notifications);
        Ok(())
    }

    // -------------------------------------------------------------------
    // Commit plumbing
    // -------------------------------------------------------------------

    fn lock(&self) -> Result<MutexGuard<'_, FacadeState>, ProjectError> {
        let state = self.inner.state.lock();
        if state.removed {
            return Err(ProjectError::Removed(self.inner.id));
        }
        Ok(state)
    }

    /// Runs a mutation under the exclusive section and dispatches its editor
    /// notifications once the section is released.
    ///
    /// Outside a batch, changes left pending by a failed flush are committed
    /// first. An immediate commit therefore never lands underneath older
    /// pending rewrites that a later retry would replay over it. If that
    /// commit fails the mutation is rejected untouched.
    fn update<T>(
        &self,
        op: impl FnOnce(&mut FacadeState, &mut Vec<EditorNotification>) -> Result<T, ProjectError>,
    ) -> Result<T, ProjectError> {
        let (result, notifications) = {
            let mut state = self.lock()?;
            let mut notifications = if !state.coordinator.is_batching() && state.has_pending() {
                tracing::debug!(project = %self.inner.id, "committing changes left by a failed flush");
                self.flush(&mut state)?
            } else {
                Vec::new()
            };
            let result = op(&mut *state, &mut notifications);
            (result, notifications)
        };
        self.notify(notifications);
        result
    }

    fn commit(&self, transitions: Vec<Transition>) -> Result<Arc<Snapshot>, ProjectError> {
        self.submit(&|_: &Snapshot| transitions.clone())
    }

    /// Submits the transitions `plan` builds against the snapshot the store
    /// applies them to.
    fn submit(&self, plan: &dyn Fn(&Snapshot) -> Vec<Transition>) -> Result<Arc<Snapshot>, ProjectError> {
        let id = self.inner.id;
        let snapshot = self
            .inner
            .services
            .store
            .transform(id, &|snapshot: &Snapshot| -> Result<Snapshot, CoreError> {
                apply_all(snapshot, id, &plan(snapshot))
            })?;
        Ok(snapshot)
    }

    /// Commits everything pending as one transition. On failure nothing is
    /// cleared, so the same flush can be retried.
    fn flush(&self, state: &mut FacadeState) -> Result<Vec<EditorNotification>, ProjectError> {
        let id = self.inner.id;
        if !state.has_pending() {
            tracing::debug!(project = %id, "nothing pending; flush skipped");
            return Ok(Vec::new());
        }

        let pending: &FacadeState = state;
        let index = &self.inner.services.output_paths;
        let snapshot = self.submit(&|snapshot: &Snapshot| {
            plan_flush(id, [&pending.sources, &pending.additional], &pending.changes, snapshot, index)
        });
        let snapshot = match snapshot {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!(project = %id, error = %err, "flush failed; pending changes kept");
                return Err(err);
            }
        };

        let summary = state.pending_summary();
        let mut notifications = Vec::new();
        for collection in [DocumentCollection::Source, DocumentCollection::Additional] {
            for doc in state.registry(collection).pending_add_documents() {
                notifications.push(match (&doc.file_path, doc.is_buffer_bound()) {
                    (Some(path), false) => EditorNotification::CheckOpen {
                        document: doc.id,
                        path: path.clone(),
                    },
                    _ => EditorNotification::Opened { document: doc.id },
                });
            }
            for forgotten in state.registry_mut(collection).complete_flush() {
                if forgotten.closed {
                    notifications.push(EditorNotification::Closed { document: forgotten.id });
                }
            }
        }
        state.changes.release();

        tracing::info!(
            project = %id,
            version = snapshot.version(),
            documents_added = summary.documents_added,
            documents_removed = summary.documents_removed,
            property_rewrites = summary.property_rewrites,
            "batch flushed"
        );
        Ok(notifications)
    }

    fn notify(&self, notifications: Vec<EditorNotification>) {
        if notifications.is_empty() {
            return;
        }
        editor::dispatch(self.inner.services.editor.as_ref(), self.inner.id, notifications);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use projgraph_store::{InMemoryStore, InMemoryWatcher, OutputPathIndex, PathComparison};

    use crate::editor::NoEditor;

    fn project() -> (Project, Arc<InMemoryStore>, Arc<InMemoryWatcher>) {
        let info = ProjectInfo::new(ProjectId::new_unique(), "C#", "App");
        let mut snapshot = Snapshot::new();
        snapshot.add_project(info.clone()).unwrap();
        let store = Arc::new(InMemoryStore::with_snapshot(snapshot));
        let watcher = Arc::new(InMemoryWatcher::new());
        let services = HostServices {
            store: store.clone(),
            output_paths: Arc::new(OutputPathIndex::new(PathComparison::Ordinal)),
            watcher: watcher.clone(),
            editor: Arc::new(NoEditor),
            path_comparison: PathComparison::Ordinal,
        };
        (Project::new(&info, services), store, watcher)
    }

    #[test]
    fn immediate_add_commits_one_transition() {
        let (project, store, watcher) = project();
        let id = project.add_source_file("a.cs", SourceCodeKind::Regular, &[]).unwrap();
        assert_eq!(store.transition_count(), 1);
        assert_eq!(watcher.active_count(), 1);
        let state = project.committed_state().unwrap();
        assert!(state.document(DocumentCollection::Source, id).is_some());
    }

    #[test]
    fn properties_visible_mid_batch() {
        let (project, store, _) = project();
        let scope = project.begin_batch().unwrap();
        assert!(project.set_assembly_name("Renamed").unwrap());
        assert_eq!(project.assembly_name(), "Renamed");
        assert_eq!(project.committed_state().unwrap().assembly_name, "App");
        scope.release().unwrap();
        assert_eq!(store.transition_count(), 1);
        assert_eq!(project.committed_state().unwrap().assembly_name, "Renamed");
    }

    #[test]
    fn unchanged_property_is_a_no_op() {
        let (project, store, _) = project();
        assert!(!project.set_assembly_name("App").unwrap());
        assert_eq!(store.transition_count(), 0);
        assert!(project.set_assembly_name("Other").unwrap());
        assert_eq!(store.transition_count(), 1);
    }

    #[test]
    fn empty_paths_rejected_before_mutation() {
        let (project, store, watcher) = project();
        assert!(matches!(
            project.add_source_file("", SourceCodeKind::Regular, &[]),
            Err(ProjectError::InvalidArgument(_))
        ));
        assert!(matches!(
            project.add_metadata_reference(" ", ReferenceProperties::assembly()),
            Err(ProjectError::InvalidArgument(_))
        ));
        assert_eq!(store.transition_count(), 0);
        assert_eq!(watcher.active_count(), 0);
    }

    #[test]
    fn self_reference_rejected() {
        let (project, _, _) = project();
        assert!(matches!(
            project.add_project_reference(ProjectReference::new(project.id())),
            Err(ProjectError::InvalidArgument(_))
        ));
    }
}
