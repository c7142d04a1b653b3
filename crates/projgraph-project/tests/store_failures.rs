//! Behavior when the snapshot store rejects a commit: nothing is cleared,
//! the error reaches the caller, and the same changes can be committed
//! again.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use projgraph_core::{DocumentCollection, ProjectId, ProjectInfo, ProjectReference, Snapshot, SourceCodeKind};
use projgraph_project::{NoEditor, ProjectError, Workspace, WorkspaceConfig};
use projgraph_store::{InMemoryStore, InMemoryWatcher, SnapshotStore, StoreError, TransitionFn};

/// Store that rejects transitions while `failing` is set.
#[derive(Default)]
struct FlakyStore {
    inner: InMemoryStore,
    failing: AtomicBool,
}

impl FlakyStore {
    fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl SnapshotStore for FlakyStore {
    fn current(&self) -> Arc<Snapshot> {
        self.inner.current()
    }

    fn transform(&self, project: ProjectId, transition: &TransitionFn<'_>) -> Result<Arc<Snapshot>, StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::TransitionRejected {
                reason: "store unavailable".to_string(),
            });
        }
        self.inner.transform(project, transition)
    }
}

struct Fixture {
    workspace: Workspace,
    store: Arc<FlakyStore>,
    watcher: Arc<InMemoryWatcher>,
}

fn fixture() -> Fixture {
    let store = Arc::new(FlakyStore::default());
    let watcher = Arc::new(InMemoryWatcher::new());
    let workspace = Workspace::new(
        &WorkspaceConfig::default(),
        store.clone(),
        watcher.clone(),
        Arc::new(NoEditor),
    );
    Fixture { workspace, store, watcher }
}

#[test]
fn failed_flush_keeps_pending_for_retry() {
    let f = fixture();
    let project = f
        .workspace
        .create_project(ProjectInfo::new(ProjectId::new_unique(), "C#", "App"))
        .unwrap();

    let scope = project.begin_batch().unwrap();
    project.add_source_file("a.cs", SourceCodeKind::Regular, &[]).unwrap();
    project.set_display_name("App (net8)").unwrap();
    f.store.fail(true);

    assert!(matches!(scope.release(), Err(ProjectError::Store(_))));
    assert_eq!(project.batch_depth(), 0);
    let pending = project.pending_changes();
    assert_eq!(pending.documents_added, 1);
    assert_eq!(pending.property_rewrites, 1);
    assert!(project.contains_source_file("a.cs"));

    f.store.fail(false);
    project.commit_pending().unwrap();
    assert!(project.pending_changes().is_empty());
    let state = project.committed_state().unwrap();
    assert_eq!(state.documents(DocumentCollection::Source).len(), 1);
    assert_eq!(state.name, "App (net8)");
}

#[test]
fn failed_flush_on_drop_is_retried_by_next_batch() {
    let f = fixture();
    let project = f
        .workspace
        .create_project(ProjectInfo::new(ProjectId::new_unique(), "C#", "App"))
        .unwrap();

    f.store.fail(true);
    {
        let _scope = project.begin_batch().unwrap();
        project.add_analyzer_reference("an/Style.dll").unwrap();
    }
    assert_eq!(project.pending_changes().analyzer_references_added, 1);

    f.store.fail(false);
    let before = f.store.inner.transition_count();
    project.begin_batch().unwrap().release().unwrap();
    assert_eq!(f.store.inner.transition_count(), before + 1);
    assert_eq!(project.committed_state().unwrap().analyzer_references().len(), 1);
}

#[test]
fn immediate_property_after_failed_flush_is_not_overwritten() {
    let f = fixture();
    let project = f
        .workspace
        .create_project(ProjectInfo::new(ProjectId::new_unique(), "C#", "App"))
        .unwrap();

    let scope = project.begin_batch().unwrap();
    project.set_assembly_name("X").unwrap();
    f.store.fail(true);
    assert!(scope.release().is_err());

    f.store.fail(false);
    project.set_assembly_name("Y").unwrap();
    assert!(project.pending_changes().is_empty());
    project.commit_pending().unwrap();
    assert_eq!(project.assembly_name(), "Y");
    assert_eq!(project.committed_state().unwrap().assembly_name, "Y");
}

#[test]
fn immediate_mutations_commit_changes_left_by_failed_flush_first() {
    let f = fixture();
    let project = f
        .workspace
        .create_project(ProjectInfo::new(ProjectId::new_unique(), "C#", "App"))
        .unwrap();
    let lib = f
        .workspace
        .create_project(ProjectInfo::new(ProjectId::new_unique(), "C#", "Lib"))
        .unwrap();

    let scope = project.begin_batch().unwrap();
    project.add_source_file("a.cs", SourceCodeKind::Regular, &[]).unwrap();
    project.add_project_reference(ProjectReference::new(lib.id())).unwrap();
    f.store.fail(true);
    assert!(scope.release().is_err());

    // Still failing: the new mutation is rejected and nothing changes.
    assert!(matches!(
        project.add_source_file("b.cs", SourceCodeKind::Regular, &[]),
        Err(ProjectError::Store(_))
    ));
    assert!(!project.contains_source_file("b.cs"));
    assert_eq!(project.pending_changes().documents_added, 1);

    f.store.fail(false);
    let before = f.store.inner.transition_count();
    project.remove_source_file("a.cs").unwrap();
    project.remove_project_reference(lib.id()).unwrap();
    // One commit for the leftovers, then one per mutation.
    assert_eq!(f.store.inner.transition_count(), before + 3);

    let state = project.committed_state().unwrap();
    assert!(state.documents(DocumentCollection::Source).is_empty());
    assert!(state.project_references().is_empty());
    assert!(project.pending_changes().is_empty());
    assert_eq!(f.watcher.active_count(), 0);
}

#[test]
fn failed_immediate_add_leaves_nothing_behind() {
    let f = fixture();
    let project = f
        .workspace
        .create_project(ProjectInfo::new(ProjectId::new_unique(), "C#", "App"))
        .unwrap();
    f.store.fail(true);

    assert!(matches!(
        project.add_source_file("a.cs", SourceCodeKind::Regular, &[]),
        Err(ProjectError::Store(_))
    ));
    assert!(!project.contains_source_file("a.cs"));
    assert_eq!(f.watcher.active_count(), 0);

    f.store.fail(false);
    project.add_source_file("a.cs", SourceCodeKind::Regular, &[]).unwrap();
}

#[test]
fn failed_property_commit_reverts_value_and_index() {
    let f = fixture();
    let project = f
        .workspace
        .create_project(
            ProjectInfo::new(ProjectId::new_unique(), "C#", "Lib").with_output_file_path("bin/Lib.dll"),
        )
        .unwrap();
    f.store.fail(true);

    assert!(project.set_output_file_path(Some("bin/Other.dll".into())).is_err());
    assert_eq!(project.output_file_path().as_deref(), Some("bin/Lib.dll"));
    let index = f.workspace.output_paths();
    assert_eq!(index.find_owning_project("bin/Lib.dll"), Some(project.id()));
    assert_eq!(index.find_owning_project("bin/Other.dll"), None);
}

#[test]
fn failed_create_registers_nothing() {
    let f = fixture();
    f.store.fail(true);
    let id = ProjectId::new_unique();
    let result = f
        .workspace
        .create_project(ProjectInfo::new(id, "C#", "Lib").with_output_file_path("bin/Lib.dll"));
    assert!(matches!(result, Err(ProjectError::Store(_))));
    assert!(f.workspace.project(id).is_none());
    assert!(f.workspace.output_paths().is_empty());
}
