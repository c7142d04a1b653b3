//! Shared fixtures for the facade integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use projgraph_core::{ProjectId, ProjectInfo};
use projgraph_project::{Project, RecordingEditor, Workspace, WorkspaceConfig};
use projgraph_store::{InMemoryStore, InMemoryWatcher};

pub struct Harness {
    pub workspace: Workspace,
    pub store: Arc<InMemoryStore>,
    pub watcher: Arc<InMemoryWatcher>,
    pub editor: Arc<RecordingEditor>,
}

pub fn harness() -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let watcher = Arc::new(InMemoryWatcher::new());
    let editor = Arc::new(RecordingEditor::new());
    let workspace = Workspace::new(
        &WorkspaceConfig::default(),
        store.clone(),
        watcher.clone(),
        editor.clone(),
    );
    Harness {
        workspace,
        store,
        watcher,
        editor,
    }
}

impl Harness {
    pub fn project(&self, name: &str) -> Project {
        self.workspace
            .create_project(ProjectInfo::new(ProjectId::new_unique(), "C#", name))
            .unwrap()
    }

    pub fn project_with_output(&self, name: &str, output: &str) -> Project {
        self.workspace
            .create_project(
                ProjectInfo::new(ProjectId::new_unique(), "C#", name).with_output_file_path(output),
            )
            .unwrap()
    }
}
