//! Workspace host: owns the shared collaborators and the project facades.
//!
//! [`Workspace`] creates and removes projects, hands out [`Project`]
//! facades, and routes file-change notifications from the watch subsystem
//! to the projects tracking the changed path.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use projgraph_core::{CoreError, ProjectDependencyGraph, ProjectId, ProjectInfo, Snapshot};
use projgraph_store::{
    FileChangeEvent, FileWatcher, InMemoryStore, InMemoryWatcher, OutputPathIndex, PathComparison,
    SnapshotStore,
};

use crate::config::WorkspaceConfig;
use crate::editor::{EditorHost, NoEditor};
use crate::error::{require_path, ProjectError};
use crate::project::Project;

/// Collaborators shared by every project of a workspace.
#[derive(Clone)]
pub struct HostServices {
    pub store: Arc<dyn SnapshotStore>,
    pub output_paths: Arc<OutputPathIndex>,
    pub watcher: Arc<dyn FileWatcher>,
    pub editor: Arc<dyn EditorHost>,
    pub path_comparison: PathComparison,
}

/// The set of live projects over one snapshot store.
pub struct Workspace {
    services: HostServices,
    projects: DashMap<ProjectId, Project>,
}

impl Workspace {
    pub fn new(
        config: &WorkspaceConfig,
        store: Arc<dyn SnapshotStore>,
        watcher: Arc<dyn FileWatcher>,
        editor: Arc<dyn EditorHost>,
    ) -> Self {
        Workspace {
            services: HostServices {
                store,
                output_paths: Arc::new(OutputPathIndex::new(config.path_comparison)),
                watcher,
                editor,
                path_comparison: config.path_comparison,
            },
            projects: DashMap::new(),
        }
    }

    /// A workspace over a fresh [`InMemoryStore`] and [`InMemoryWatcher`]
    /// without an editor. Returns the store and watcher for inspection.
    pub fn in_memory(config: &WorkspaceConfig) -> (Self, Arc<InMemoryStore>, Arc<InMemoryWatcher>) {
        let store = Arc::new(InMemoryStore::new());
        let watcher = Arc::new(InMemoryWatcher::new());
        let workspace = Workspace::new(config, store.clone(), watcher.clone(), Arc::new(NoEditor));
        (workspace, store, watcher)
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.services.store.current()
    }

    pub fn output_paths(&self) -> &OutputPathIndex {
        &self.services.output_paths
    }

    /// Adds an empty project to the snapshot and returns its facade. The
    /// project's output paths are registered immediately.
    pub fn create_project(&self, info: ProjectInfo) -> Result<Project, ProjectError> {
        if info.language.trim().is_empty() {
            return Err(ProjectError::InvalidArgument("project language must not be empty".to_string()));
        }
        if info.name.trim().is_empty() {
            return Err(ProjectError::InvalidArgument("project name must not be empty".to_string()));
        }
        for path in [&info.output_file_path, &info.output_ref_file_path].into_iter().flatten() {
            require_path(path)?;
        }
        if self.projects.contains_key(&info.id) {
            return Err(CoreError::DuplicateProject { id: info.id }.into());
        }

        self.services.store.transform(info.id, &|snapshot: &Snapshot| -> Result<Snapshot, CoreError> {
            let mut next = snapshot.clone();
            next.add_project(info.clone())?;
            Ok(next)
        })?;

        for path in [&info.output_file_path, &info.output_ref_file_path].into_iter().flatten() {
            self.services.output_paths.register_output_path(info.id, path);
        }
        let project = Project::new(&info, self.services.clone());
        self.projects.insert(info.id, project.clone());
        tracing::info!(project = %info.id, name = %info.name, language = %info.language, "project created");
        Ok(project)
    }

    pub fn project(&self, id: ProjectId) -> Option<Project> {
        self.projects.get(&id).map(|p| p.value().clone())
    }

    /// Live projects in the order they were added to the snapshot.
    pub fn projects(&self) -> Vec<Project> {
        self.snapshot()
            .project_ids()
            .filter_map(|id| self.project(id))
            .collect()
    }

    /// Removes a project: drops it from the snapshot together with every
    /// project reference to it, releases its watches and output paths.
    pub fn remove_project(&self, id: ProjectId) -> Result<(), ProjectError> {
        let project = self
            .project(id)
            .ok_or_else(|| ProjectError::NotFound(format!("project {id} is not in the workspace")))?;
        project.remove_from_workspace()?;
        self.projects.remove(&id);

        for other in self.projects.iter() {
            other.value().forget_references_to(id);
        }
        Ok(())
    }

    /// Projects ordered so every project follows the projects it references.
    pub fn build_order(&self) -> Result<Vec<ProjectId>, ProjectError> {
        Ok(ProjectDependencyGraph::from_snapshot(&self.snapshot()).build_order()?)
    }

    /// Delivers a file-change notification to every project. Returns how
    /// many projects reloaded a document.
    pub fn dispatch_file_change(&self, path: &str) -> usize {
        // Clone the handles out so no map shard stays locked during reloads.
        let projects: Vec<Project> = self.projects.iter().map(|p| p.value().clone()).collect();
        let mut reloaded = 0;
        for project in projects {
            match project.on_file_changed(path) {
                Ok(true) => reloaded += 1,
                Ok(false) => {}
                Err(err) => {
                    tracing::warn!(project = %project.id(), path, error = %err, "reload failed");
                }
            }
        }
        reloaded
    }

    /// Spawns a task that dispatches every event from `feed` until the
    /// sending side closes.
    pub fn spawn_change_pump(
        self: &Arc<Self>,
        mut feed: mpsc::UnboundedReceiver<FileChangeEvent>,
    ) -> JoinHandle<()> {
        let workspace = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(event) = feed.recv().await {
                let reloaded = workspace.dispatch_file_change(&event.path);
                tracing::debug!(path = %event.path, reloaded, "file change dispatched");
            }
            tracing::debug!("file change feed closed");
        })
    }
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("projects", &self.projects.len())
            .field("path_comparison", &self.services.path_comparison)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use projgraph_core::ProjectReference;

    fn workspace() -> (Workspace, Arc<InMemoryStore>) {
        let (workspace, store, _) = Workspace::in_memory(&WorkspaceConfig::default());
        (workspace, store)
    }

    #[test]
    fn create_registers_outputs() {
        let (workspace, store) = workspace();
        let id = ProjectId::new_unique();
        let info = ProjectInfo::new(id, "C#", "Lib").with_output_file_path("bin/Lib.dll");
        workspace.create_project(info).unwrap();

        assert_eq!(store.transition_count(), 1);
        assert!(workspace.snapshot().contains_project(id));
        assert_eq!(workspace.output_paths().find_owning_project("bin/Lib.dll"), Some(id));
    }

    #[test]
    fn create_rejects_duplicates_and_blank_names() {
        let (workspace, _) = workspace();
        let id = ProjectId::new_unique();
        workspace.create_project(ProjectInfo::new(id, "C#", "A")).unwrap();
        assert!(matches!(
            workspace.create_project(ProjectInfo::new(id, "C#", "A")),
            Err(ProjectError::DuplicateEntry(_))
        ));
        assert!(matches!(
            workspace.create_project(ProjectInfo::new(ProjectId::new_unique(), "C#", "")),
            Err(ProjectError::InvalidArgument(_))
        ));
    }

    #[test]
    fn remove_strips_references_and_outputs() {
        let (workspace, _) = workspace();
        let a = workspace
            .create_project(ProjectInfo::new(ProjectId::new_unique(), "C#", "A"))
            .unwrap();
        let b_id = ProjectId::new_unique();
        workspace
            .create_project(ProjectInfo::new(b_id, "C#", "B").with_output_file_path("bin/B.dll"))
            .unwrap();
        a.add_project_reference(ProjectReference::new(b_id)).unwrap();

        workspace.remove_project(b_id).unwrap();

        assert!(workspace.project(b_id).is_none());
        assert!(!a.contains_project_reference(b_id));
        assert!(a.committed_state().unwrap().project_references().is_empty());
        assert!(workspace.output_paths().is_empty());
        assert!(matches!(workspace.remove_project(b_id), Err(ProjectError::NotFound(_))));
    }

    #[test]
    fn build_order_follows_references() {
        let (workspace, _) = workspace();
        let app = workspace
            .create_project(ProjectInfo::new(ProjectId::new_unique(), "C#", "App"))
            .unwrap();
        let lib = workspace
            .create_project(ProjectInfo::new(ProjectId::new_unique(), "C#", "Lib"))
            .unwrap();
        app.add_project_reference(ProjectReference::new(lib.id())).unwrap();
        assert_eq!(workspace.build_order().unwrap(), vec![lib.id(), app.id()]);
    }
}
