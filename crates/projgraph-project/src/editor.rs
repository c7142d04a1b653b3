//! Seam to the host's editor.
//!
//! A project asks the editor whether a path is open (to suppress reloads of
//! documents being edited) and tells it when documents become visible or
//! go away. Open/close notifications are queued while the project's
//! exclusive section is held and dispatched after it is released, so an
//! editor may call back into the project from a notification.

use std::collections::HashSet;

use parking_lot::Mutex;

use projgraph_core::{DocumentId, ProjectId};

/// Editor operations a project depends on.
pub trait EditorHost: Send + Sync {
    /// Returns true if `path` is open for editing.
    ///
    /// Called with the project's exclusive section held; implementations
    /// must not call back into the project.
    fn is_open(&self, path: &str) -> bool;

    /// A document that is open in the editor became part of the snapshot.
    fn document_opened(&self, project: ProjectId, document: DocumentId);

    /// A buffer-bound document left the snapshot.
    fn document_closed(&self, project: ProjectId, document: DocumentId);
}

/// Host without an editor: nothing is ever open.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoEditor;

impl EditorHost for NoEditor {
    fn is_open(&self, _path: &str) -> bool {
        false
    }

    fn document_opened(&self, _project: ProjectId, _document: DocumentId) {}

    fn document_closed(&self, _project: ProjectId, _document: DocumentId) {}
}

/// One notification received by a [`RecordingEditor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorEvent {
    Opened(ProjectId, DocumentId),
    Closed(ProjectId, DocumentId),
}

/// Editor that records notifications and reports a configurable set of
/// paths as open.
#[derive(Debug, Default)]
pub struct RecordingEditor {
    open_paths: Mutex<HashSet<String>>,
    events: Mutex<Vec<EditorEvent>>,
}

impl RecordingEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `path` as open.
    pub fn open(&self, path: &str) {
        self.open_paths.lock().insert(path.to_string());
    }

    /// Marks `path` as closed.
    pub fn close(&self, path: &str) {
        self.open_paths.lock().remove(path);
    }

    /// Notifications received so far.
    pub fn events(&self) -> Vec<EditorEvent> {
        self.events.lock().clone()
    }
}

impl EditorHost for RecordingEditor {
    fn is_open(&self, path: &str) -> bool {
        self.open_paths.lock().contains(path)
    }

    fn document_opened(&self, project: ProjectId, document: DocumentId) {
        self.events.lock().push(EditorEvent::Opened(project, document));
    }

    fn document_closed(&self, project: ProjectId, document: DocumentId) {
        self.events.lock().push(EditorEvent::Closed(project, document));
    }
}

/// Editor work queued during an operation, dispatched after the project's
/// exclusive section is released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum EditorNotification {
    /// A file-backed document became visible; notify if its path is open.
    CheckOpen { document: DocumentId, path: String },
    /// A buffer-bound document became visible.
    Opened { document: DocumentId },
    /// A buffer-bound document left the snapshot.
    Closed { document: DocumentId },
}

pub(crate) fn dispatch(editor: &dyn EditorHost, project: ProjectId, notifications: Vec<EditorNotification>) {
    for notification in notifications {
        match notification {
            EditorNotification::CheckOpen { document, path } => {
                if editor.is_open(&path) {
                    tracing::debug!(project = %project, document = %document, path = %path, "document already open");
                    editor.document_opened(project, document);
                }
            }
            EditorNotification::Opened { document } => editor.document_opened(project, document),
            EditorNotification::Closed { document } => editor.document_closed(project, document),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_open_only_notifies_open_paths() {
        let editor = RecordingEditor::new();
        editor.open("a.cs");
        let project = ProjectId::new_unique();
        let a = DocumentId::new_unique();
        let b = DocumentId::new_unique();

        dispatch(
            &editor,
            project,
            vec![
                EditorNotification::CheckOpen { document: a, path: "a.cs".into() },
                EditorNotification::CheckOpen { document: b, path: "b.cs".into() },
            ],
        );
        assert_eq!(editor.events(), vec![EditorEvent::Opened(project, a)]);
    }

    #[test]
    fn buffer_notifications_always_dispatched() {
        let editor = RecordingEditor::new();
        let project = ProjectId::new_unique();
        let doc = DocumentId::new_unique();
        dispatch(
            &editor,
            project,
            vec![
                EditorNotification::Opened { document: doc },
                EditorNotification::Closed { document: doc },
            ],
        );
        assert_eq!(
            editor.events(),
            vec![EditorEvent::Opened(project, doc), EditorEvent::Closed(project, doc)]
        );
    }

    #[test]
    fn open_close_toggle() {
        let editor = RecordingEditor::new();
        editor.open("a.cs");
        assert!(editor.is_open("a.cs"));
        editor.close("a.cs");
        assert!(!editor.is_open("a.cs"));
        assert!(!NoEditor.is_open("a.cs"));
    }
}
