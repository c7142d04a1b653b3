//! Mutable per-project facade over the immutable snapshot store.
//!
//! Callers edit a project through [`Project`]: documents, references,
//! analyzers, and scalar properties. Outside a batch every edit is its own
//! snapshot transition. Inside a [`BatchScope`] edits accumulate in the
//! project's registries and [`ChangeSet`] and are committed as one
//! transition when the outermost scope is released.
//!
//! # Modules
//!
//! - [`error`]: ProjectError taxonomy
//! - [`config`]: WorkspaceConfig read from the environment
//! - [`editor`]: EditorHost seam and recording/no-op editors
//! - [`registry`]: PathKeyedRegistry document lifecycle tracking
//! - [`reconcile`]: metadata reference to project reference conversion
//! - [`changeset`]: pending reference and property changes
//! - [`transition`]: snapshot transitions as explicit values
//! - [`flush`]: ordered flush planning
//! - [`batch`]: TransactionCoordinator and BatchScope
//! - [`project`]: the Project facade
//! - [`workspace`]: Workspace host and file-change routing

pub mod batch;
pub mod changeset;
pub mod config;
pub mod editor;
pub mod error;
pub mod flush;
pub mod project;
pub mod reconcile;
pub mod registry;
pub mod transition;
pub mod workspace;

pub use batch::{BatchScope, TransactionCoordinator};
pub use changeset::{ChangeSet, PendingChanges, PendingSet};
pub use config::WorkspaceConfig;
pub use editor::{EditorEvent, EditorHost, NoEditor, RecordingEditor};
pub use error::ProjectError;
pub use flush::plan_flush;
pub use project::Project;
pub use reconcile::{reconcile, Reconciled};
pub use registry::{EntryState, PathKeyedRegistry, RegistryEntry};
pub use transition::{apply_all, Transition};
pub use workspace::{HostServices, Workspace};
