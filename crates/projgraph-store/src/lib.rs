//! Boundary to the collaborators a project facade commits against.
//!
//! Provides the [`SnapshotStore`] trait defining the atomic "transform the
//! current snapshot" contract, plus the in-process implementations used by
//! the host and by tests.
//!
//! # Modules
//!
//! - [`error`]: StoreError enum
//! - [`traits`]: SnapshotStore trait definition
//! - [`memory`]: InMemoryStore implementation with a transition log
//! - [`paths`]: path key normalization shared by indexes and registries
//! - [`output_index`]: cross-project output-path index
//! - [`watch`]: FileWatcher trait, InMemoryWatcher, file-change feed
//! - [`hash`]: deterministic blake3 hashing of snapshot content
//! - [`diff`]: SnapshotDiff between two snapshot versions

pub mod diff;
pub mod error;
pub mod hash;
pub mod memory;
pub mod output_index;
pub mod paths;
pub mod traits;
pub mod watch;

// Re-export key types for ergonomic use.
pub use diff::{compute_snapshot_diff, ProjectDiff, SnapshotDiff};
pub use error::StoreError;
pub use hash::{hash_document, hash_project};
pub use memory::{InMemoryStore, TransitionRecord};
pub use output_index::OutputPathIndex;
pub use paths::PathComparison;
pub use traits::{SnapshotStore, TransitionFn};
pub use watch::{FileChangeEvent, FileWatcher, InMemoryWatcher, WatchToken};
