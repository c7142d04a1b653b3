//! Store error types for projgraph-store.

use thiserror::Error;

use projgraph_core::CoreError;

/// Errors produced by snapshot store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The transition function rejected the current snapshot.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The store refused to commit the transition.
    #[error("transition rejected: {reason}")]
    TransitionRejected { reason: String },

    /// JSON serialization failed while hashing or exporting a snapshot.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
