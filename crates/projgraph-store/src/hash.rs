//! Deterministic content hashing of snapshot entities using blake3.
//!
//! Hashes are derived state, never stored in a snapshot. They let a diff
//! tell "same allocation", "different allocation but same content", and
//! "changed" apart without comparing whole projects field by field.
//!
//! # Determinism
//!
//! Hashing serializes with `serde_json::to_vec`. Every collection in the
//! snapshot model is a `Vec` or an `IndexMap` and option bags are
//! `serde_json::Value` objects (sorted keys), so the same content always
//! serializes to the same bytes.

use projgraph_core::{DocumentInfo, ProjectState};

use crate::error::StoreError;

/// Hash of one document's identity, location, and loader.
pub fn hash_document(doc: &DocumentInfo) -> Result<blake3::Hash, StoreError> {
    let bytes = serde_json::to_vec(doc)?;
    Ok(blake3::hash(&bytes))
}

/// Hash of a project's full content: properties, documents, and references.
pub fn hash_project(project: &ProjectState) -> Result<blake3::Hash, StoreError> {
    let mut hasher = blake3::Hasher::new();
    hasher.update(project.id.0.as_bytes());
    hasher.update(&serde_json::to_vec(project)?);
    Ok(hasher.finalize())
}
