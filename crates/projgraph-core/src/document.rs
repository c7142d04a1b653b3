//! Documents as they appear in the snapshot.
//!
//! A [`DocumentInfo`] names where its text comes from through a
//! [`TextLoader`]: either a file on disk or a live buffer owned by the
//! host's editor. Loading and decoding text is the host's job; the snapshot
//! only records the source and a reload generation.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::id::{BufferId, DocumentId};
use crate::options::SourceCodeKind;

/// Where a document's text is loaded from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum TextLoader {
    /// Text is read from `path`. `generation` increases on every reload so
    /// that a reloaded document is distinguishable from the stale one.
    File { path: String, generation: u32 },
    /// Text is supplied by a live editor buffer.
    Buffer { buffer: BufferId },
}

impl TextLoader {
    /// A loader for `path` at generation zero.
    pub fn file(path: impl Into<String>) -> Self {
        TextLoader::File {
            path: path.into(),
            generation: 0,
        }
    }

    /// Returns the loader that replaces this one after a file change.
    ///
    /// Buffer loaders are returned unchanged: the editor owns their text.
    pub fn reloaded(&self) -> Self {
        match self {
            TextLoader::File { path, generation } => TextLoader::File {
                path: path.clone(),
                generation: generation.wrapping_add(1),
            },
            TextLoader::Buffer { buffer } => TextLoader::Buffer { buffer: *buffer },
        }
    }
}

/// A document in a project's source or additional collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    /// Stable identity.
    pub id: DocumentId,
    /// Display name, the last path segment when a path is known.
    pub name: String,
    /// File path, absent for buffer-only documents.
    pub file_path: Option<String>,
    /// Logical folders the document is shown under.
    pub folders: Vec<String>,
    /// Parse mode.
    pub kind: SourceCodeKind,
    /// Text source.
    pub loader: TextLoader,
}

impl DocumentInfo {
    /// Describes a document backed by the file at `path`.
    pub fn from_file(id: DocumentId, path: &str, kind: SourceCodeKind, folders: &[String]) -> Self {
        DocumentInfo {
            id,
            name: display_name(path),
            file_path: Some(path.to_string()),
            folders: folders.to_vec(),
            kind,
            loader: TextLoader::file(path),
        }
    }

    /// Describes a document backed by a live buffer, optionally associated
    /// with a file path.
    pub fn from_buffer(
        id: DocumentId,
        buffer: BufferId,
        path: Option<&str>,
        kind: SourceCodeKind,
        folders: &[String],
    ) -> Self {
        DocumentInfo {
            id,
            name: path.map(display_name).unwrap_or_else(|| buffer.to_string()),
            file_path: path.map(str::to_string),
            folders: folders.to_vec(),
            kind,
            loader: TextLoader::Buffer { buffer },
        }
    }

    /// Returns true if the document's text comes from an editor buffer.
    pub fn is_buffer_bound(&self) -> bool {
        matches!(self.loader, TextLoader::Buffer { .. })
    }
}

fn display_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}
