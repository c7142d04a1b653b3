//! Stable identity newtypes for snapshot entities.
//!
//! Project and document identities are UUID v4 newtypes so they are unique
//! across every project a host ever creates, not just within one snapshot.
//! [`BufferId`] is allocated by the host's editor and is opaque here.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Project identity within the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectId(pub Uuid);

/// Document identity. Stable for the lifetime of a registry entry,
/// including across reloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(pub Uuid);

/// Identity of a live text buffer owned by the host's editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BufferId(pub u64);

impl ProjectId {
    /// Allocates a fresh, globally unique project identity.
    pub fn new_unique() -> Self {
        ProjectId(Uuid::new_v4())
    }
}

impl DocumentId {
    /// Allocates a fresh, globally unique document identity.
    pub fn new_unique() -> Self {
        DocumentId(Uuid::new_v4())
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "buffer#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_ids_differ() {
        assert_ne!(ProjectId::new_unique(), ProjectId::new_unique());
        assert_ne!(DocumentId::new_unique(), DocumentId::new_unique());
    }

    #[test]
    fn buffer_id_display() {
        assert_eq!(format!("{}", BufferId(7)), "buffer#7");
    }

    #[test]
    fn project_id_display_is_bare_uuid() {
        let id = ProjectId::new_unique();
        assert_eq!(id.to_string(), id.0.to_string());
    }

    #[test]
    fn serde_roundtrip() {
        let doc = DocumentId::new_unique();
        let json = serde_json::to_string(&doc).unwrap();
        let back: DocumentId = serde_json::from_str(&json).unwrap();
        assert_eq!(doc, back);
    }
}
