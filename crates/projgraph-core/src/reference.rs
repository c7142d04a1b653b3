//! Metadata, project, and analyzer references.
//!
//! A [`MetadataReference`] is content bearing: the host resolves it by
//! reading the file at `path`. A [`ProjectReference`] is structural: it
//! points at another project in the snapshot. The same `(path, properties)`
//! pair doubles as the facade's reference record, so two references to one
//! path with different properties are distinct.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::id::ProjectId;

/// What the referenced file contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ReferenceKind {
    #[default]
    Assembly,
    Module,
}

/// Properties that distinguish references to the same path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ReferenceProperties {
    pub kind: ReferenceKind,
    /// Extern aliases the reference is imported under. Empty means global.
    pub aliases: SmallVec<[String; 2]>,
    /// Whether interop types are embedded into the referencing output.
    pub embed_interop_types: bool,
}

impl ReferenceProperties {
    /// Plain assembly reference with no aliases.
    pub fn assembly() -> Self {
        ReferenceProperties::default()
    }

    /// Module reference. Modules are never converted to project references.
    pub fn module() -> Self {
        ReferenceProperties {
            kind: ReferenceKind::Module,
            ..Default::default()
        }
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_embed_interop_types(mut self, embed: bool) -> Self {
        self.embed_interop_types = embed;
        self
    }
}

/// A content-bearing reference to a file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetadataReference {
    pub path: String,
    pub properties: ReferenceProperties,
}

impl MetadataReference {
    pub fn new(path: impl Into<String>, properties: ReferenceProperties) -> Self {
        MetadataReference {
            path: path.into(),
            properties,
        }
    }
}

/// A structural reference to another project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectReference {
    pub project_id: ProjectId,
    pub aliases: SmallVec<[String; 2]>,
    pub embed_interop_types: bool,
}

impl ProjectReference {
    pub fn new(project_id: ProjectId) -> Self {
        ProjectReference {
            project_id,
            aliases: SmallVec::new(),
            embed_interop_types: false,
        }
    }

    /// The project reference a metadata reference with `properties` converts
    /// into when its path is `target`'s output.
    pub fn converted_from(target: ProjectId, properties: &ReferenceProperties) -> Self {
        ProjectReference {
            project_id: target,
            aliases: properties.aliases.clone(),
            embed_interop_types: properties.embed_interop_types,
        }
    }
}

/// What keeps a project reference edge in the snapshot. A direct project
/// reference and a metadata reference converted into the same edge share
/// it; the edge goes away when its last holder is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceHolder {
    /// Added as a project reference.
    Direct,
    /// A metadata reference to the target's output.
    Converted,
}

/// An analyzer assembly, identified by path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnalyzerReference {
    pub path: String,
}

impl AnalyzerReference {
    pub fn new(path: impl Into<String>) -> Self {
        AnalyzerReference { path: path.into() }
    }
}
