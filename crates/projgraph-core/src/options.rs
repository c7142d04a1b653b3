//! Opaque option values and the scalar project properties.
//!
//! Compiler and parse options are language specific. projgraph never looks
//! inside them: an [`OpaqueOptions`] is compared for equality and passed
//! through to the snapshot unchanged.

use serde::{Deserialize, Serialize};

/// A language-specific option bag, carried as an uninterpreted JSON value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpaqueOptions(pub serde_json::Value);

impl OpaqueOptions {
    /// Returns true if no options were ever supplied.
    pub fn is_unset(&self) -> bool {
        self.0.is_null()
    }
}

impl From<serde_json::Value> for OpaqueOptions {
    fn from(value: serde_json::Value) -> Self {
        OpaqueOptions(value)
    }
}

/// How a source document is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SourceCodeKind {
    #[default]
    Regular,
    Script,
}

/// One scalar property rewrite.
///
/// Each variant names the property and carries its new value. A sequence
/// of rewrites is applied in order, so a later rewrite of the same property
/// wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "property", content = "value")]
pub enum ProjectProperty {
    AssemblyName(String),
    FilePath(Option<String>),
    DisplayName(String),
    CompilationOptions(OpaqueOptions),
    ParseOptions(OpaqueOptions),
    OutputFilePath(Option<String>),
    OutputRefFilePath(Option<String>),
}

impl ProjectProperty {
    /// Short property name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            ProjectProperty::AssemblyName(_) => "assembly_name",
            ProjectProperty::FilePath(_) => "file_path",
            ProjectProperty::DisplayName(_) => "display_name",
            ProjectProperty::CompilationOptions(_) => "compilation_options",
            ProjectProperty::ParseOptions(_) => "parse_options",
            ProjectProperty::OutputFilePath(_) => "output_file_path",
            ProjectProperty::OutputRefFilePath(_) => "output_ref_file_path",
        }
    }
}
