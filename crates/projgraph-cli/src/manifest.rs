//! Workspace manifests and loading them through the project facade.
//!
//! A manifest is a JSON document listing projects with their documents and
//! references. Loading creates every project first, so all output paths are
//! registered before any reference is reconciled, then fills each project,
//! inside one batch per project unless batching is disabled.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use projgraph_core::{
    OpaqueOptions, ProjectId, ProjectInfo, ProjectReference, ReferenceKind, ReferenceProperties,
    SourceCodeKind,
};
use projgraph_project::{Project, ProjectError, Workspace};

/// Errors raised while reading or loading a manifest.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read manifest: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("snapshot inspection failed: {0}")]
    Store(#[from] projgraph_store::StoreError),

    #[error("project '{project}' references unknown project '{target}'")]
    UnknownProject { project: String, target: String },

    #[error("project '{project}': {source}")]
    Project {
        project: String,
        #[source]
        source: ProjectError,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub projects: Vec<ProjectManifest>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectManifest {
    pub name: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub assembly_name: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub output_file_path: Option<String>,
    #[serde(default)]
    pub output_ref_file_path: Option<String>,
    #[serde(default)]
    pub compilation_options: OpaqueOptions,
    #[serde(default)]
    pub parse_options: OpaqueOptions,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub scripts: Vec<String>,
    #[serde(default)]
    pub additional: Vec<String>,
    #[serde(default)]
    pub metadata_references: Vec<ReferenceManifest>,
    /// Names of referenced projects.
    #[serde(default)]
    pub project_references: Vec<String>,
    #[serde(default)]
    pub analyzers: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReferenceManifest {
    pub path: String,
    #[serde(default)]
    pub kind: ReferenceKind,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub embed_interop_types: bool,
}

impl ReferenceManifest {
    fn properties(&self) -> ReferenceProperties {
        ReferenceProperties {
            kind: self.kind,
            ..ReferenceProperties::default()
        }
        .with_aliases(self.aliases.iter().cloned())
        .with_embed_interop_types(self.embed_interop_types)
    }
}

fn default_language() -> String {
    "C#".to_string()
}

impl Manifest {
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Projects created by [`load`], in manifest order.
#[derive(Debug)]
pub struct Loaded {
    pub projects: Vec<(String, ProjectId)>,
}

/// Loads `manifest` into `workspace`.
pub fn load(workspace: &Workspace, manifest: &Manifest, batched: bool) -> Result<Loaded, LoadError> {
    let mut created: Vec<(Project, &ProjectManifest)> = Vec::with_capacity(manifest.projects.len());
    let mut by_name: HashMap<&str, ProjectId> = HashMap::new();

    for entry in &manifest.projects {
        let info = project_info(entry);
        let project = workspace
            .create_project(info)
            .map_err(|source| LoadError::Project {
                project: entry.name.clone(),
                source,
            })?;
        by_name.insert(entry.name.as_str(), project.id());
        created.push((project, entry));
    }

    for (project, entry) in &created {
        let targets = entry
            .project_references
            .iter()
            .map(|name| {
                by_name.get(name.as_str()).copied().ok_or_else(|| LoadError::UnknownProject {
                    project: entry.name.clone(),
                    target: name.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        fill(project, entry, &targets, batched).map_err(|source| LoadError::Project {
            project: entry.name.clone(),
            source,
        })?;
        tracing::debug!(project = %project.id(), name = %entry.name, "project loaded");
    }

    Ok(Loaded {
        projects: created.iter().map(|(p, e)| (e.name.clone(), p.id())).collect(),
    })
}

fn project_info(entry: &ProjectManifest) -> ProjectInfo {
    let mut info = ProjectInfo::new(ProjectId::new_unique(), entry.language.clone(), entry.name.clone())
        .with_compilation_options(entry.compilation_options.clone())
        .with_parse_options(entry.parse_options.clone());
    if let Some(name) = &entry.assembly_name {
        info = info.with_assembly_name(name.clone());
    }
    info.file_path = entry.file_path.clone();
    info.output_file_path = entry.output_file_path.clone();
    info.output_ref_file_path = entry.output_ref_file_path.clone();
    info
}

fn fill(project: &Project, entry: &ProjectManifest, targets: &[ProjectId], batched: bool) -> Result<(), ProjectError> {
    let scope = if batched { Some(project.begin_batch()?) } else { None };

    for path in &entry.sources {
        project.add_source_file(path, SourceCodeKind::Regular, &[])?;
    }
    for path in &entry.scripts {
        project.add_source_file(path, SourceCodeKind::Script, &[])?;
    }
    for path in &entry.additional {
        project.add_additional_file(path, &[])?;
    }
    for reference in &entry.metadata_references {
        project.add_metadata_reference(&reference.path, reference.properties())?;
    }
    for target in targets {
        project.add_project_reference(ProjectReference::new(*target))?;
    }
    for path in &entry.analyzers {
        project.add_analyzer_reference(path)?;
    }

    match scope {
        Some(scope) => scope.release(),
        None => Ok(()),
    }
}
