//! projgraph command-line tool.
//!
//! Provides the `projgraph` binary, which loads a JSON workspace manifest
//! through the same project facade a tooling host uses and reports the
//! resulting snapshot.
//!
//! Reads configuration from environment variables:
//! - `PROJGRAPH_LOG`: tracing filter directive (default: "info")
//! - `PROJGRAPH_CASE_INSENSITIVE_PATHS`: compare paths ignoring case

mod manifest;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use projgraph_core::{DocumentCollection, ProjectId, Snapshot};
use projgraph_project::{Workspace, WorkspaceConfig};
use projgraph_store::{compute_snapshot_diff, PathComparison};

use crate::manifest::{load, LoadError, Manifest};

/// Project graph loader and inspector.
#[derive(Parser)]
#[command(name = "projgraph", about = "Project graph loader and inspector")]
struct Cli {
    /// Compare file paths ignoring case (overrides the environment).
    #[arg(long, global = true)]
    case_insensitive_paths: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Load a manifest and print a summary of the resulting snapshot.
    Load {
        /// Path to the workspace manifest (JSON).
        manifest: PathBuf,

        /// Commit every operation on its own instead of one batch per project.
        #[arg(long)]
        no_batch: bool,

        /// Print the full snapshot as JSON instead of a summary.
        #[arg(long)]
        json: bool,
    },
    /// Load a manifest and print the project build order.
    Order {
        /// Path to the workspace manifest (JSON).
        manifest: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let mut config = WorkspaceConfig::from_env();
    if cli.case_insensitive_paths {
        config.path_comparison = PathComparison::IgnoreCase;
    }
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_filter))
        .with_writer(std::io::stderr)
        .init();

    let exit_code = match cli.command {
        Commands::Load {
            manifest,
            no_batch,
            json,
        } => run_load(&config, &manifest, !no_batch, json),
        Commands::Order { manifest } => run_order(&config, &manifest),
    };
    process::exit(exit_code);
}

/// Per-project line of the load summary.
#[derive(Debug, Serialize)]
struct ProjectSummary {
    name: String,
    id: ProjectId,
    sources: usize,
    additional: usize,
    metadata_references: usize,
    project_references: usize,
    analyzer_references: usize,
}

/// Result of the `load` subcommand.
#[derive(Debug, Serialize)]
struct LoadSummary {
    version: u64,
    transitions: usize,
    projects_added: usize,
    projects: Vec<ProjectSummary>,
}

fn summarize(snapshot: &Snapshot, transitions: usize) -> Result<LoadSummary, LoadError> {
    let diff = compute_snapshot_diff(&Snapshot::new(), snapshot)?;
    let projects = snapshot
        .projects()
        .map(|p| ProjectSummary {
            name: p.name.clone(),
            id: p.id,
            sources: p.documents(DocumentCollection::Source).len(),
            additional: p.documents(DocumentCollection::Additional).len(),
            metadata_references: p.metadata_references().len(),
            project_references: p.project_references().len(),
            analyzer_references: p.analyzer_references().len(),
        })
        .collect();
    Ok(LoadSummary {
        version: snapshot.version(),
        transitions,
        projects_added: diff.added.len(),
        projects,
    })
}

/// Execute the load subcommand.
///
/// Returns exit code: 0 = success, 1 = manifest or load error, 3 = I/O error.
fn run_load(config: &WorkspaceConfig, path: &Path, batched: bool, json: bool) -> i32 {
    let manifest = match Manifest::from_path(path) {
        Ok(m) => m,
        Err(e) => return report(&e),
    };

    let (workspace, store, _) = Workspace::in_memory(config);
    if let Err(e) = load(&workspace, &manifest, batched) {
        return report(&e);
    }
    let snapshot = workspace.snapshot();
    tracing::info!(
        projects = snapshot.project_count(),
        transitions = store.transition_count(),
        "manifest loaded"
    );

    let output = if json {
        serde_json::to_string_pretty(&*snapshot)
    } else {
        match summarize(&snapshot, store.transition_count()) {
            Ok(summary) => serde_json::to_string_pretty(&summary),
            Err(e) => return report(&e),
        }
    };
    match output {
        Ok(text) => {
            println!("{}", text);
            0
        }
        Err(e) => {
            eprintln!("Error: failed to serialize output: {}", e);
            1
        }
    }
}

/// Execute the order subcommand.
fn run_order(config: &WorkspaceConfig, path: &Path) -> i32 {
    let manifest = match Manifest::from_path(path) {
        Ok(m) => m,
        Err(e) => return report(&e),
    };
    let (workspace, _, _) = Workspace::in_memory(config);
    if let Err(e) = load(&workspace, &manifest, true) {
        return report(&e);
    }

    let snapshot = workspace.snapshot();
    match workspace.build_order() {
        Ok(order) => {
            for id in order {
                if let Some(project) = snapshot.project(id) {
                    println!("{}", project.name);
                }
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn report(err: &LoadError) -> i32 {
    eprintln!("Error: {}", err);
    match err {
        LoadError::Io(_) => 3,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn manifest_file(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    const MANIFEST: &str = r#"{
        "projects": [
            { "name": "App", "sources": ["Program.cs"], "project_references": ["Lib"] },
            { "name": "Lib", "sources": ["Util.cs"], "output_file_path": "bin/Lib.dll" }
        ]
    }"#;

    #[test]
    fn load_reads_manifest_from_disk() {
        let file = manifest_file(MANIFEST);
        let manifest = Manifest::from_path(file.path()).unwrap();
        assert_eq!(manifest.projects.len(), 2);
        assert_eq!(run_load(&WorkspaceConfig::default(), file.path(), true, false), 0);
    }

    #[test]
    fn summary_counts_everything() {
        let file = manifest_file(MANIFEST);
        let manifest = Manifest::from_path(file.path()).unwrap();
        let (workspace, store, _) = Workspace::in_memory(&WorkspaceConfig::default());
        load(&workspace, &manifest, true).unwrap();

        let summary = summarize(&workspace.snapshot(), store.transition_count()).unwrap();
        assert_eq!(summary.projects_added, 2);
        assert_eq!(summary.transitions, 4);
        assert_eq!(summary.projects[0].name, "App");
        assert_eq!(summary.projects[0].project_references, 1);
        assert_eq!(summary.projects[1].sources, 1);
    }

    #[test]
    fn missing_manifest_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert_eq!(run_load(&WorkspaceConfig::default(), &missing, true, false), 3);
    }

    #[test]
    fn malformed_manifest_is_rejected() {
        let file = manifest_file("{ not json");
        assert_eq!(run_order(&WorkspaceConfig::default(), file.path()), 1);
    }

    #[test]
    fn order_succeeds_for_acyclic_manifest() {
        let file = manifest_file(MANIFEST);
        assert_eq!(run_order(&WorkspaceConfig::default(), file.path()), 0);
    }
}
