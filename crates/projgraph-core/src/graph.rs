//! Project dependency graph derived from a snapshot.
//!
//! [`ProjectDependencyGraph`] is a `DiGraphMap` with one node per project and
//! one edge per project reference (`referencing -> referenced`). It is
//! derived state, rebuilt from a snapshot whenever it is needed, and is used
//! to reject project references that would close a cycle and to compute a
//! build order.

use petgraph::algo::{has_path_connecting, toposort};
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;

use crate::error::CoreError;
use crate::id::ProjectId;
use crate::snapshot::Snapshot;

/// Directed graph of project references.
#[derive(Debug, Clone, Default)]
pub struct ProjectDependencyGraph {
    graph: DiGraphMap<ProjectId, ()>,
}

impl ProjectDependencyGraph {
    /// Builds the graph from every project and project reference in
    /// `snapshot`. References to projects outside the snapshot still
    /// contribute a node.
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let mut graph = DiGraphMap::new();
        for project in snapshot.projects() {
            graph.add_node(project.id);
            for reference in project.project_references() {
                graph.add_edge(project.id, reference.project_id, ());
            }
        }
        ProjectDependencyGraph { graph }
    }

    /// Returns true if adding `from -> to` would make the graph cyclic.
    pub fn would_create_cycle(&self, from: ProjectId, to: ProjectId) -> bool {
        if from == to {
            return true;
        }
        if !self.graph.contains_node(from) || !self.graph.contains_node(to) {
            return false;
        }
        has_path_connecting(&self.graph, to, from, None)
    }

    /// Projects `id` references directly.
    pub fn dependencies(&self, id: ProjectId) -> Vec<ProjectId> {
        self.neighbors(id, Direction::Outgoing)
    }

    /// Projects that reference `id` directly.
    pub fn dependents(&self, id: ProjectId) -> Vec<ProjectId> {
        self.neighbors(id, Direction::Incoming)
    }

    /// Projects ordered so that every project comes after the projects it
    /// references.
    pub fn build_order(&self) -> Result<Vec<ProjectId>, CoreError> {
        match toposort(&self.graph, None) {
            Ok(mut order) => {
                // toposort yields referencing projects first.
                order.reverse();
                Ok(order)
            }
            Err(cycle) => {
                let node = cycle.node_id();
                Err(CoreError::CycleDetected { from: node, to: node })
            }
        }
    }

    fn neighbors(&self, id: ProjectId, direction: Direction) -> Vec<ProjectId> {
        if !self.graph.contains_node(id) {
            return Vec::new();
        }
        let mut ids: Vec<ProjectId> = self.graph.neighbors_directed(id, direction).collect();
        ids.sort();
        ids
    }
}
