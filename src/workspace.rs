// src/workspace.rs

//! Workspace package graph.
//!
//! The scheduler consumes this as an already-discovered DAG of package
//! names; only the "down edges" relation is used during expansion
//! (`down_edges(p)` = the packages `p` directly depends on).

use std::collections::{BTreeMap, BTreeSet};

use crate::errors::{Result, SchedulerError};

/// A DAG of workspace packages, keyed by package name.
///
/// Adjacency is stored in ordered maps so that iteration over a package's
/// upstream set is lexicographic; the task graph builder relies on this for
/// deterministic output.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceGraph {
    /// package -> the packages it directly depends on.
    down_edges: BTreeMap<String, BTreeSet<String>>,
}

impl WorkspaceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a package vertex. Idempotent.
    pub fn add_package(&mut self, name: &str) {
        self.down_edges.entry(name.to_string()).or_default();
    }

    /// Record that `pkg` directly depends on `dep`.
    ///
    /// Both vertices are created if absent. A package cannot depend on
    /// itself. Acyclicity of the workspace graph is the caller's contract;
    /// it is not re-validated here.
    pub fn add_dependency(&mut self, pkg: &str, dep: &str) -> Result<()> {
        if pkg == dep {
            return Err(SchedulerError::InvalidConfig(format!(
                "package '{pkg}' cannot depend on itself"
            )));
        }
        self.add_package(dep);
        self.down_edges
            .entry(pkg.to_string())
            .or_default()
            .insert(dep.to_string());
        Ok(())
    }

    pub fn has_vertex(&self, pkg: &str) -> bool {
        self.down_edges.contains_key(pkg)
    }

    /// The packages `pkg` directly depends on, in lexicographic order.
    /// Empty for unknown packages.
    pub fn down_edges(&self, pkg: &str) -> impl Iterator<Item = &str> {
        self.down_edges
            .get(pkg)
            .into_iter()
            .flat_map(|deps| deps.iter().map(String::as_str))
    }

    /// All package names, in lexicographic order.
    pub fn packages(&self) -> impl Iterator<Item = &str> {
        self.down_edges.keys().map(String::as_str)
    }
}
