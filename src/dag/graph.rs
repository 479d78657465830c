// src/dag/graph.rs

use std::collections::{BTreeMap, BTreeSet};

use crate::errors::{Result, SchedulerError};

/// Directed acyclic graph of package-task identifiers.
///
/// An edge `A -> B` means "A depends on B": B must complete before A runs.
/// Both directions of adjacency are kept so the walker can decrement
/// dependents without scanning.
///
/// Vertex and edge insertion are idempotent. `connect` refuses edges that
/// would close a cycle. Storage is ordered maps, so all iteration is
/// lexicographic; this is the crate's determinism guarantee.
#[derive(Debug, Clone, Default)]
pub struct TaskDag {
    /// vertex -> the vertices it depends on.
    deps: BTreeMap<String, BTreeSet<String>>,
    /// vertex -> the vertices depending on it.
    dependents: BTreeMap<String, BTreeSet<String>>,
}

impl TaskDag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vertex. No-op if it already exists.
    pub fn add_vertex(&mut self, name: &str) {
        self.deps.entry(name.to_string()).or_default();
        self.dependents.entry(name.to_string()).or_default();
    }

    pub fn has_vertex(&self, name: &str) -> bool {
        self.deps.contains_key(name)
    }

    /// Add the dependency edge `from -> to` ("from depends on to").
    ///
    /// Missing endpoints are created. Re-adding an existing edge is a
    /// no-op. An edge that would close a cycle (including a self-edge) is
    /// refused with [`SchedulerError::CycleDetected`].
    pub fn connect(&mut self, from: &str, to: &str) -> Result<()> {
        if from == to {
            return Err(SchedulerError::CycleDetected(format!(
                "edge {from} -> {to} is a self-dependency"
            )));
        }
        self.add_vertex(from);
        self.add_vertex(to);

        if self.deps[from].contains(to) {
            return Ok(());
        }
        // `from -> to` closes a cycle iff `from` is already a transitive
        // dependency of `to`.
        if self.reaches(to, from) {
            return Err(SchedulerError::CycleDetected(format!(
                "edge {from} -> {to} would close a cycle"
            )));
        }

        self.deps.entry(from.to_string()).or_default().insert(to.to_string());
        self.dependents.entry(to.to_string()).or_default().insert(from.to_string());
        Ok(())
    }

    /// Whether `target` is reachable from `start` along dependency edges.
    fn reaches(&self, start: &str, target: &str) -> bool {
        let mut stack: Vec<&str> = vec![start];
        let mut visited: BTreeSet<&str> = BTreeSet::new();

        while let Some(name) = stack.pop() {
            if name == target {
                return true;
            }
            if !visited.insert(name) {
                continue;
            }
            if let Some(deps) = self.deps.get(name) {
                stack.extend(deps.iter().map(String::as_str));
            }
        }
        false
    }

    /// All vertices, in lexicographic order.
    pub fn vertices(&self) -> impl Iterator<Item = &str> {
        self.deps.keys().map(String::as_str)
    }

    pub fn vertex_count(&self) -> usize {
        self.deps.len()
    }

    pub fn edge_count(&self) -> usize {
        self.deps.values().map(BTreeSet::len).sum()
    }

    /// All edges as `(from, to)` pairs, lexicographic by `from` then `to`.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.deps.iter().flat_map(|(from, tos)| {
            tos.iter().map(move |to| (from.as_str(), to.as_str()))
        })
    }

    /// Direct dependencies of a vertex, in lexicographic order.
    pub fn dependencies_of(&self, name: &str) -> impl Iterator<Item = &str> {
        self.deps
            .get(name)
            .into_iter()
            .flat_map(|deps| deps.iter().map(String::as_str))
    }

    /// Direct dependents of a vertex, in lexicographic order.
    pub fn dependents_of(&self, name: &str) -> impl Iterator<Item = &str> {
        self.dependents
            .get(name)
            .into_iter()
            .flat_map(|deps| deps.iter().map(String::as_str))
    }

    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        self.deps.get(from).is_some_and(|deps| deps.contains(to))
    }
}
