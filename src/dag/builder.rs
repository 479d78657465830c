// src/dag/builder.rs

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use tracing::{debug, warn};

use crate::dag::graph::TaskDag;
use crate::errors::{Result, SchedulerError};
use crate::registry::TaskRegistry;
use crate::task_id::{task_id, ROOT_NODE_NAME, ROOT_PKG_NAME};
use crate::workspace::WorkspaceGraph;

/// Expands a seed set of (package, task) pairs into the concrete task DAG.
///
/// Expansion is a breadth-first walk over package-task identifiers. Each
/// visited identifier contributes edges from three sources, in order:
/// topological deps (one per upstream package), same-package deps, and
/// explicit package-task deps. Identifiers with none of the three are
/// connected to the synthetic root instead.
pub(crate) struct GraphBuilder<'a> {
    pub workspace: &'a WorkspaceGraph,
    pub registry: &'a TaskRegistry,
    /// Explicit `(from, to)` package-task edges, in declaration order.
    pub package_task_deps: &'a [(String, String)],
}

/// Narrows a definition's dep sets to the requested task names.
///
/// The registry is never mutated; this view is consulted instead, which
/// keeps `prepare` repeatable on one scheduler.
struct FilteredTaskView<'a> {
    allow: Option<&'a [String]>,
}

impl<'a> FilteredTaskView<'a> {
    fn new(tasks_only: bool, task_names: &'a [String]) -> Self {
        Self {
            allow: tasks_only.then_some(task_names),
        }
    }

    fn narrow<'d>(&self, set: &'d BTreeSet<String>) -> Vec<&'d str> {
        match self.allow {
            Some(allow) => set
                .iter()
                .map(String::as_str)
                .filter(|dep| allow.iter().any(|name| name == dep))
                .collect(),
            None => set.iter().map(String::as_str).collect(),
        }
    }
}

impl<'a> GraphBuilder<'a> {
    /// Build the task DAG for the given scope.
    ///
    /// `task_names` must already be defaulted by the caller (an empty
    /// request means "all registered names" and is resolved upstream).
    pub(crate) fn build(
        &self,
        scope: &[String],
        task_names: &[String],
        tasks_only: bool,
    ) -> Result<TaskDag> {
        let mut dag = TaskDag::new();
        let view = FilteredTaskView::new(tasks_only, task_names);
        let explicit = explicit_edge_index(self.package_task_deps);

        let mut queue: VecDeque<String> = VecDeque::new();
        for pkg in scope {
            let is_root_pkg = pkg == ROOT_PKG_NAME;
            for target in task_names {
                if is_root_pkg && !self.registry.is_root_enabled(target) {
                    warn!(task = %target, "task is not enabled for the root package; skipping");
                    continue;
                }
                queue.push_back(task_id(pkg, target));
            }
        }

        let mut visited: BTreeSet<String> = BTreeSet::new();

        while let Some(to_task_id) = queue.pop_front() {
            let (pkg, def) = match self.registry.resolve(&to_task_id) {
                Ok(found) => found,
                // No definition under either key: the identifier stays
                // unexpanded. It may still enter the DAG through edges from
                // other vertices.
                Err(SchedulerError::NoSuchTask(_)) => continue,
                Err(err) => return Err(err),
            };

            if visited.contains(to_task_id.as_str()) {
                continue;
            }
            visited.insert(to_task_id.clone());
            debug!(task = %to_task_id, "expanding package task");

            let deps = view.narrow(&def.deps);
            let topo_deps = view.narrow(&def.topo_deps);

            let has_topo_deps =
                !topo_deps.is_empty() && self.workspace.down_edges(pkg).next().is_some();
            let has_deps = !deps.is_empty();
            let has_package_task_deps = explicit.contains_key(to_task_id.as_str());

            if has_topo_deps {
                for dep in &topo_deps {
                    for dep_pkg in self.workspace.down_edges(pkg) {
                        let from_task_id = task_id(dep_pkg, dep);
                        dag.add_vertex(&from_task_id);
                        dag.add_vertex(&to_task_id);
                        dag.connect(&to_task_id, &from_task_id)?;
                        queue.push_back(from_task_id);
                    }
                }
            }

            if has_deps {
                for dep in &deps {
                    let from_task_id = task_id(pkg, dep);
                    dag.add_vertex(&from_task_id);
                    dag.add_vertex(&to_task_id);
                    dag.connect(&to_task_id, &from_task_id)?;
                    queue.push_back(from_task_id);
                }
            }

            if has_package_task_deps {
                if let Some(from_ids) = explicit.get(to_task_id.as_str()) {
                    for from_task_id in from_ids {
                        dag.add_vertex(from_task_id);
                        dag.add_vertex(&to_task_id);
                        dag.connect(&to_task_id, from_task_id)?;
                        queue.push_back((*from_task_id).to_string());
                    }
                }
            }

            if !has_deps && !has_topo_deps && !has_package_task_deps {
                dag.add_vertex(ROOT_NODE_NAME);
                dag.add_vertex(&to_task_id);
                dag.connect(&to_task_id, ROOT_NODE_NAME)?;
            }
        }

        Ok(dag)
    }
}

/// Index the explicit edge list as `to -> [from...]`, preserving the order
/// in which edges were declared.
fn explicit_edge_index(package_task_deps: &[(String, String)]) -> BTreeMap<&str, Vec<&str>> {
    let mut index: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (from, to) in package_task_deps {
        index.entry(to.as_str()).or_default().push(from.as_str());
    }
    index
}
