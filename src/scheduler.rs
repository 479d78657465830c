// src/scheduler.rs

//! The scheduler facade: registry population, graph preparation, and
//! concurrent execution.

use std::fmt::Write as _;

use tracing::info;

use crate::dag::builder::GraphBuilder;
use crate::dag::walker;
use crate::dag::{TaskDag, Visitor, WalkOptions};
use crate::errors::{Result, SchedulerError};
use crate::registry::{TaskDefinition, TaskRegistry};
use crate::task_id::{package_task_from_id, ROOT_NODE_NAME};
use crate::workspace::WorkspaceGraph;

/// Options for a single scheduler preparation.
#[derive(Debug, Clone, Default)]
pub struct ExecutionOptions {
    /// Packages in the execution scope.
    pub packages: Vec<String>,
    /// Task names in the execution scope. Empty means all registered names.
    pub task_names: Vec<String>,
    /// Restrict dep expansion to the listed task names.
    pub tasks_only: bool,
}

/// Scheduler over a workspace graph.
///
/// Usage is two-phase: populate the registry (`add_task`, `add_dep`), call
/// [`prepare`](Scheduler::prepare) with a scope to build the package-task
/// DAG, then [`execute`](Scheduler::execute) to walk it. `prepare` may be
/// repeated; each call rebuilds the DAG from the registry, which is never
/// mutated.
pub struct Scheduler {
    workspace: WorkspaceGraph,
    registry: TaskRegistry,
    /// Explicit `(from, to)` package-task edges, in declaration order.
    package_task_deps: Vec<(String, String)>,
    task_dag: Option<TaskDag>,
}

impl Scheduler {
    pub fn new(workspace: WorkspaceGraph) -> Self {
        Self {
            workspace,
            registry: TaskRegistry::new(),
            package_task_deps: Vec::new(),
            task_dag: None,
        }
    }

    /// Register a task definition. Registering `//#<task>` also marks
    /// `<task>` as runnable in the root package.
    pub fn add_task(&mut self, def: TaskDefinition) -> &mut Self {
        self.registry.insert(def);
        self
    }

    /// Declare an explicit edge between two concrete package-tasks:
    /// `from` becomes a prerequisite of `to` and completes first.
    ///
    /// `from`'s package must be the root sentinel or a workspace vertex;
    /// `to` is not checked until expansion.
    pub fn add_dep(&mut self, from_task_id: &str, to_task_id: &str) -> Result<()> {
        let (from_pkg, _) = package_task_from_id(from_task_id);
        if from_pkg != ROOT_NODE_NAME && !self.workspace.has_vertex(from_pkg) {
            return Err(SchedulerError::UnknownPackage {
                package: from_pkg.to_string(),
                task_id: from_task_id.to_string(),
            });
        }
        self.package_task_deps
            .push((from_task_id.to_string(), to_task_id.to_string()));
        Ok(())
    }

    /// Resolve a package-task identifier to its package and definition.
    pub fn resolve<'a>(&'a self, task_id: &'a str) -> Result<(&'a str, &'a TaskDefinition)> {
        self.registry.resolve(task_id)
    }

    /// Build the package-task DAG for the given scope and store it.
    pub fn prepare(&mut self, options: &ExecutionOptions) -> Result<()> {
        let task_names = if options.task_names.is_empty() {
            self.registry.names().map(str::to_string).collect()
        } else {
            options.task_names.clone()
        };

        let builder = GraphBuilder {
            workspace: &self.workspace,
            registry: &self.registry,
            package_task_deps: &self.package_task_deps,
        };
        let dag = builder.build(&options.packages, &task_names, options.tasks_only)?;

        info!(
            vertices = dag.vertex_count(),
            edges = dag.edge_count(),
            "prepared task graph"
        );
        self.task_dag = Some(dag);
        Ok(())
    }

    /// Walk the prepared DAG, invoking `visitor` once per package-task.
    ///
    /// Returns the aggregated errors; empty on a fully successful walk.
    pub async fn execute(&self, visitor: Visitor, opts: &WalkOptions) -> Vec<SchedulerError> {
        let Some(dag) = &self.task_dag else {
            return vec![SchedulerError::InvalidConfig(
                "execute called before prepare".to_string(),
            )];
        };
        walker::walk(dag, visitor, opts).await
    }

    /// The DAG built by the last `prepare`, if any.
    pub fn task_dag(&self) -> Option<&TaskDag> {
        self.task_dag.as_ref()
    }

    pub fn workspace(&self) -> &WorkspaceGraph {
        &self.workspace
    }

    /// Human-readable dump of the prepared DAG: one line per vertex with
    /// its direct dependencies, lexicographically ordered.
    pub fn render_summary(&self) -> String {
        let mut out = String::new();
        match &self.task_dag {
            None => out.push_str("task graph not prepared\n"),
            Some(dag) => {
                let _ = writeln!(
                    out,
                    "task graph: {} vertices, {} edges",
                    dag.vertex_count(),
                    dag.edge_count()
                );
                for vertex in dag.vertices() {
                    let deps: Vec<&str> = dag.dependencies_of(vertex).collect();
                    if deps.is_empty() {
                        let _ = writeln!(out, "  {vertex}");
                    } else {
                        let _ = writeln!(out, "  {vertex} -> {}", deps.join(", "));
                    }
                }
            }
        }
        out
    }
}
