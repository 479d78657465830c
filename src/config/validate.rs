// src/config/validate.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::PipelineFile;
use crate::errors::{Result, SchedulerError};
use crate::task_id::{is_package_task, package_task_from_id, TASK_DELIMITER};

/// Run semantic validation against a loaded pipeline file.
///
/// This checks:
/// - there is at least one task
/// - task names are well-formed (at most one `#`, never first or last)
/// - dep names are bare and non-empty
/// - no task depends on itself
/// - bare task definitions contain no dep cycle among themselves
///
/// Deps that name tasks absent from the file are intentionally allowed:
/// the scheduler treats unregistered tasks as leaves.
pub fn validate_pipeline(file: &PipelineFile) -> Result<()> {
    ensure_has_tasks(file)?;
    validate_names(file)?;
    validate_bare_dep_dag(file)?;
    Ok(())
}

fn ensure_has_tasks(file: &PipelineFile) -> Result<()> {
    if file.task.is_empty() {
        return Err(SchedulerError::PipelineConfig(
            "pipeline must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_names(file: &PipelineFile) -> Result<()> {
    for (name, entry) in file.task.iter() {
        if name.is_empty() {
            return Err(SchedulerError::PipelineConfig(
                "task names must be non-empty".to_string(),
            ));
        }
        if is_package_task(name) {
            let (pkg, task) = package_task_from_id(name);
            if pkg.is_empty() || task.is_empty() || task.contains(TASK_DELIMITER) {
                return Err(SchedulerError::PipelineConfig(format!(
                    "malformed package-task name '{name}': expected <package>#<task>"
                )));
            }
        }

        for dep in entry.deps.iter().chain(entry.topo_deps.iter()) {
            if dep.is_empty() {
                return Err(SchedulerError::PipelineConfig(format!(
                    "task '{name}' has an empty dep name"
                )));
            }
            if is_package_task(dep) {
                return Err(SchedulerError::PipelineConfig(format!(
                    "task '{name}' dep '{dep}' must be a bare task name"
                )));
            }
        }

        let bare = bare_name(name);
        if entry.deps.iter().any(|dep| dep == bare) {
            return Err(SchedulerError::PipelineConfig(format!(
                "task '{name}' cannot depend on itself in `deps`"
            )));
        }
    }
    Ok(())
}

/// Reject dep cycles among bare task definitions.
///
/// Bare definitions apply to every package, so a cycle between them is
/// guaranteed to surface as `CycleDetected` the moment any of them is in
/// scope. Qualified definitions are left out: their deps resolve per
/// package and only the expansion itself can tell whether they meet.
fn validate_bare_dep_dag(file: &PipelineFile) -> Result<()> {
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for (name, entry) in file.task.iter() {
        if is_package_task(name) {
            continue;
        }
        graph.add_node(name.as_str());
        for dep in entry.deps.iter() {
            if file.task.contains_key(dep) && !is_package_task(dep) {
                graph.add_edge(dep.as_str(), name.as_str(), ());
            }
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(SchedulerError::PipelineConfig(format!(
            "dep cycle in pipeline involving task '{}'",
            cycle.node_id()
        ))),
    }
}

fn bare_name(name: &str) -> &str {
    package_task_from_id(name).1
}
