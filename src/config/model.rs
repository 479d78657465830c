// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

/// Top-level pipeline configuration as read from a TOML file.
///
/// ```toml
/// [task.build]
/// deps = ["compile"]
/// topo_deps = ["build"]
///
/// [task."//#deploy"]
/// deps = ["build"]
/// ```
///
/// Keys of `[task.<name>]` are task names, bare or package-qualified;
/// qualified names under the root package (`//#<task>`) become
/// root-enabled when applied to a scheduler.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PipelineFile {
    /// All tasks from `[task.<name>]`, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<String, TaskEntry>,
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TaskEntry {
    /// Prerequisite tasks in the same package.
    #[serde(default)]
    pub deps: Vec<String>,

    /// Prerequisite tasks instantiated in every upstream package.
    #[serde(default)]
    pub topo_deps: Vec<String>,
}
