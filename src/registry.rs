// src/registry.rs

//! Task definitions and the registry that resolves them.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::errors::{Result, SchedulerError};
use crate::task_id::{is_package_task, package_task_from_id, ROOT_PKG_NAME};

/// A task definition, registered once and instantiated per package.
///
/// `name` is either bare (`build`, applies to any package) or
/// package-qualified (`web#build`, applies to that package only).
#[derive(Debug, Clone)]
pub struct TaskDefinition {
    pub name: String,
    /// Prerequisite tasks that must run in the *same* package.
    pub deps: BTreeSet<String>,
    /// Prerequisite tasks instantiated in *each upstream package* of the
    /// workspace graph.
    pub topo_deps: BTreeSet<String>,
}

impl TaskDefinition {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            deps: BTreeSet::new(),
            topo_deps: BTreeSet::new(),
        }
    }

    /// Add a same-package prerequisite.
    pub fn dep(mut self, name: &str) -> Self {
        self.deps.insert(name.to_string());
        self
    }

    /// Add a prerequisite instantiated in every upstream package.
    pub fn topo_dep(mut self, name: &str) -> Self {
        self.topo_deps.insert(name.to_string());
        self
    }
}

/// Registry of task definitions, keyed by bare or qualified name.
///
/// Also tracks which bare task names are permitted to run in the root
/// package: registering `//#<task>` marks `<task>` as root-enabled.
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    tasks: BTreeMap<String, TaskDefinition>,
    root_enabled: BTreeSet<String>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a definition under its name, replacing any previous one.
    pub fn insert(&mut self, def: TaskDefinition) {
        if is_package_task(&def.name) {
            let (pkg, task_name) = package_task_from_id(&def.name);
            if pkg == ROOT_PKG_NAME {
                debug!(task = %task_name, "marking task as root-enabled");
                self.root_enabled.insert(task_name.to_string());
            }
        }
        self.tasks.insert(def.name.clone(), def);
    }

    /// Resolve a package-task identifier to its package and definition.
    ///
    /// Lookup order: the qualified identifier, then the bare task name.
    pub fn resolve<'a>(&'a self, task_id: &'a str) -> Result<(&'a str, &'a TaskDefinition)> {
        let (pkg, task_name) = package_task_from_id(task_id);
        if let Some(def) = self.tasks.get(task_id) {
            return Ok((pkg, def));
        }
        if let Some(def) = self.tasks.get(task_name) {
            return Ok((pkg, def));
        }
        Err(SchedulerError::NoSuchTask(task_id.to_string()))
    }

    /// Whether `task` may be instantiated in the root package.
    pub fn is_root_enabled(&self, task: &str) -> bool {
        self.root_enabled.contains(task)
    }

    /// All registered names (bare and qualified), in lexicographic order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
