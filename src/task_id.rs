// src/task_id.rs

//! Package-task identifier utilities.
//!
//! A package-task is written `<package>#<task>`, e.g. `web#build`. The `#`
//! is the only reserved character; package and task segments are otherwise
//! opaque. Task names without a `#` are *bare* and apply to whichever
//! package they are instantiated in.

/// Name of the monorepo root package.
///
/// Tasks registered as `//#<task>` are root tasks and are gated by the
/// scheduler's root-enabled set.
pub const ROOT_PKG_NAME: &str = "//";

/// Name of the synthetic root vertex of the task graph.
///
/// Every package-task without prerequisites is connected to this vertex so
/// the graph has a single terminal. It contains no `#` and therefore cannot
/// collide with a package-task identifier.
pub const ROOT_NODE_NAME: &str = "___ROOT___";

/// Separator between the package and task segments of an identifier.
pub const TASK_DELIMITER: char = '#';

/// Build the package-task identifier for `task` in `pkg`.
///
/// If `task` is already package-qualified it is returned unchanged, so that
/// root tasks like `//#deploy` keep their package when instantiated across
/// a scope.
pub fn task_id(pkg: &str, task: &str) -> String {
    if is_package_task(task) {
        return task.to_string();
    }
    format!("{pkg}{TASK_DELIMITER}{task}")
}

/// Split a package-task identifier into `(package, task)`.
///
/// An input without a `#` is treated as a task of the root package.
pub fn package_task_from_id(id: &str) -> (&str, &str) {
    match id.split_once(TASK_DELIMITER) {
        Some((pkg, task)) => (pkg, task),
        None => (ROOT_PKG_NAME, id),
    }
}

/// Whether `name` is a package-qualified task identifier.
pub fn is_package_task(name: &str) -> bool {
    name.contains(TASK_DELIMITER)
}
