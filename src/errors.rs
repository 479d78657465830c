// src/errors.rs

//! Crate-wide error type and `Result` alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchedulerError {
    /// `add_dep` referenced a package that is neither the synthetic root
    /// nor a vertex of the workspace graph.
    #[error("found reference to unknown package: {package} in task {task_id}")]
    UnknownPackage { package: String, task_id: String },

    /// The given task has not been registered under either its qualified
    /// identifier or its bare name.
    #[error("the given task has not been registered: {0}")]
    NoSuchTask(String),

    /// Adding an edge would close a cycle, or a walk stalled on a malformed
    /// graph.
    #[error("cycle detected in task graph: {0}")]
    CycleDetected(String),

    /// An out-of-range or inconsistent option was supplied.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The visitor returned an error for a package-task. Dependents of the
    /// failed vertex are never dispatched.
    #[error("task {task} failed")]
    VisitorFailed {
        task: String,
        #[source]
        source: anyhow::Error,
    },

    /// A pipeline configuration file failed semantic validation.
    #[error("pipeline config error: {0}")]
    PipelineConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
