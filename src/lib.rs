// src/lib.rs

//! Core of a monorepo task scheduler.
//!
//! Given a DAG of workspace packages, a registry of task definitions, and
//! an execution scope, the scheduler materializes a DAG of concrete
//! package-tasks (`pkg#task`) and walks it with bounded concurrency,
//! invoking a visitor exactly once per package-task in topological order.
//!
//! ```no_run
//! use std::sync::Arc;
//! use taskdag::{ExecutionOptions, Scheduler, TaskDefinition, WalkOptions, WorkspaceGraph};
//!
//! # async fn demo() -> taskdag::Result<()> {
//! let mut workspace = WorkspaceGraph::new();
//! workspace.add_dependency("app", "lib")?;
//!
//! let mut scheduler = Scheduler::new(workspace);
//! scheduler
//!     .add_task(TaskDefinition::new("build").dep("compile").topo_dep("build"))
//!     .add_task(TaskDefinition::new("compile"));
//!
//! scheduler.prepare(&ExecutionOptions {
//!     packages: vec!["app".into(), "lib".into()],
//!     task_names: vec!["build".into()],
//!     tasks_only: false,
//! })?;
//!
//! let errors = scheduler
//!     .execute(
//!         Arc::new(|task| {
//!             println!("running {task}");
//!             Ok(())
//!         }),
//!         &WalkOptions::default(),
//!     )
//!     .await;
//! assert!(errors.is_empty());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dag;
pub mod errors;
pub mod logging;
pub mod registry;
pub mod scheduler;
pub mod task_id;
pub mod workspace;

pub use dag::{TaskDag, Visitor, WalkOptions};
pub use errors::{Result, SchedulerError};
pub use registry::{TaskDefinition, TaskRegistry};
pub use scheduler::{ExecutionOptions, Scheduler};
pub use task_id::{ROOT_NODE_NAME, ROOT_PKG_NAME};
pub use workspace::WorkspaceGraph;
