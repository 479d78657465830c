// src/dag/mod.rs

//! Package-task graph construction and traversal.
//!
//! - [`graph`] holds the concrete DAG of package-task identifiers.
//! - [`builder`] expands task definitions into that DAG and attaches the
//!   synthetic root.
//! - [`walker`] walks the DAG concurrently in topological order.

pub mod builder;
pub mod graph;
pub mod walker;

pub use graph::TaskDag;
pub use walker::{Visitor, WalkOptions};
