// src/config/mod.rs

//! Pipeline configuration: a TOML surface for populating a scheduler's
//! task registry.
//!
//! - [`model`] is the serde mapping of the file.
//! - [`loader`] reads, validates and applies it to a [`crate::Scheduler`].
//! - [`validate`] holds the semantic checks.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{apply, load_and_validate, load_from_path};
pub use model::{PipelineFile, TaskEntry};
pub use validate::validate_pipeline;
