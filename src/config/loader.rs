// src/config/loader.rs

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::model::PipelineFile;
use crate::config::validate::validate_pipeline;
use crate::errors::Result;
use crate::registry::TaskDefinition;
use crate::scheduler::Scheduler;

/// Load a pipeline file from a path and return the raw `PipelineFile`.
///
/// This only performs TOML deserialization; use [`load_and_validate`] to
/// also run the semantic checks.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<PipelineFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let file: PipelineFile = toml::from_str(&contents)?;
    Ok(file)
}

/// Load a pipeline file from a path and run semantic validation.
///
/// This is the recommended entry point: it reads TOML, applies serde
/// defaults, and rejects malformed names, self-deps and bare dep cycles.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<PipelineFile> {
    let file = load_from_path(path)?;
    validate_pipeline(&file)?;
    Ok(file)
}

/// Register every task of a pipeline file on the scheduler.
pub fn apply(file: &PipelineFile, scheduler: &mut Scheduler) {
    for (name, entry) in file.task.iter() {
        debug!(task = %name, "registering task from pipeline");
        let mut def = TaskDefinition::new(name);
        for dep in entry.deps.iter() {
            def = def.dep(dep);
        }
        for dep in entry.topo_deps.iter() {
            def = def.topo_dep(dep);
        }
        scheduler.add_task(def);
    }
}
