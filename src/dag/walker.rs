// src/dag/walker.rs

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info, warn};

use crate::dag::graph::TaskDag;
use crate::errors::SchedulerError;
use crate::task_id::ROOT_NODE_NAME;

/// Callback invoked once per package-task, in topological order.
///
/// The walker does not interpret the error beyond using it to suppress
/// dispatch of the vertex's dependents. The visitor is called from the
/// blocking thread pool and may block arbitrarily.
pub type Visitor = Arc<dyn Fn(&str) -> anyhow::Result<()> + Send + Sync>;

/// Options for a single walk of the task graph.
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Run at full width, ignoring `concurrency`.
    pub parallel: bool,
    /// Maximum number of visitor calls in flight when not parallel.
    /// Must be at least 1.
    pub concurrency: usize,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            parallel: false,
            concurrency: 10,
        }
    }
}

/// Walk the task DAG, invoking `visitor` once per non-root vertex.
///
/// Kahn-style traversal: vertices whose dependencies have all completed are
/// dispatched as tokio tasks; each reports back over an mpsc channel. A
/// failed vertex keeps its dependents undispatched but does not cancel
/// siblings. Returns the aggregated errors once all in-flight work drains.
pub(crate) async fn walk(dag: &TaskDag, visitor: Visitor, opts: &WalkOptions) -> Vec<SchedulerError> {
    if opts.concurrency < 1 {
        return vec![SchedulerError::InvalidConfig(format!(
            "concurrency must be >= 1 (got {})",
            opts.concurrency
        ))];
    }

    let total = dag.vertex_count();
    if total == 0 {
        return Vec::new();
    }

    let mut remaining: BTreeMap<&str, usize> = dag
        .vertices()
        .map(|v| (v, dag.dependencies_of(v).count()))
        .collect();

    // Initial frontier: vertices with no dependencies, in lexicographic
    // order. The synthetic root is usually among them.
    let mut ready: VecDeque<&str> = remaining
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(vertex, _)| *vertex)
        .collect();

    let semaphore = Arc::new(Semaphore::new(opts.concurrency));
    let (tx, mut rx) = mpsc::channel::<(String, anyhow::Result<()>)>(total.max(64));

    let mut errors: Vec<SchedulerError> = Vec::new();
    let mut in_flight = 0usize;
    let mut completed = 0usize;

    loop {
        while let Some(vertex) = ready.pop_front() {
            if vertex == ROOT_NODE_NAME {
                // The synthetic root completes immediately and never
                // reaches the visitor.
                completed += 1;
                release_dependents(dag, vertex, &mut remaining, &mut ready);
                continue;
            }

            debug!(task = %vertex, "dispatching package task");
            in_flight += 1;
            dispatch(
                vertex.to_string(),
                visitor.clone(),
                semaphore.clone(),
                opts.parallel,
                tx.clone(),
            );
        }

        if in_flight == 0 {
            break;
        }

        match rx.recv().await {
            Some((vertex, Ok(()))) => {
                in_flight -= 1;
                completed += 1;
                release_dependents(dag, &vertex, &mut remaining, &mut ready);
            }
            Some((vertex, Err(err))) => {
                in_flight -= 1;
                warn!(task = %vertex, "task failed; its dependents will not be dispatched");
                errors.push(SchedulerError::VisitorFailed {
                    task: vertex,
                    source: err,
                });
            }
            // Unreachable while we hold a sender, but don't spin on it.
            None => break,
        }
    }

    if errors.is_empty() && completed < total {
        errors.push(SchedulerError::CycleDetected(format!(
            "walk stalled with {} unvisited vertices",
            total - completed
        )));
    }

    info!(visited = completed, errors = errors.len(), "task graph walk finished");
    errors
}

/// Decrement the remaining-dependency count of each dependent of `vertex`,
/// moving those that reach zero onto the ready queue.
fn release_dependents<'d>(
    dag: &'d TaskDag,
    vertex: &str,
    remaining: &mut BTreeMap<&'d str, usize>,
    ready: &mut VecDeque<&'d str>,
) {
    for dependent in dag.dependents_of(vertex) {
        if let Some(count) = remaining.get_mut(dependent) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                ready.push_back(dependent);
            }
        }
    }
}

/// Run one vertex on the tokio runtime, reporting its outcome over `tx`.
fn dispatch(
    vertex: String,
    visitor: Visitor,
    semaphore: Arc<Semaphore>,
    parallel: bool,
    tx: mpsc::Sender<(String, anyhow::Result<()>)>,
) {
    tokio::spawn(async move {
        let result = run_visitor(&vertex, visitor, semaphore, parallel).await;
        let _ = tx.send((vertex, result)).await;
    });
}

/// Invoke the visitor for one vertex, gated by the semaphore unless the
/// walk is parallel. The permit is held only for the duration of the
/// visitor call.
async fn run_visitor(
    vertex: &str,
    visitor: Visitor,
    semaphore: Arc<Semaphore>,
    parallel: bool,
) -> anyhow::Result<()> {
    let _permit = if !parallel {
        match semaphore.acquire_owned().await {
            Ok(permit) => Some(permit),
            Err(_) => return Err(anyhow::anyhow!("concurrency semaphore closed")),
        }
    } else {
        None
    };

    let name = vertex.to_string();
    // The visitor is opaque and may block on I/O or process spawning; keep
    // it off the async worker threads.
    match tokio::task::spawn_blocking(move || visitor(&name)).await {
        Ok(result) => result,
        Err(join_err) => Err(anyhow::anyhow!("visitor panicked: {join_err}")),
    }
}
