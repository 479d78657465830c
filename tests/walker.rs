use std::collections::HashMap;
use std::error::Error;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::time::{Duration, Instant};

use taskdag::{
    ExecutionOptions, Scheduler, SchedulerError, TaskDefinition, Visitor, WalkOptions,
    WorkspaceGraph, ROOT_NODE_NAME,
};

mod common;

type TestResult = Result<(), Box<dyn Error>>;

/// Visitor that records (enter, exit) instants per task.
#[derive(Default)]
struct Recorder {
    visits: Mutex<Vec<(String, Instant, Instant)>>,
}

impl Recorder {
    fn visits(&self) -> Vec<(String, Instant, Instant)> {
        self.visits.lock().expect("recorder lock").clone()
    }
}

fn recording_visitor(recorder: &Arc<Recorder>, delay: Duration) -> Visitor {
    let recorder = Arc::clone(recorder);
    Arc::new(move |task| {
        let enter = Instant::now();
        std::thread::sleep(delay);
        let exit = Instant::now();
        recorder
            .visits
            .lock()
            .expect("recorder lock")
            .push((task.to_string(), enter, exit));
        Ok(())
    })
}

fn fan_in_scheduler() -> Result<Scheduler, SchedulerError> {
    let mut workspace = WorkspaceGraph::new();
    workspace.add_dependency("app", "lib1")?;
    workspace.add_dependency("app", "lib2")?;

    let mut scheduler = Scheduler::new(workspace);
    scheduler
        .add_task(TaskDefinition::new("build").dep("compile").topo_dep("build"))
        .add_task(TaskDefinition::new("compile"));

    scheduler.prepare(&ExecutionOptions {
        packages: vec!["app".into(), "lib1".into(), "lib2".into()],
        task_names: vec!["build".into()],
        tasks_only: false,
    })?;
    Ok(scheduler)
}

/// Scheduler over `n` independent packages, each with a dep-free `build`.
fn wide_scheduler(n: usize) -> Result<Scheduler, SchedulerError> {
    let mut workspace = WorkspaceGraph::new();
    let packages: Vec<String> = (0..n).map(|i| format!("pkg{i}")).collect();
    for pkg in &packages {
        workspace.add_package(pkg);
    }

    let mut scheduler = Scheduler::new(workspace);
    scheduler.add_task(TaskDefinition::new("build"));

    scheduler.prepare(&ExecutionOptions {
        packages,
        task_names: vec!["build".into()],
        tasks_only: false,
    })?;
    Ok(scheduler)
}

#[tokio::test(flavor = "multi_thread")]
async fn walk_respects_edge_ordering_and_visits_each_vertex_once() -> TestResult {
    common::init_tracing();

    let scheduler = fan_in_scheduler()?;
    let recorder = Arc::new(Recorder::default());

    let errors = scheduler
        .execute(
            recording_visitor(&recorder, Duration::from_millis(5)),
            &WalkOptions::default(),
        )
        .await;
    assert!(errors.is_empty(), "unexpected errors: {errors:?}");

    let visits = recorder.visits();
    let dag = scheduler.task_dag().ok_or("no task dag")?;

    // Exactly one visit per non-root vertex.
    assert_eq!(visits.len(), dag.vertex_count() - 1);
    let mut seen: Vec<&str> = visits.iter().map(|(name, _, _)| name.as_str()).collect();
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen.len(), visits.len());

    // The synthetic root never reaches the visitor.
    assert!(visits.iter().all(|(name, _, _)| name != ROOT_NODE_NAME));

    // For every edge A -> B, B exits before A enters.
    let times: HashMap<&str, (Instant, Instant)> = visits
        .iter()
        .map(|(name, enter, exit)| (name.as_str(), (*enter, *exit)))
        .collect();
    for (from, to) in dag.edges() {
        if from == ROOT_NODE_NAME || to == ROOT_NODE_NAME {
            continue;
        }
        let (from_enter, _) = times.get(from).ok_or("missing visit for edge source")?;
        let (_, to_exit) = times.get(to).ok_or("missing visit for edge target")?;
        assert!(
            to_exit <= from_enter,
            "{to} must complete before {from} starts"
        );
    }

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn bounded_walk_never_exceeds_the_concurrency_ceiling() -> TestResult {
    common::init_tracing();

    let scheduler = wide_scheduler(6)?;

    let in_flight = Arc::new(AtomicUsize::new(0));
    let max_in_flight = Arc::new(AtomicUsize::new(0));
    let visitor: Visitor = {
        let in_flight = Arc::clone(&in_flight);
        let max_in_flight = Arc::clone(&max_in_flight);
        Arc::new(move |_task| {
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            max_in_flight.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(30));
            in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        })
    };

    let errors = scheduler
        .execute(
            visitor,
            &WalkOptions {
                parallel: false,
                concurrency: 2,
            },
        )
        .await;
    assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    assert!(
        max_in_flight.load(Ordering::SeqCst) <= 2,
        "ceiling exceeded: {}",
        max_in_flight.load(Ordering::SeqCst)
    );

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn parallel_walk_is_not_gated_by_the_concurrency_option() -> TestResult {
    common::init_tracing();

    let scheduler = wide_scheduler(6)?;

    // All six visitors must be in flight simultaneously to pass the
    // barrier; any gating would deadlock here.
    let barrier = Arc::new(Barrier::new(6));
    let visitor: Visitor = {
        let barrier = Arc::clone(&barrier);
        Arc::new(move |_task| {
            barrier.wait();
            Ok(())
        })
    };

    let errors = scheduler
        .execute(
            visitor,
            &WalkOptions {
                parallel: true,
                concurrency: 1,
            },
        )
        .await;
    assert!(errors.is_empty(), "unexpected errors: {errors:?}");

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn visitor_failure_suppresses_dependents_but_not_siblings() -> TestResult {
    common::init_tracing();

    let mut workspace = WorkspaceGraph::new();
    workspace.add_package("p");
    workspace.add_package("q");

    let mut scheduler = Scheduler::new(workspace);
    scheduler
        .add_task(TaskDefinition::new("c").dep("b"))
        .add_task(TaskDefinition::new("b").dep("a"))
        .add_task(TaskDefinition::new("a"))
        .add_task(TaskDefinition::new("other"));

    scheduler.prepare(&ExecutionOptions {
        packages: vec!["p".into(), "q".into()],
        task_names: vec!["c".into(), "other".into()],
        tasks_only: false,
    })?;

    let visited = Arc::new(Mutex::new(Vec::<String>::new()));
    let visitor: Visitor = {
        let visited = Arc::clone(&visited);
        Arc::new(move |task| {
            visited.lock().expect("visited lock").push(task.to_string());
            if task == "p#b" {
                anyhow::bail!("b broke");
            }
            Ok(())
        })
    };

    let errors = scheduler.execute(visitor, &WalkOptions::default()).await;

    assert_eq!(errors.len(), 1);
    assert!(matches!(
        &errors[0],
        SchedulerError::VisitorFailed { task, .. } if task == "p#b"
    ));

    let visited = visited.lock().expect("visited lock").clone();
    assert!(visited.contains(&"p#a".to_string()));
    assert!(visited.contains(&"p#b".to_string()));
    // c depends on the failed b and must never be dispatched.
    assert!(!visited.contains(&"p#c".to_string()));
    // Unrelated work in both packages still drains.
    assert!(visited.contains(&"p#other".to_string()));
    assert!(visited.contains(&"q#other".to_string()));

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn zero_concurrency_is_an_invalid_config() -> TestResult {
    common::init_tracing();

    let scheduler = wide_scheduler(2)?;
    let visitor: Visitor = Arc::new(|_task| Ok(()));

    let errors = scheduler
        .execute(
            visitor,
            &WalkOptions {
                parallel: false,
                concurrency: 0,
            },
        )
        .await;

    assert_eq!(errors.len(), 1);
    assert!(matches!(&errors[0], SchedulerError::InvalidConfig(_)));

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn execute_before_prepare_is_an_invalid_config() -> TestResult {
    common::init_tracing();

    let scheduler = Scheduler::new(WorkspaceGraph::new());
    let visitor: Visitor = Arc::new(|_task| Ok(()));

    let errors = scheduler.execute(visitor, &WalkOptions::default()).await;

    assert_eq!(errors.len(), 1);
    assert!(matches!(&errors[0], SchedulerError::InvalidConfig(_)));

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn execute_can_be_repeated_on_the_same_prepared_graph() -> TestResult {
    common::init_tracing();

    let scheduler = fan_in_scheduler()?;

    for _ in 0..2 {
        let recorder = Arc::new(Recorder::default());
        let errors = scheduler
            .execute(recording_visitor(&recorder, Duration::ZERO), &WalkOptions::default())
            .await;
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");

        let dag = scheduler.task_dag().ok_or("no task dag")?;
        assert_eq!(recorder.visits().len(), dag.vertex_count() - 1);
    }

    Ok(())
}
