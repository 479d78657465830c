use std::collections::HashSet;

use proptest::prelude::*;

use taskdag::{
    ExecutionOptions, Scheduler, TaskDefinition, WorkspaceGraph, ROOT_NODE_NAME,
};

mod common;

/// Strategy for a layered, acyclic set of task definitions: `task_N` may
/// only depend on `task_0 .. task_{N-1}`, so any generated registry is
/// expandable without cycles.
fn layered_tasks_strategy(max_tasks: usize) -> impl Strategy<Value = Vec<TaskDefinition>> {
    (1..=max_tasks).prop_flat_map(|num_tasks| {
        proptest::collection::vec(
            proptest::collection::vec(any::<usize>(), 0..num_tasks),
            num_tasks,
        )
        .prop_map(move |raw_deps| {
            raw_deps
                .into_iter()
                .enumerate()
                .map(|(i, potential_deps)| {
                    let mut def = TaskDefinition::new(&format!("task_{i}"));

                    // Sanitize dependencies: only allow deps < i.
                    let mut valid_deps = HashSet::new();
                    for dep_idx in potential_deps {
                        if i > 0 {
                            valid_deps.insert(dep_idx % i);
                        }
                    }
                    for dep_idx in valid_deps {
                        def = def.dep(&format!("task_{dep_idx}"));
                    }
                    def
                })
                .collect::<Vec<TaskDefinition>>()
        })
    })
}

fn prepared_scheduler(defs: &[TaskDefinition]) -> Scheduler {
    let mut workspace = WorkspaceGraph::new();
    workspace.add_package("pkg");

    let mut scheduler = Scheduler::new(workspace);
    for def in defs {
        scheduler.add_task(def.clone());
    }

    scheduler
        .prepare(&ExecutionOptions {
            packages: vec!["pkg".into()],
            task_names: vec![],
            tasks_only: false,
        })
        .expect("layered registries are acyclic");
    scheduler
}

proptest! {
    #[test]
    fn expansion_of_layered_registries_never_cycles(defs in layered_tasks_strategy(10)) {
        common::init_tracing();

        let scheduler = prepared_scheduler(&defs);
        let dag = scheduler.task_dag().expect("prepared");

        // Every registered task is in scope, instantiated in `pkg`.
        for def in &defs {
            let vertex_id = format!("pkg#{}", def.name);
            prop_assert!(dag.has_vertex(&vertex_id));
        }
    }

    #[test]
    fn every_vertex_is_anchored(defs in layered_tasks_strategy(10)) {
        common::init_tracing();

        let scheduler = prepared_scheduler(&defs);
        let dag = scheduler.task_dag().expect("prepared");

        // All tasks here are registered, so every non-root vertex either
        // has real dependencies or an edge to the synthetic root.
        for vertex in dag.vertices() {
            if vertex == ROOT_NODE_NAME {
                continue;
            }
            prop_assert!(
                dag.dependencies_of(vertex).count() >= 1,
                "vertex {} has no anchor",
                vertex
            );
        }

        // The root itself depends on nothing.
        prop_assert_eq!(dag.dependencies_of(ROOT_NODE_NAME).count(), 0);
    }

    #[test]
    fn expansion_is_deterministic(defs in layered_tasks_strategy(10)) {
        common::init_tracing();

        let first = prepared_scheduler(&defs);
        let second = prepared_scheduler(&defs);

        let first_dag = first.task_dag().expect("prepared");
        let second_dag = second.task_dag().expect("prepared");

        let first_edges: Vec<_> = first_dag.edges().collect();
        let second_edges: Vec<_> = second_dag.edges().collect();
        prop_assert_eq!(first_edges, second_edges);

        let first_vertices: Vec<_> = first_dag.vertices().collect();
        let second_vertices: Vec<_> = second_dag.vertices().collect();
        prop_assert_eq!(first_vertices, second_vertices);
    }
}
