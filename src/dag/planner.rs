// src/dag/planner.rs

//! Layered topological planning.
//!
//! A plan is a list of batches. Every task in a batch only depends on tasks
//! from earlier batches, so a batch may be dispatched concurrently, but batch
//! `N + 1` must not start before every task of batch `N` has completed.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use tracing::{debug, error, info};

use crate::dag::cycles::detect_cycles;
use crate::dag::graph::DependencyGraph;
use crate::dag::task::Task;
use crate::types::TaskId;

/// Result of [`plan_execution`].
///
/// When `has_cycles` is set no valid order exists: `batches` is empty and
/// `cyclic_tasks` names the offending tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionPlan {
    pub batches: Vec<Vec<TaskId>>,
    pub total_tasks: usize,
    pub has_cycles: bool,
    pub cyclic_tasks: BTreeSet<TaskId>,
}

impl ExecutionPlan {
    /// Plan over an already built graph.
    pub fn from_graph(graph: &DependencyGraph, total_tasks: usize) -> Self {
        let cyclic_tasks = detect_cycles(graph);
        if !cyclic_tasks.is_empty() {
            info!(
                cyclic = cyclic_tasks.len(),
                "dependency cycle found; no execution order exists"
            );
            return Self {
                batches: Vec::new(),
                total_tasks,
                has_cycles: true,
                cyclic_tasks,
            };
        }

        Self {
            batches: layer(graph),
            total_tasks,
            has_cycles: false,
            cyclic_tasks,
        }
    }

    /// `true` if the plan describes a usable order.
    pub fn is_valid(&self) -> bool {
        !self.has_cycles
    }

    /// Zero-based index of the batch containing `id`.
    pub fn batch_of(&self, id: &str) -> Option<usize> {
        self.batches
            .iter()
            .position(|batch| batch.iter().any(|t| t == id))
    }

    /// All scheduled ids, batch by batch.
    pub fn scheduled(&self) -> impl Iterator<Item = &str> {
        self.batches.iter().flatten().map(|s| s.as_str())
    }
}

/// Build the graph for `tasks`, check it for cycles and, if there are none,
/// split it into batches of mutually independent tasks.
pub fn plan_execution(tasks: &[Task]) -> ExecutionPlan {
    let graph = DependencyGraph::build(tasks);
    ExecutionPlan::from_graph(&graph, tasks.len())
}

/// Kahn's algorithm, one layer per iteration. Assumes an acyclic graph.
fn layer(graph: &DependencyGraph) -> Vec<Vec<TaskId>> {
    // Only dependencies present in the snapshot can ever be pending.
    let mut in_degree: HashMap<&str, usize> = graph
        .task_ids()
        .map(|id| (id, graph.present_dependencies_of(id).count()))
        .collect();

    let mut unscheduled: Vec<&str> = graph.task_ids().collect();
    let mut batches: Vec<Vec<TaskId>> = Vec::new();

    while !unscheduled.is_empty() {
        let (ready, blocked): (Vec<&str>, Vec<&str>) = unscheduled
            .iter()
            .partition(|id| in_degree.get(*id).copied().unwrap_or(0) == 0);

        if ready.is_empty() {
            error!(
                remaining = blocked.len(),
                "planner made no progress on an acyclic graph; stopping"
            );
            break;
        }

        for id in &ready {
            for dependent in graph.dependents_of(id) {
                if let Some(d) = in_degree.get_mut(dependent.as_str()) {
                    *d = d.saturating_sub(1);
                }
            }
        }

        debug!(batch = batches.len(), size = ready.len(), "planned batch");
        batches.push(ready.into_iter().map(str::to_string).collect());
        unscheduled = blocked;
    }

    batches
}
