// src/dag/cycles.rs

//! Cycle detection over a [`DependencyGraph`].
//!
//! [`detect_cycles`] answers "which tasks are unsafe to schedule". It walks
//! dependency edges depth-first and flags the tasks on every cycle it runs
//! into, without trying to separate cycles from each other.
//!
//! [`cycle_components`] answers "which distinct cycles are there" by
//! computing strongly connected components with `petgraph`.

use std::collections::{BTreeSet, HashSet};

use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;
use serde::Serialize;
use tracing::debug;

use crate::dag::graph::DependencyGraph;
use crate::types::TaskId;

/// Return every task that lies on a cycle found by a depth-first walk.
///
/// Every task is used as a DFS root at most once, so disconnected components
/// are all covered and the walk always terminates. When an edge leads back
/// to a task that is still on the current path, the whole path segment from
/// that task to the current one is flagged (both endpoints of the back edge
/// included). Dangling dependency ids are never followed.
///
/// An explicit stack replaces recursion so that long dependency chains
/// cannot overflow the call stack.
pub fn detect_cycles(graph: &DependencyGraph) -> BTreeSet<TaskId> {
    let mut cyclic: BTreeSet<TaskId> = BTreeSet::new();
    let mut visited: HashSet<&str> = HashSet::with_capacity(graph.len());
    let mut on_path: HashSet<&str> = HashSet::new();

    for root in graph.task_ids() {
        if !visited.insert(root) {
            continue;
        }
        on_path.insert(root);

        // Each frame is (task, index of the next dependency edge to follow).
        let mut path: Vec<(&str, usize)> = vec![(root, 0)];

        while let Some(frame) = path.last_mut() {
            let node = frame.0;
            let deps = graph.dependencies_of(node);

            let Some(dep) = deps.get(frame.1) else {
                on_path.remove(node);
                path.pop();
                continue;
            };
            frame.1 += 1;
            let dep = dep.as_str();

            if !graph.contains(dep) {
                continue;
            }

            if on_path.contains(dep) {
                let start = path
                    .iter()
                    .rposition(|(id, _)| *id == dep)
                    .unwrap_or(0);
                debug!(task = %node, dep = %dep, "back edge closes a dependency cycle");
                cyclic.extend(path[start..].iter().map(|(id, _)| id.to_string()));
                cyclic.insert(dep.to_string());
            } else if visited.insert(dep) {
                on_path.insert(dep);
                path.push((dep, 0));
            }
        }
    }

    cyclic
}

/// Strongly connected components that contain a cycle.
///
/// A component qualifies when it has more than one task, or a single task
/// that lists itself as a dependency. Ids inside a component are sorted and
/// components are ordered by their first id.
pub fn cycle_components(graph: &DependencyGraph) -> Vec<Vec<TaskId>> {
    let mut g: DiGraphMap<&str, ()> = DiGraphMap::with_capacity(graph.len(), graph.len());

    for id in graph.task_ids() {
        g.add_node(id);
    }
    for id in graph.task_ids() {
        for dep in graph.present_dependencies_of(id) {
            g.add_edge(id, dep, ());
        }
    }

    let mut components: Vec<Vec<TaskId>> = tarjan_scc(&g)
        .into_iter()
        .filter(|scc| scc.len() > 1 || g.contains_edge(scc[0], scc[0]))
        .map(|scc| {
            let mut ids: Vec<TaskId> = scc.into_iter().map(str::to_string).collect();
            ids.sort();
            ids
        })
        .collect();

    components.sort();
    components
}

/// Combined view used by diagnostics: the flag set plus the distinct cycles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub cyclic_tasks: BTreeSet<TaskId>,
    pub components: Vec<Vec<TaskId>>,
}

impl CycleReport {
    pub fn analyze(graph: &DependencyGraph) -> Self {
        Self {
            cyclic_tasks: detect_cycles(graph),
            components: cycle_components(graph),
        }
    }

    pub fn has_cycles(&self) -> bool {
        !self.cyclic_tasks.is_empty()
    }
}
