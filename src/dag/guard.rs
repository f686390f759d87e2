// src/dag/guard.rs

//! Pre-write check for dependency edits.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, warn};

use crate::dag::cycles::detect_cycles;
use crate::dag::graph::DependencyGraph;
use crate::dag::task::Task;
use crate::types::TaskId;

/// Outcome of [`validate_no_cycles`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleValidation {
    pub valid: bool,
    /// The cyclic task set of the hypothetical graph. Despite the name this
    /// is an unordered set, not a walk along one cycle.
    pub cycle_path: Option<BTreeSet<TaskId>>,
}

impl CycleValidation {
    fn ok() -> Self {
        Self {
            valid: true,
            cycle_path: None,
        }
    }
}

/// Would replacing `task_id`'s dependencies with `proposed` create a cycle?
///
/// The check runs against the given snapshot only; the caller must persist
/// against the same snapshot (transaction or per-task lock) for the answer
/// to stay true. If `task_id` is not in `tasks` the snapshot is checked
/// unchanged.
pub fn validate_no_cycles(task_id: &str, proposed: &[TaskId], tasks: &[Task]) -> CycleValidation {
    let hypothetical: Vec<Task> = tasks
        .iter()
        .map(|t| {
            if t.id == task_id {
                Task {
                    dependencies: proposed.to_vec(),
                    ..t.clone()
                }
            } else {
                t.clone()
            }
        })
        .collect();

    let graph = DependencyGraph::build(&hypothetical);
    let cyclic = detect_cycles(&graph);

    if cyclic.is_empty() {
        debug!(task = %task_id, proposed = ?proposed, "dependency edit keeps graph acyclic");
        CycleValidation::ok()
    } else {
        warn!(task = %task_id, proposed = ?proposed, cyclic = ?cyclic, "dependency edit would create a cycle");
        CycleValidation {
            valid: false,
            cycle_path: Some(cyclic),
        }
    }
}
