// src/dag/queries.rs

//! Read-only completion and readiness predicates over a task snapshot.
//!
//! These are stricter than the planner about dangling dependency ids: the
//! planner ignores an id that names no task, while here it is never
//! satisfied. A task whose only unmet dependency is dangling is therefore
//! scheduled by `run` but never listed by `ready`.

use std::collections::HashSet;

use crate::dag::task::Task;
use crate::types::CompletionPolicy;

/// `true` if every declared dependency of `task` is a task in `tasks` whose
/// status is in the completed family.
///
/// A dependency id that names no task in `tasks` is not satisfied here.
pub fn dependencies_satisfied(task: &Task, tasks: &[Task], policy: &CompletionPolicy) -> bool {
    let completed = completed_ids(tasks, policy);
    task.dependencies
        .iter()
        .all(|dep| completed.contains(dep.as_str()))
}

/// Tasks that have not started yet and whose dependencies are satisfied.
pub fn executable_tasks<'a>(tasks: &'a [Task], policy: &CompletionPolicy) -> Vec<&'a Task> {
    let completed = completed_ids(tasks, policy);
    tasks
        .iter()
        .filter(|t| t.status.is_not_started())
        .filter(|t| {
            t.dependencies
                .iter()
                .all(|dep| completed.contains(dep.as_str()))
        })
        .collect()
}

/// Direct dependencies of `id` that exist in `tasks`.
pub fn dependencies_of<'a>(id: &str, tasks: &'a [Task]) -> Vec<&'a Task> {
    let Some(task) = tasks.iter().find(|t| t.id == id) else {
        return Vec::new();
    };
    tasks
        .iter()
        .filter(|t| task.dependencies.contains(&t.id))
        .collect()
}

/// Tasks that list `id` directly among their dependencies.
pub fn dependents_of<'a>(id: &str, tasks: &'a [Task]) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|t| t.dependencies.iter().any(|d| d == id))
        .collect()
}

fn completed_ids<'a>(tasks: &'a [Task], policy: &CompletionPolicy) -> HashSet<&'a str> {
    tasks
        .iter()
        .filter(|t| policy.is_completed(t.status))
        .map(|t| t.id.as_str())
        .collect()
}
