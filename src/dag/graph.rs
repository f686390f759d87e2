// src/dag/graph.rs

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::dag::task::Task;
use crate::types::TaskId;

/// Internal node structure: stores immediate deps and dependents.
#[derive(Debug, Clone, Default)]
struct DagNode {
    /// Declared dependencies, dangling ids included.
    deps: Vec<TaskId>,
    /// Tasks in the snapshot that declare a dependency on this one.
    dependents: Vec<TaskId>,
}

/// Adjacency view over one task snapshot, keyed by task id.
///
/// Built fresh for every query and never mutated afterwards. Dependency ids
/// that do not name a task in the snapshot ("dangling" ids) are kept in the
/// dependency lists but get no node and no reverse edge.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: HashMap<TaskId, DagNode>,
    /// Task ids in input order.
    order: Vec<TaskId>,
    /// Tasks with an empty declared dependency list, in input order.
    roots: Vec<TaskId>,
}

impl DependencyGraph {
    /// Build the graph from a flat task list. Never fails.
    ///
    /// If an id appears more than once only its first occurrence is used.
    pub fn build(tasks: &[Task]) -> Self {
        let mut nodes: HashMap<TaskId, DagNode> = HashMap::with_capacity(tasks.len());
        let mut order = Vec::with_capacity(tasks.len());
        let mut roots = Vec::new();

        // First pass: create nodes with their dependency lists.
        for task in tasks {
            if nodes.contains_key(&task.id) {
                debug!(task = %task.id, "duplicate task id in snapshot; keeping first occurrence");
                continue;
            }
            if task.dependencies.is_empty() {
                roots.push(task.id.clone());
            }
            nodes.insert(
                task.id.clone(),
                DagNode {
                    deps: task.dependencies.clone(),
                    dependents: Vec::new(),
                },
            );
            order.push(task.id.clone());
        }

        // Second pass: populate dependents, in input order of the dependent.
        for task_id in &order {
            let deps = nodes
                .get(task_id)
                .map(|n| n.deps.clone())
                .unwrap_or_default();

            for dep in deps {
                match nodes.get_mut(&dep) {
                    Some(dep_node) => dep_node.dependents.push(task_id.clone()),
                    None => trace!(task = %task_id, dep = %dep, "dangling dependency id"),
                }
            }
        }

        Self {
            nodes,
            order,
            roots,
        }
    }

    /// All task ids, in input order.
    pub fn task_ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Tasks with no declared dependencies, in input order.
    pub fn roots(&self) -> &[TaskId] {
        &self.roots
    }

    /// Declared dependencies of a task (dangling ids included).
    pub fn dependencies_of(&self, id: &str) -> &[TaskId] {
        self.nodes
            .get(id)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Tasks in the snapshot that depend directly on `id`.
    pub fn dependents_of(&self, id: &str) -> &[TaskId] {
        self.nodes
            .get(id)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    /// Declared dependencies of `id` that name a task in the snapshot.
    pub fn present_dependencies_of<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a str> + use<'a> {
        self.dependencies_of(id)
            .iter()
            .filter(move |dep| self.nodes.contains_key(dep.as_str()))
            .map(|s| s.as_str())
    }
}
