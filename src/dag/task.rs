// src/dag/task.rs

//! The task snapshot entity consumed by the engine.

use serde::{Deserialize, Serialize};

use crate::types::{TaskId, TaskStatus};

/// A unit of work as seen by the engine.
///
/// The engine only reads tasks; the caller owns them and is responsible for
/// persisting any change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub status: TaskStatus,
    /// Ids of tasks that must reach a completed status first.
    #[serde(default)]
    pub dependencies: Vec<TaskId>,
}

impl Task {
    pub fn new(id: impl Into<TaskId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            status: TaskStatus::default(),
            dependencies: Vec::new(),
        }
    }
}
