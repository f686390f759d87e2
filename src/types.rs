// src/types.rs

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Canonical task identifier type used throughout the engine.
pub type TaskId = String;

/// Lifecycle state of a task.
///
/// The variants are ordered: `Todo` is the initial ("not started") state and
/// the later variants move towards completion.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    InReview,
    Done,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::InReview => "in_review",
            TaskStatus::Done => "done",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    /// Whether this is the initial lifecycle state.
    pub fn is_not_started(self) -> bool {
        self == TaskStatus::Todo
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "todo" => Ok(TaskStatus::Todo),
            "in_progress" | "inprogress" => Ok(TaskStatus::InProgress),
            "in_review" | "inreview" => Ok(TaskStatus::InReview),
            "done" => Ok(TaskStatus::Done),
            "cancelled" | "canceled" => Ok(TaskStatus::Cancelled),
            other => Err(format!(
                "invalid task status: {other} (expected todo, in_progress, in_review, done or cancelled)"
            )),
        }
    }
}

/// The family of statuses that count as "completed" for dependency
/// satisfaction and dispatch.
///
/// Defaults to `done` and `cancelled`: a cancelled dependency will never
/// reach `done`, so it must not hold its dependents back forever.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionPolicy {
    statuses: BTreeSet<TaskStatus>,
}

impl CompletionPolicy {
    pub fn new(statuses: impl IntoIterator<Item = TaskStatus>) -> Self {
        Self {
            statuses: statuses.into_iter().collect(),
        }
    }

    pub fn is_completed(&self, status: TaskStatus) -> bool {
        self.statuses.contains(&status)
    }

    pub fn statuses(&self) -> impl Iterator<Item = TaskStatus> + '_ {
        self.statuses.iter().copied()
    }
}

impl Default for CompletionPolicy {
    fn default() -> Self {
        Self::new([TaskStatus::Done, TaskStatus::Cancelled])
    }
}
