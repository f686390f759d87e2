// src/config/model.rs

use std::collections::HashMap;

use serde::Deserialize;

use crate::dag::Task;
use crate::types::{CompletionPolicy, TaskId, TaskStatus};

/// Snapshot file as read from TOML, before validation.
///
/// ```toml
/// [config]
/// completed_statuses = ["done", "cancelled"]
/// max_parallel = 4
///
/// [[task]]
/// id = "db"
/// title = "Set up database"
/// status = "done"
///
/// [[task]]
/// id = "api"
/// after = ["db"]
/// after_titles = ["Write schema"]
/// cmd = "make api"
/// ```
///
/// All sections are optional. Tasks keep the order they appear in the file.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub task: Vec<TaskConfig>,
}

/// Validated snapshot file.
///
/// Only obtainable through `TryFrom<RawConfigFile>` (see `validate.rs`), so
/// ids are unique and `after_titles` have already been merged into `after`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub task: Vec<TaskConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(config: ConfigSection, task: Vec<TaskConfig>) -> Self {
        Self { config, task }
    }

    /// The engine view of every task, in file order.
    pub fn tasks(&self) -> Vec<Task> {
        self.task.iter().map(TaskConfig::to_task).collect()
    }

    pub fn completion_policy(&self) -> CompletionPolicy {
        CompletionPolicy::new(self.config.completed_statuses.iter().copied())
    }

    /// Commands keyed by task id, for tasks that define one.
    pub fn commands(&self) -> HashMap<TaskId, String> {
        self.task
            .iter()
            .filter_map(|t| t.cmd.as_ref().map(|c| (t.id.clone(), c.clone())))
            .collect()
    }

    pub fn find(&self, id: &str) -> Option<&TaskConfig> {
        self.task.iter().find(|t| t.id == id)
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Statuses that count as completed for satisfaction and dispatch.
    #[serde(default = "default_completed_statuses")]
    pub completed_statuses: Vec<TaskStatus>,

    /// Upper bound on concurrently running commands within one batch.
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,
}

fn default_completed_statuses() -> Vec<TaskStatus> {
    CompletionPolicy::default().statuses().collect()
}

fn default_max_parallel() -> usize {
    4
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            completed_statuses: default_completed_statuses(),
            max_parallel: default_max_parallel(),
        }
    }
}

/// `[[task]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// Stable, unique identifier.
    pub id: TaskId,

    /// Display name; defaults to the id.
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub status: TaskStatus,

    /// Dependency ids: this task waits for all tasks listed here.
    #[serde(default)]
    pub after: Vec<TaskId>,

    /// Dependencies named by title, matched case-insensitively.
    #[serde(default)]
    pub after_titles: Vec<String>,

    /// Shell command run by `taskdag run`.
    #[serde(default)]
    pub cmd: Option<String>,
}

impl TaskConfig {
    pub fn effective_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }

    pub fn to_task(&self) -> Task {
        Task {
            id: self.id.clone(),
            title: self.effective_title().to_string(),
            status: self.status,
            dependencies: self.after.clone(),
        }
    }
}
