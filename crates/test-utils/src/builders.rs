#![allow(dead_code)]

use taskdag::config::{ConfigFile, ConfigSection, RawConfigFile, TaskConfig};
use taskdag::dag::Task;
use taskdag::types::TaskStatus;

/// Shorthand for an engine task whose title equals its id.
pub fn task(id: &str, deps: &[&str]) -> Task {
    TaskBuilder::new(id).after_all(deps).build()
}

/// Builder for engine [`Task`]s.
pub struct TaskBuilder {
    task: Task,
}

impl TaskBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            task: Task::new(id, id),
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.task.title = title.to_string();
        self
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.task.status = status;
        self
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.dependencies.push(dep.to_string());
        self
    }

    pub fn after_all(mut self, deps: &[&str]) -> Self {
        self.task
            .dependencies
            .extend(deps.iter().map(|d| d.to_string()));
        self
    }

    pub fn build(self) -> Task {
        self.task
    }
}

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                task: Vec::new(),
            },
        }
    }

    pub fn with_task(mut self, task: TaskConfig) -> Self {
        self.config.task.push(task);
        self
    }

    pub fn with_completed_statuses(mut self, statuses: &[TaskStatus]) -> Self {
        self.config.config.completed_statuses = statuses.to_vec();
        self
    }

    pub fn with_max_parallel(mut self, n: usize) -> Self {
        self.config.config.max_parallel = n;
        self
    }

    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            task: TaskConfig {
                id: id.to_string(),
                title: None,
                status: TaskStatus::Todo,
                after: vec![],
                after_titles: vec![],
                cmd: None,
            },
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.task.title = Some(title.to_string());
        self
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.task.status = status;
        self
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.after.push(dep.to_string());
        self
    }

    pub fn after_title(mut self, title: &str) -> Self {
        self.task.after_titles.push(title.to_string());
        self
    }

    pub fn cmd(mut self, cmd: &str) -> Self {
        self.task.cmd = Some(cmd.to_string());
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}
