// src/config/validate.rs

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::config::model::{ConfigFile, RawConfigFile, TaskConfig};
use crate::dag::{
    CreatedTask, DeclaredDependencies, resolve_dependencies_by_title, unresolved_titles,
};
use crate::errors::{Result, TaskdagError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::TaskdagError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_config(&raw)?;
        let tasks = merge_title_dependencies(raw.task);
        warn_dangling_dependencies(&tasks);
        Ok(ConfigFile::new_unchecked(raw.config, tasks))
    }
}

/// Structural checks. Cycles and unknown dependency ids are deliberately not
/// rejected: the engine reports the former and tolerates the latter.
pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    validate_global_config(cfg)?;
    validate_task_ids(cfg)?;
    validate_titles_for_resolution(cfg)?;
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.completed_statuses.is_empty() {
        return Err(TaskdagError::ConfigError(
            "[config].completed_statuses must name at least one status".to_string(),
        ));
    }

    if cfg.config.max_parallel == 0 {
        return Err(TaskdagError::ConfigError(
            "[config].max_parallel must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}

fn validate_task_ids(cfg: &RawConfigFile) -> Result<()> {
    let mut seen: HashSet<&str> = HashSet::new();
    for (idx, task) in cfg.task.iter().enumerate() {
        if task.id.trim().is_empty() {
            return Err(TaskdagError::ConfigError(format!(
                "task #{} has an empty `id`",
                idx + 1
            )));
        }
        if !seen.insert(task.id.as_str()) {
            return Err(TaskdagError::ConfigError(format!(
                "duplicate task id '{}'",
                task.id
            )));
        }
    }
    Ok(())
}

/// `after_titles` can only be resolved unambiguously if titles are unique
/// (ignoring case).
fn validate_titles_for_resolution(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.iter().all(|t| t.after_titles.is_empty()) {
        return Ok(());
    }

    let mut seen: HashMap<String, &str> = HashMap::new();
    for task in cfg.task.iter() {
        let key = task.effective_title().to_lowercase();
        if let Some(other) = seen.insert(key, task.id.as_str()) {
            return Err(TaskdagError::ConfigError(format!(
                "tasks '{}' and '{}' share the title '{}'; `after_titles` would be ambiguous",
                other,
                task.id,
                task.effective_title()
            )));
        }
    }
    Ok(())
}

/// Resolve every `after_titles` list and append the ids to `after`.
fn merge_title_dependencies(mut tasks: Vec<TaskConfig>) -> Vec<TaskConfig> {
    let declared: Vec<DeclaredDependencies> = tasks
        .iter()
        .filter(|t| !t.after_titles.is_empty())
        .map(|t| DeclaredDependencies {
            title: t.effective_title().to_string(),
            dependency_titles: t.after_titles.clone(),
        })
        .collect();

    if declared.is_empty() {
        return tasks;
    }

    let created: Vec<CreatedTask> = tasks
        .iter()
        .map(|t| CreatedTask {
            id: t.id.clone(),
            title: t.effective_title().to_string(),
        })
        .collect();

    let resolved = resolve_dependencies_by_title(&declared, &created);

    for task in tasks.iter_mut() {
        let Some(ids) = resolved.get(&task.id) else {
            continue;
        };
        let unresolved = unresolved_titles(&task.after_titles, &created);
        if !unresolved.is_empty() {
            warn!(
                task = %task.id,
                unresolved = ?unresolved,
                "some `after_titles` entries did not match any task title"
            );
        }
        for id in ids {
            if !task.after.contains(id) {
                task.after.push(id.clone());
            }
        }
        debug!(task = %task.id, after = ?task.after, "merged title dependencies");
    }

    tasks
}

fn warn_dangling_dependencies(tasks: &[TaskConfig]) {
    let ids: HashSet<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
    for task in tasks {
        for dep in &task.after {
            if !ids.contains(dep.as_str()) {
                warn!(
                    task = %task.id,
                    dep = %dep,
                    "dependency names no task in this snapshot; it will not block scheduling"
                );
            }
        }
    }
}
