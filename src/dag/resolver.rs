// src/dag/resolver.rs

//! Title-based dependency resolution.
//!
//! Some producers (free-text analysis, hand-written snapshot files) name
//! dependencies by task title because the ids do not exist yet. This module
//! maps those titles onto the ids of the tasks that were actually created.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::TaskId;

/// A task's dependencies as declared by title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredDependencies {
    pub title: String,
    #[serde(default)]
    pub dependency_titles: Vec<String>,
}

/// A task that now exists with a stable id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedTask {
    pub id: TaskId,
    pub title: String,
}

/// Resolve title-based declarations into an id → dependency-ids map.
///
/// - A declaration finds its own task by exact title (first match wins);
///   declarations with no such task are skipped.
/// - Dependency titles are matched case-insensitively. If two created tasks
///   share a title the later one wins.
/// - Titles that match nothing are dropped. A typo loses a constraint, it
///   never produces an error.
///
/// No cycle check happens here; plan or validate the result before
/// persisting it.
pub fn resolve_dependencies_by_title(
    declared: &[DeclaredDependencies],
    created: &[CreatedTask],
) -> BTreeMap<TaskId, Vec<TaskId>> {
    let by_title: HashMap<String, &str> = created
        .iter()
        .map(|t| (normalize_title(&t.title), t.id.as_str()))
        .collect();

    let mut resolved: BTreeMap<TaskId, Vec<TaskId>> = BTreeMap::new();

    for decl in declared {
        let Some(own) = created.iter().find(|t| t.title == decl.title) else {
            debug!(title = %decl.title, "declared task was not created; skipping");
            continue;
        };

        let mut deps: Vec<TaskId> = Vec::with_capacity(decl.dependency_titles.len());
        for dep_title in &decl.dependency_titles {
            match by_title.get(&normalize_title(dep_title)) {
                Some(id) => {
                    if !deps.iter().any(|d| d.as_str() == *id) {
                        deps.push((*id).to_string());
                    }
                }
                None => debug!(
                    task = %own.id,
                    dependency = %dep_title,
                    "dependency title matches no created task; dropping"
                ),
            }
        }

        resolved.insert(own.id.clone(), deps);
    }

    resolved
}

/// The entries of `dependency_titles` that match no created task, in input
/// order.
///
/// Uses the same case-insensitive matching as
/// [`resolve_dependencies_by_title`], so spellings that differ only in case
/// never count as unresolved.
pub fn unresolved_titles<'a>(
    dependency_titles: &'a [String],
    created: &[CreatedTask],
) -> Vec<&'a str> {
    let known: HashSet<String> = created.iter().map(|t| normalize_title(&t.title)).collect();
    dependency_titles
        .iter()
        .filter(|title| !known.contains(&normalize_title(title)))
        .map(String::as_str)
        .collect()
}

fn normalize_title(title: &str) -> String {
    title.to_lowercase()
}
