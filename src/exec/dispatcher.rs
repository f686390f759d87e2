// src/exec/dispatcher.rs

//! Batch-by-batch dispatch of an [`ExecutionPlan`].

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::dag::{ExecutionPlan, Task};
use crate::errors::{Result, TaskdagError};
use crate::exec::backend::ExecutorBackend;
use crate::exec::{DispatchedTask, TaskOutcome};
use crate::types::{CompletionPolicy, TaskId};

#[derive(Debug, Clone, Copy)]
pub struct DispatchOptions {
    /// Maximum number of tasks of one batch running at the same time.
    pub max_parallel: usize,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self { max_parallel: 4 }
    }
}

/// Why a task was not handed to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    AlreadyCompleted,
    NoCommand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DispatchStatus {
    Succeeded,
    Failed { exit_code: i32 },
    /// Counted as completed without running anything.
    Skipped { reason: SkipReason },
    /// An earlier batch failed, so this task's batch never started.
    NotRun,
}

impl DispatchStatus {
    pub fn is_completed(self) -> bool {
        matches!(
            self,
            DispatchStatus::Succeeded | DispatchStatus::Skipped { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskReport {
    pub id: TaskId,
    pub batch: usize,
    pub status: DispatchStatus,
}

/// What happened to every task of a plan, in plan order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub tasks: Vec<TaskReport>,
    pub batches_completed: usize,
}

impl DispatchReport {
    pub fn success(&self) -> bool {
        self.tasks.iter().all(|t| t.status.is_completed())
    }

    pub fn status_of(&self, id: &str) -> Option<DispatchStatus> {
        self.tasks.iter().find(|t| t.id == id).map(|t| t.status)
    }

    pub fn failed(&self) -> impl Iterator<Item = &TaskReport> {
        self.tasks
            .iter()
            .filter(|t| matches!(t.status, DispatchStatus::Failed { .. }))
    }
}

/// Runs the batches of a plan through an [`ExecutorBackend`].
///
/// Tasks of one batch run concurrently (bounded by `max_parallel`); the
/// next batch starts only after every task of the current one finished.
/// After a batch with a failure no further batch is started.
pub struct Dispatcher<B: ExecutorBackend> {
    backend: Arc<B>,
    options: DispatchOptions,
}

impl<B: ExecutorBackend> Dispatcher<B> {
    pub fn new(backend: B, options: DispatchOptions) -> Self {
        Self {
            backend: Arc::new(backend),
            options,
        }
    }

    pub async fn dispatch(
        &self,
        plan: &ExecutionPlan,
        tasks: &[Task],
        commands: &HashMap<TaskId, String>,
        policy: &CompletionPolicy,
    ) -> Result<DispatchReport> {
        if plan.has_cycles {
            let ids: Vec<&str> = plan.cyclic_tasks.iter().map(|s| s.as_str()).collect();
            return Err(TaskdagError::DagCycle(format!(
                "refusing to dispatch; tasks on cycles: {}",
                ids.join(", ")
            )));
        }

        let by_id: HashMap<&str, &Task> = tasks.iter().map(|t| (t.id.as_str(), t)).collect();
        let semaphore = Arc::new(Semaphore::new(self.options.max_parallel.max(1)));

        let mut reports: Vec<TaskReport> = Vec::with_capacity(plan.total_tasks);
        let mut batches_completed = 0;
        let mut halted = false;

        for (batch_idx, batch) in plan.batches.iter().enumerate() {
            if halted {
                reports.extend(batch.iter().map(|id| TaskReport {
                    id: id.clone(),
                    batch: batch_idx,
                    status: DispatchStatus::NotRun,
                }));
                continue;
            }

            info!(batch = batch_idx, size = batch.len(), "dispatching batch");

            let mut statuses: HashMap<TaskId, DispatchStatus> = HashMap::new();
            let mut running: JoinSet<(TaskId, DispatchStatus)> = JoinSet::new();

            for id in batch {
                if let Some(task) = by_id.get(id.as_str()) {
                    if policy.is_completed(task.status) {
                        statuses.insert(
                            id.clone(),
                            DispatchStatus::Skipped {
                                reason: SkipReason::AlreadyCompleted,
                            },
                        );
                        continue;
                    }
                }

                let Some(cmd) = commands.get(id) else {
                    statuses.insert(
                        id.clone(),
                        DispatchStatus::Skipped {
                            reason: SkipReason::NoCommand,
                        },
                    );
                    continue;
                };

                let dispatched = DispatchedTask {
                    id: id.clone(),
                    cmd: cmd.clone(),
                    batch: batch_idx,
                };
                let backend = Arc::clone(&self.backend);
                let semaphore = Arc::clone(&semaphore);

                running.spawn(async move {
                    let id = dispatched.id.clone();
                    let _permit = match semaphore.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(e) => {
                            error!(task = %id, error = %e, "dispatch semaphore closed");
                            return (id, DispatchStatus::Failed { exit_code: -1 });
                        }
                    };
                    let status = match backend.run_task(dispatched).await {
                        Ok(TaskOutcome::Success) => DispatchStatus::Succeeded,
                        Ok(TaskOutcome::Failed(code)) => DispatchStatus::Failed { exit_code: code },
                        Err(err) => {
                            error!(task = %id, error = %err, "task execution error");
                            DispatchStatus::Failed { exit_code: -1 }
                        }
                    };
                    (id, status)
                });
            }

            while let Some(joined) = running.join_next().await {
                match joined {
                    Ok((id, status)) => {
                        statuses.insert(id, status);
                    }
                    Err(e) => error!(batch = batch_idx, error = %e, "task join failed"),
                }
            }

            // Emit in plan order; anything missing here panicked in the join.
            let mut batch_failed = false;
            for id in batch {
                let status = statuses
                    .remove(id)
                    .unwrap_or(DispatchStatus::Failed { exit_code: -1 });
                if !status.is_completed() {
                    batch_failed = true;
                }
                reports.push(TaskReport {
                    id: id.clone(),
                    batch: batch_idx,
                    status,
                });
            }

            if batch_failed {
                warn!(batch = batch_idx, "batch had failures; later batches will not run");
                halted = true;
            } else {
                batches_completed += 1;
            }
        }

        Ok(DispatchReport {
            tasks: reports,
            batches_completed,
        })
    }
}
