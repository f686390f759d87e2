// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The [`Dispatcher`](super::Dispatcher) hands each runnable task to an
//! `ExecutorBackend` instead of spawning processes itself. Production uses
//! [`ShellBackend`]; tests provide a fake that records calls and returns
//! canned outcomes.

use std::future::Future;
use std::pin::Pin;

use crate::errors::{Result, TaskdagError};
use crate::exec::task_runner::run_shell_command;
use crate::exec::{DispatchedTask, TaskOutcome};

/// Trait abstracting how one dispatched task is executed.
pub trait ExecutorBackend: Send + Sync + 'static {
    /// Run `task` to completion and report how it ended.
    ///
    /// An `Err` means the task could not be run at all; the dispatcher
    /// treats it as a failure.
    fn run_task(
        &self,
        task: DispatchedTask,
    ) -> Pin<Box<dyn Future<Output = Result<TaskOutcome>> + Send + '_>>;
}

/// Runs task commands through the platform shell.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellBackend;

impl ShellBackend {
    pub fn new() -> Self {
        Self
    }
}

impl ExecutorBackend for ShellBackend {
    fn run_task(
        &self,
        task: DispatchedTask,
    ) -> Pin<Box<dyn Future<Output = Result<TaskOutcome>> + Send + '_>> {
        Box::pin(async move { run_shell_command(&task).await.map_err(TaskdagError::from) })
    }
}
