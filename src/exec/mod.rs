// src/exec/mod.rs

//! Plan dispatch layer.
//!
//! The engine in [`crate::dag`] only computes plans. This module is the
//! caller side of that contract: it walks a plan batch by batch and runs
//! each task's command, using `tokio` for the concurrency inside a batch.
//!
//! - [`dispatcher`] owns the batch loop and the per-task report.
//! - [`backend`] provides the `ExecutorBackend` trait and the production
//!   `ShellBackend`; tests replace it with a fake.
//! - [`task_runner`] runs a single shell command.

pub mod backend;
pub mod dispatcher;
pub mod task_runner;

use crate::types::TaskId;

pub use backend::{ExecutorBackend, ShellBackend};
pub use dispatcher::{
    DispatchOptions, DispatchReport, DispatchStatus, Dispatcher, SkipReason, TaskReport,
};

/// Outcome of one task process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed(i32),
}

/// A task handed to an [`ExecutorBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchedTask {
    pub id: TaskId,
    pub cmd: String,
    /// Index of the plan batch this task belongs to.
    pub batch: usize,
}
