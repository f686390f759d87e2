// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod types;

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::cli::{CliArgs, Command};
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::dag::{
    CycleReport, CycleValidation, DependencyGraph, ExecutionPlan, Task, dependencies_of,
    dependents_of, executable_tasks, validate_no_cycles,
};
use crate::errors::TaskdagError;
use crate::exec::{
    DispatchOptions, DispatchReport, DispatchStatus, Dispatcher, ShellBackend, SkipReason,
};
use crate::types::{TaskId, TaskStatus};

/// How a command ended, for the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// The command did what was asked and found nothing wrong.
    Clean,
    /// The command ran but the snapshot (or proposed edit) was rejected:
    /// cycles were found or a dispatched task failed.
    Rejected,
}

impl RunStatus {
    pub fn exit_code(self) -> i32 {
        match self {
            RunStatus::Clean => 0,
            RunStatus::Rejected => 2,
        }
    }
}

/// High-level entry point used by `main.rs`.
///
/// Loads the snapshot, runs the selected subcommand against the engine and
/// prints the result to stdout.
pub async fn run(args: CliArgs) -> Result<RunStatus> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;
    let tasks = cfg.tasks();
    info!(tasks = tasks.len(), command = ?args.command, "loaded snapshot");

    match &args.command {
        Command::Plan => {
            let plan = dag::plan_execution(&tasks);
            emit(args.json, &plan, || render_plan(&plan, &tasks))?;
            Ok(status_for(plan.is_valid()))
        }
        Command::Check => {
            let report = CycleReport::analyze(&DependencyGraph::build(&tasks));
            emit(args.json, &report, || render_cycle_report(&report))?;
            Ok(status_for(!report.has_cycles()))
        }
        Command::Validate { task, deps } => {
            ensure_known(task, &tasks)?;
            let validation = validate_no_cycles(task, deps, &tasks);
            emit(args.json, &validation, || render_validation(task, &validation))?;
            Ok(status_for(validation.valid))
        }
        Command::Ready => {
            let ready = executable_tasks(&tasks, &cfg.completion_policy());
            emit(args.json, &ready, || render_task_list("ready", &ready))?;
            Ok(RunStatus::Clean)
        }
        Command::Deps { task } => {
            ensure_known(task, &tasks)?;
            let deps = dependencies_of(task, &tasks);
            emit(args.json, &deps, || render_task_list("dependencies", &deps))?;
            Ok(RunStatus::Clean)
        }
        Command::Dependents { task } => {
            ensure_known(task, &tasks)?;
            let dependents = dependents_of(task, &tasks);
            emit(args.json, &dependents, || {
                render_task_list("dependents", &dependents)
            })?;
            Ok(RunStatus::Clean)
        }
        Command::Run { dry_run } => run_plan(&cfg, &tasks, *dry_run, args.json).await,
    }
}

async fn run_plan(cfg: &ConfigFile, tasks: &[Task], dry_run: bool, json: bool) -> Result<RunStatus> {
    let plan = dag::plan_execution(tasks);

    if dry_run {
        let preview = dry_run_plan(cfg, &plan);
        emit(json, &preview, || render_dry_run(&preview))?;
        debug!("dry-run complete (no execution)");
        return Ok(status_for(plan.is_valid()));
    }

    if !plan.is_valid() {
        emit(json, &plan, || render_plan(&plan, tasks))?;
        return Ok(RunStatus::Rejected);
    }

    let dispatcher = Dispatcher::new(
        ShellBackend::new(),
        DispatchOptions {
            max_parallel: cfg.config.max_parallel,
        },
    );
    let report = dispatcher
        .dispatch(&plan, tasks, &cfg.commands(), &cfg.completion_policy())
        .await?;

    emit(json, &report, || render_dispatch_report(&report))?;
    Ok(status_for(report.success()))
}

fn status_for(ok: bool) -> RunStatus {
    if ok { RunStatus::Clean } else { RunStatus::Rejected }
}

fn ensure_known(id: &str, tasks: &[Task]) -> std::result::Result<(), TaskdagError> {
    if tasks.iter().any(|t| t.id == id) {
        Ok(())
    } else {
        Err(TaskdagError::TaskNotFound(id.to_string()))
    }
}

fn emit<T: Serialize + ?Sized>(
    json: bool,
    value: &T,
    text: impl FnOnce() -> String,
) -> std::result::Result<(), TaskdagError> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print!("{}", text());
    }
    Ok(())
}

/// Text rendering of a plan: one line per batch, titles in parentheses.
pub fn render_plan(plan: &ExecutionPlan, tasks: &[Task]) -> String {
    let mut out = String::new();
    if plan.has_cycles {
        let _ = writeln!(
            out,
            "no valid execution order: {} task(s) on dependency cycles",
            plan.cyclic_tasks.len()
        );
        for id in &plan.cyclic_tasks {
            let _ = writeln!(out, "  - {id}");
        }
        return out;
    }

    let _ = writeln!(
        out,
        "{} task(s) in {} batch(es)",
        plan.total_tasks,
        plan.batches.len()
    );
    for (idx, batch) in plan.batches.iter().enumerate() {
        let names: Vec<String> = batch
            .iter()
            .map(|id| match tasks.iter().find(|t| &t.id == id) {
                Some(t) if t.title != t.id => format!("{id} ({})", t.title),
                _ => id.clone(),
            })
            .collect();
        let _ = writeln!(out, "  batch {}: {}", idx + 1, names.join(", "));
    }
    out
}

pub fn render_cycle_report(report: &CycleReport) -> String {
    let mut out = String::new();
    if !report.has_cycles() {
        out.push_str("no dependency cycles\n");
        return out;
    }
    let ids: Vec<&str> = report.cyclic_tasks.iter().map(|s| s.as_str()).collect();
    let _ = writeln!(out, "tasks on cycles: {}", ids.join(", "));
    for (idx, component) in report.components.iter().enumerate() {
        let _ = writeln!(out, "  cycle {}: {}", idx + 1, component.join(" <-> "));
    }
    out
}

pub fn render_validation(task: &str, validation: &CycleValidation) -> String {
    match &validation.cycle_path {
        None => format!("ok: new dependencies for '{task}' keep the graph acyclic\n"),
        Some(cyclic) => {
            let ids: Vec<&str> = cyclic.iter().map(|s| s.as_str()).collect();
            format!(
                "rejected: new dependencies for '{task}' create a cycle through {}\n",
                ids.join(", ")
            )
        }
    }
}

fn render_task_list(label: &str, tasks: &[&Task]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{label} ({}):", tasks.len());
    for t in tasks {
        let _ = writeln!(out, "  - {} [{}] {}", t.id, t.status, t.title);
    }
    out
}

/// What `run` would do, without running anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DryRunPlan {
    pub max_parallel: usize,
    pub completed_statuses: Vec<TaskStatus>,
    pub cyclic_tasks: Vec<TaskId>,
    pub batches: Vec<Vec<DryRunStep>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DryRunStep {
    pub id: TaskId,
    #[serde(flatten)]
    pub action: DryRunAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DryRunAction {
    Run { cmd: String },
    Skip { reason: SkipReason },
}

/// Decide, per planned task, whether `run` would execute or skip it.
///
/// Uses the same rules as the dispatcher: tasks already in the completed
/// family and tasks without a command are skipped.
pub fn dry_run_plan(cfg: &ConfigFile, plan: &ExecutionPlan) -> DryRunPlan {
    let policy = cfg.completion_policy();
    let batches = plan
        .batches
        .iter()
        .map(|batch| {
            batch
                .iter()
                .filter_map(|id| cfg.find(id))
                .map(|task| {
                    let action = if policy.is_completed(task.status) {
                        DryRunAction::Skip {
                            reason: SkipReason::AlreadyCompleted,
                        }
                    } else {
                        match &task.cmd {
                            Some(cmd) => DryRunAction::Run { cmd: cmd.clone() },
                            None => DryRunAction::Skip {
                                reason: SkipReason::NoCommand,
                            },
                        }
                    };
                    DryRunStep {
                        id: task.id.clone(),
                        action,
                    }
                })
                .collect()
        })
        .collect();

    DryRunPlan {
        max_parallel: cfg.config.max_parallel,
        completed_statuses: cfg.config.completed_statuses.iter().copied().collect(),
        cyclic_tasks: plan.cyclic_tasks.iter().cloned().collect(),
        batches,
    }
}

fn render_dry_run(preview: &DryRunPlan) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "taskdag dry-run");
    let _ = writeln!(out, "  config.max_parallel = {}", preview.max_parallel);
    let statuses: Vec<&str> = preview
        .completed_statuses
        .iter()
        .map(|s| s.as_str())
        .collect();
    let _ = writeln!(out, "  config.completed_statuses = {statuses:?}");
    let _ = writeln!(out);

    if !preview.cyclic_tasks.is_empty() {
        let _ = writeln!(
            out,
            "cycles prevent execution: {}",
            preview.cyclic_tasks.join(", ")
        );
        return out;
    }

    for (idx, batch) in preview.batches.iter().enumerate() {
        let _ = writeln!(out, "batch {}:", idx + 1);
        for step in batch {
            let action = match &step.action {
                DryRunAction::Run { cmd } => format!("run `{cmd}`"),
                DryRunAction::Skip {
                    reason: SkipReason::AlreadyCompleted,
                } => "skip (already completed)".to_string(),
                DryRunAction::Skip {
                    reason: SkipReason::NoCommand,
                } => "skip (no cmd)".to_string(),
            };
            let _ = writeln!(out, "  - {}: {action}", step.id);
        }
    }
    out
}

fn render_dispatch_report(report: &DispatchReport) -> String {
    let mut out = String::new();
    for t in &report.tasks {
        let state = match t.status {
            DispatchStatus::Succeeded => "ok".to_string(),
            DispatchStatus::Failed { exit_code } => format!("FAILED (exit {exit_code})"),
            DispatchStatus::Skipped { reason } => format!("skipped ({reason:?})"),
            DispatchStatus::NotRun => "not run".to_string(),
        };
        let _ = writeln!(out, "  batch {}: {} {}", t.batch + 1, t.id, state);
    }
    let _ = writeln!(
        out,
        "{} batch(es) completed, {} failed task(s)",
        report.batches_completed,
        report.failed().count()
    );
    out
}
