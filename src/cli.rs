// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `taskdag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "taskdag",
    version,
    about = "Check task dependencies and plan parallel execution batches.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the task snapshot file (TOML).
    #[arg(long, value_name = "PATH", default_value = "Taskdag.toml", global = true)]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TASKDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    /// Print results as JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print the batched execution plan.
    Plan,

    /// Report tasks on dependency cycles.
    Check,

    /// Check whether replacing a task's dependencies would create a cycle.
    Validate {
        /// Task whose dependency list would change.
        #[arg(long, value_name = "ID")]
        task: String,

        /// Proposed dependency ids (repeat or comma-separate).
        #[arg(long = "deps", value_name = "ID", value_delimiter = ',')]
        deps: Vec<String>,
    },

    /// List tasks that can start now.
    ///
    /// A dependency on an id that names no task counts as unmet here, even
    /// though `run` schedules around it.
    Ready,

    /// List the direct dependencies of a task.
    Deps {
        #[arg(value_name = "ID")]
        task: String,
    },

    /// List the tasks that depend directly on a task.
    Dependents {
        #[arg(value_name = "ID")]
        task: String,
    },

    /// Run each task's `cmd`, batch by batch.
    Run {
        /// Print what would run without executing anything.
        #[arg(long)]
        dry_run: bool,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
