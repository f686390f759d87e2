// src/dag/mod.rs

//! Dependency graph and execution-scheduling engine.
//!
//! Everything here is pure: functions take a task snapshot, build what they
//! need and return plain values. Nothing performs I/O and nothing fails;
//! cycles and bad references show up in the returned values.
//!
//! - [`task`] defines the [`Task`] snapshot entity.
//! - [`graph`] builds the adjacency view ([`DependencyGraph`]).
//! - [`cycles`] finds tasks on dependency cycles.
//! - [`planner`] computes batched execution plans.
//! - [`resolver`] maps title-based dependency declarations onto ids.
//! - [`guard`] checks a proposed dependency edit before it is written.
//! - [`queries`] answers satisfaction / readiness / neighbour lookups.

pub mod cycles;
pub mod graph;
pub mod guard;
pub mod planner;
pub mod queries;
pub mod resolver;
pub mod task;

pub use cycles::{CycleReport, cycle_components, detect_cycles};
pub use graph::DependencyGraph;
pub use guard::{CycleValidation, validate_no_cycles};
pub use planner::{ExecutionPlan, plan_execution};
pub use queries::{dependencies_of, dependencies_satisfied, dependents_of, executable_tasks};
pub use resolver::{
    CreatedTask, DeclaredDependencies, resolve_dependencies_by_title, unresolved_titles,
};
pub use task::Task;
