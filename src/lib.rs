//! flexshop - Flexible job-shop scheduling with setup times and machine outages.
//!
//! A constraint-based branch-and-bound engine for the flexible job-shop
//! problem: jobs are chains of tasks, each task runs on one of several
//! candidate machines at a machine-specific duration, machines process one
//! task at a time, switching between setup families costs a directional
//! setup time, and machines may carry outage windows that pause the work
//! crossing them. The engine assigns a machine and a start instant to every
//! task so that all constraints hold and the makespan is minimized.
//!
//! # Modules
//!
//! - **`instance`**: problem definition - jobs, tasks, machine alternatives,
//!   dependencies, setup tables, outage windows - validated by
//!   [`InstanceBuilder::build`](instance::InstanceBuilder::build)
//! - **`search`**: the branch-and-bound [`Solver`](search::Solver) with
//!   trail-based propagation, search limits, and a lazy improving-solution
//!   iterator
//! - **`solution`**: per-machine timelines produced by the solver

mod domain;
mod propagation;

pub mod instance;
pub mod search;
pub mod solution;

/// Identifier of a machine, a dense 0-based index.
pub type MachineId = usize;

/// Identifier of a job, a dense 0-based index.
pub type JobId = usize;
