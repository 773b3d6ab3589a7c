use thiserror::Error;

use crate::{JobId, MachineId};

/// Rejections raised by [`InstanceBuilder::build`](super::InstanceBuilder::build).
///
/// All of these describe a malformed problem definition and are reported
/// before any search starts; a well-formed instance that merely has no
/// feasible schedule is *not* an error and surfaces through the solve
/// report instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InstanceError {
    #[error("job {job} task {index} has no machine alternatives")]
    NoAlternatives { job: JobId, index: usize },

    #[error("job {job} task {index} has a negative duration on machine {machine}")]
    NegativeDuration {
        job: JobId,
        index: usize,
        machine: MachineId,
    },

    #[error("job {job} task {index} carries a dependency with a negative delay")]
    NegativeDelay { job: JobId, index: usize },

    #[error("job {job} task {index} depends on unknown task (job {on_job}, index {on_index})")]
    UnknownDependency {
        job: JobId,
        index: usize,
        on_job: JobId,
        on_index: usize,
    },

    #[error("task dependencies form a cycle")]
    DependencyCycle,

    #[error("outage window [{start}, {end}) on machine {machine} is empty or reversed")]
    BadOutage {
        machine: MachineId,
        start: i64,
        end: i64,
    },

    #[error("setup time for family {family} is negative")]
    NegativeSetup { family: u32 },

    #[error("job {job} task {index} pins its start to machine {machine}, which is not an alternative")]
    UnknownPinnedMachine {
        job: JobId,
        index: usize,
        machine: MachineId,
    },

    #[error("job {job} task {index} fixes a negative instant")]
    NegativeFixedInstant { job: JobId, index: usize },
}
