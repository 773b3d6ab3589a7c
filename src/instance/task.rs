//! Tasks, machine alternatives, and cross-task dependencies.

use crate::{JobId, MachineId};

/// Stable reference to a task: owning job plus position within the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TaskRef {
    pub job: JobId,
    pub index: usize,
}

impl TaskRef {
    pub const fn new(job: JobId, index: usize) -> Self {
        Self { job, index }
    }
}

impl std::fmt::Display for TaskRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "J{}T{}", self.job, self.index)
    }
}

/// One way of running a task: a candidate machine and the processing time
/// the task takes on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Alternative {
    pub machine: MachineId,
    pub duration: i64,
}

/// Start-to-start precedence: the owning task may start no earlier than
/// `delay` ticks after the task `on` starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dependency {
    pub on: TaskRef,
    pub delay: i64,
}

/// Pins a task to one machine at one start instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PinnedStart {
    pub machine: MachineId,
    pub at: i64,
}

/// A single processing step of a job.
///
/// A task lists the machines able to run it together with the
/// machine-specific duration, belongs to a setup family (which drives the
/// setup time charged when a machine switches families), and may carry
/// explicit start-to-start dependencies on other tasks. Consecutive tasks
/// of a job are chained end-to-start by insertion order; a task that
/// declares explicit dependencies opts out of its implicit chain edge.
///
/// # Invariants
///
/// - at least one alternative (enforced at
///   [`InstanceBuilder::build`](super::InstanceBuilder::build))
/// - a task with a single alternative is mandatory on that machine; a task
///   with several alternatives runs on exactly one of them
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Task {
    alternatives: Vec<Alternative>,
    family: u32,
    pinned_start: Option<PinnedStart>,
    fixed_end: Option<i64>,
    dependencies: Vec<Dependency>,
}

impl Task {
    /// Creates an empty task in setup family 0.
    pub fn new() -> Self {
        Self {
            alternatives: Vec::new(),
            family: 0,
            pinned_start: None,
            fixed_end: None,
            dependencies: Vec::new(),
        }
    }

    /// Sets the setup family this task belongs to.
    pub fn with_family(mut self, family: u32) -> Self {
        self.family = family;
        self
    }

    /// Adds a candidate machine with the duration the task takes on it.
    pub fn with_alternative(mut self, machine: MachineId, duration: i64) -> Self {
        self.alternatives.push(Alternative { machine, duration });
        self
    }

    /// Requires this task to start at least `delay` ticks after `on` starts.
    ///
    /// Declaring any explicit dependency replaces the implicit end-to-start
    /// chain edge from the task's predecessor within its job.
    pub fn after_start(mut self, on: TaskRef, delay: i64) -> Self {
        self.dependencies.push(Dependency { on, delay });
        self
    }

    /// Pins the task: it runs on `machine` and starts exactly at `at`.
    /// Alternatives on other machines are discarded by the pin.
    pub fn with_pinned_start(mut self, machine: MachineId, at: i64) -> Self {
        self.pinned_start = Some(PinnedStart { machine, at });
        self
    }

    /// Forces the task to end exactly at `at`, whichever machine runs it.
    pub fn with_fixed_end(mut self, at: i64) -> Self {
        self.fixed_end = Some(at);
        self
    }

    pub fn alternatives(&self) -> &[Alternative] {
        &self.alternatives
    }

    pub fn family(&self) -> u32 {
        self.family
    }

    pub fn pinned_start(&self) -> Option<PinnedStart> {
        self.pinned_start
    }

    pub fn fixed_end(&self) -> Option<i64> {
        self.fixed_end
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }
}

impl Default for Task {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Task(")?;
        for (k, alt) in self.alternatives.iter().enumerate() {
            if k > 0 {
                write!(f, " | ")?;
            }
            write!(f, "<m{},{}>", alt.machine, alt.duration)?;
        }
        write!(f, ")")
    }
}

/// An ordered chain of tasks. Insertion order is precedence order unless a
/// task overrides it with explicit dependencies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Job {
    tasks: Vec<Task>,
}

impl Job {
    pub(crate) fn push(&mut self, task: Task) -> usize {
        self.tasks.push(task);
        self.tasks.len() - 1
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
