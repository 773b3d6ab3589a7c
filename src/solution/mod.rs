//! Complete schedules produced by the solver.
//!
//! A [`Solution`] is a snapshot of one full assignment: per machine, the
//! performed activities in sequence order with resolved `[start, end)`
//! windows, plus the overall makespan. Solutions are plain data - they stay
//! valid after the solver moves on to better incumbents.


use crate::instance::TaskRef;
use crate::MachineId;

/// One performed activity as placed on its machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScheduledOp {
    /// The task this activity realizes.
    pub task: TaskRef,
    /// Index of the chosen alternative in the task's alternative list.
    pub alternative: usize,
    pub machine: MachineId,
    pub start: i64,
    /// Exclusive end; includes any outage inflation of the duration.
    pub end: i64,
    /// Setup time charged on the machine right before this activity.
    pub setup_before: i64,
}

/// The ordered activities of one machine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MachineTimeline {
    pub machine: MachineId,
    /// Performed activities in sequence order (consistent with start times).
    pub ops: Vec<ScheduledOp>,
}

/// A complete assignment: machine, start and end for every task.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Solution {
    makespan: i64,
    machines: Vec<MachineTimeline>,
}

impl Solution {
    pub(crate) fn new(makespan: i64, machines: Vec<MachineTimeline>) -> Self {
        Self { makespan, machines }
    }

    /// End of the latest performed activity.
    pub fn makespan(&self) -> i64 {
        self.makespan
    }

    /// Timelines of all machines, indexed by machine id.
    pub fn machines(&self) -> &[MachineTimeline] {
        &self.machines
    }

    /// The ordered operations of one machine, empty if the machine is idle.
    pub fn timeline(&self, machine: MachineId) -> &[ScheduledOp] {
        self.machines
            .get(machine)
            .map(|tl| tl.ops.as_slice())
            .unwrap_or(&[])
    }

    /// Where a task ended up, if it exists.
    pub fn op_for(&self, task: TaskRef) -> Option<&ScheduledOp> {
        self.machines
            .iter()
            .flat_map(|tl| tl.ops.iter())
            .find(|op| op.task == task)
    }

    /// All scheduled operations across machines.
    pub fn ops(&self) -> impl Iterator<Item = &ScheduledOp> {
        self.machines.iter().flat_map(|tl| tl.ops.iter())
    }
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Solution {{")?;
        writeln!(f, "  Makespan: {}", self.makespan)?;
        for tl in &self.machines {
            write!(f, "  Machine {}:", tl.machine)?;
            for op in &tl.ops {
                if op.setup_before > 0 {
                    write!(f, " ~{}", op.setup_before)?;
                }
                write!(f, " [{}..{}) {}", op.start, op.end, op.task)?;
            }
            writeln!(f)?;
        }
        write!(f, "}}")
    }
}
