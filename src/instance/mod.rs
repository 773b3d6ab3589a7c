//! Problem definition for the flexible job-shop.
//!
//! An [`Instance`] is built once through [`InstanceBuilder`], validated, and
//! stays immutable for the lifetime of every solve. Jobs and machines are
//! identified by dense 0-based indices; the cross-task dependency structure
//! is checked for cycles with a petgraph DAG before the instance is handed
//! to the solver.

mod error;
mod outage;
mod setup;
mod task;

pub use error::InstanceError;
pub use outage::Outage;
pub use setup::SetupTable;
pub use task::{Alternative, Dependency, Job, PinnedStart, Task, TaskRef};

use petgraph::algo::toposort;
use petgraph::graph::DiGraph;

use crate::{JobId, MachineId};

/// A validated flexible job-shop problem.
///
/// # Invariants
///
/// - every task has at least one alternative
/// - all durations, delays, setup times and fixed instants are non-negative
/// - dependency edges reference existing tasks and form no cycle
/// - outage windows per machine are disjoint and sorted ascending
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Instance {
    jobs: Vec<Job>,
    outages: Vec<Vec<Outage>>,
    setup: SetupTable,
    machine_count: usize,
    horizon: i64,
}

impl Instance {
    pub fn builder() -> InstanceBuilder {
        InstanceBuilder::default()
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn task(&self, r: TaskRef) -> Option<&Task> {
        self.jobs.get(r.job)?.tasks().get(r.index)
    }

    pub fn task_count(&self) -> usize {
        self.jobs.iter().map(Job::len).sum()
    }

    /// Iterates all task references in job order.
    pub fn task_refs(&self) -> impl Iterator<Item = TaskRef> + '_ {
        self.jobs.iter().enumerate().flat_map(|(job, j)| {
            (0..j.len()).map(move |index| TaskRef::new(job, index))
        })
    }

    pub fn machine_count(&self) -> usize {
        self.machine_count
    }

    /// Outage windows of a machine, disjoint and sorted ascending.
    pub fn outages(&self, machine: MachineId) -> &[Outage] {
        self.outages.get(machine).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn setup(&self) -> &SetupTable {
        &self.setup
    }

    /// Upper bound on every time value of a schedule.
    pub fn horizon(&self) -> i64 {
        self.horizon
    }
}

impl std::fmt::Display for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "FlexibleShop({} machines, {} jobs, horizon {})",
            self.machine_count,
            self.jobs.len(),
            self.horizon
        )?;
        for (id, job) in self.jobs.iter().enumerate() {
            write!(f, "  job {}: ", id)?;
            for (k, t) in job.tasks().iter().enumerate() {
                if k > 0 {
                    write!(f, " -> ")?;
                }
                write!(f, "{}", t)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Accumulates jobs, tasks, outages and setup times, then validates the
/// whole definition in one [`build`](Self::build) pass.
///
/// # Example
///
/// ```
/// use flexshop::instance::{Instance, Task};
///
/// let mut builder = Instance::builder();
/// let first = builder.task(0, Task::new().with_alternative(0, 2).with_alternative(1, 3));
/// builder.task(0, Task::new().with_alternative(1, 4).after_start(first, 12));
/// let instance = builder.build().expect("valid instance");
/// assert_eq!(instance.task_count(), 2);
/// ```
#[derive(Debug, Default)]
pub struct InstanceBuilder {
    jobs: Vec<Job>,
    outages: Vec<(MachineId, Outage)>,
    setup: SetupTable,
    horizon: Option<i64>,
}

impl InstanceBuilder {
    /// Appends a task to `job` (jobs are created on first use) and returns
    /// its reference for wiring dependencies.
    pub fn task(&mut self, job: JobId, task: Task) -> TaskRef {
        while self.jobs.len() <= job {
            self.jobs.push(Job::default());
        }
        let index = self.jobs[job].push(task);
        TaskRef::new(job, index)
    }

    /// Declares `[start, end)` as unavailable on `machine`.
    pub fn outage(&mut self, machine: MachineId, start: i64, end: i64) -> &mut Self {
        self.outages.push((machine, Outage::new(start, end)));
        self
    }

    /// Sets the retooling time for `family`.
    pub fn setup_time(&mut self, family: u32, time: i64) -> &mut Self {
        self.setup = std::mem::take(&mut self.setup).with_time(family, time);
        self
    }

    /// Replaces the whole setup table.
    pub fn setup_table(&mut self, table: SetupTable) -> &mut Self {
        self.setup = table;
        self
    }

    /// Overrides the computed horizon. An override that is too small makes
    /// the instance infeasible, which surfaces through the solve report.
    pub fn horizon(&mut self, horizon: i64) -> &mut Self {
        self.horizon = Some(horizon);
        self
    }

    /// Validates the definition and freezes it into an [`Instance`].
    pub fn build(self) -> Result<Instance, InstanceError> {
        for (job, j) in self.jobs.iter().enumerate() {
            for (index, t) in j.tasks().iter().enumerate() {
                if t.alternatives().is_empty() {
                    return Err(InstanceError::NoAlternatives { job, index });
                }
                for alt in t.alternatives() {
                    if alt.duration < 0 {
                        return Err(InstanceError::NegativeDuration {
                            job,
                            index,
                            machine: alt.machine,
                        });
                    }
                }
                for dep in t.dependencies() {
                    if dep.delay < 0 {
                        return Err(InstanceError::NegativeDelay { job, index });
                    }
                    let exists = self
                        .jobs
                        .get(dep.on.job)
                        .is_some_and(|other| dep.on.index < other.len());
                    if !exists {
                        return Err(InstanceError::UnknownDependency {
                            job,
                            index,
                            on_job: dep.on.job,
                            on_index: dep.on.index,
                        });
                    }
                }
                if let Some(pin) = t.pinned_start() {
                    if !t.alternatives().iter().any(|a| a.machine == pin.machine) {
                        return Err(InstanceError::UnknownPinnedMachine {
                            job,
                            index,
                            machine: pin.machine,
                        });
                    }
                    if pin.at < 0 {
                        return Err(InstanceError::NegativeFixedInstant { job, index });
                    }
                }
                if t.fixed_end().is_some_and(|at| at < 0) {
                    return Err(InstanceError::NegativeFixedInstant { job, index });
                }
            }
        }

        if let Some(family) = self.setup.first_negative() {
            return Err(InstanceError::NegativeSetup { family });
        }

        for &(machine, w) in &self.outages {
            if w.is_empty() || w.start < 0 {
                return Err(InstanceError::BadOutage {
                    machine,
                    start: w.start,
                    end: w.end,
                });
            }
        }

        self.check_acyclic()?;

        let machine_count = self
            .jobs
            .iter()
            .flat_map(|j| j.tasks())
            .flat_map(|t| t.alternatives())
            .map(|a| a.machine + 1)
            .chain(self.outages.iter().map(|&(m, _)| m + 1))
            .max()
            .unwrap_or(0);

        let mut outages = vec![Vec::new(); machine_count];
        for (machine, w) in self.outages {
            outages[machine].push(w);
        }
        let outages: Vec<Vec<Outage>> = outages.into_iter().map(outage::normalize).collect();

        let horizon = self.horizon.unwrap_or_else(|| {
            let work: i64 = self
                .jobs
                .iter()
                .flat_map(|j| j.tasks())
                .flat_map(|t| t.alternatives())
                .map(|a| a.duration)
                .sum();
            let pauses: i64 = self
                .jobs
                .iter()
                .flat_map(|j| j.tasks())
                .flat_map(|t| t.alternatives())
                .map(|a| a.machine)
                .collect::<std::collections::BTreeSet<_>>()
                .iter()
                .flat_map(|&m| outages_len(&outages, m))
                .sum();
            let setups: i64 = self
                .jobs
                .iter()
                .flat_map(|j| j.tasks())
                .map(|t| self.setup.time(t.family()))
                .sum();
            let latest_fixed = self
                .jobs
                .iter()
                .flat_map(|j| j.tasks())
                .flat_map(|t| {
                    t.pinned_start()
                        .map(|p| p.at)
                        .into_iter()
                        .chain(t.fixed_end())
                })
                .max()
                .unwrap_or(0);
            work + pauses + setups + latest_fixed
        });

        Ok(Instance {
            jobs: self.jobs,
            outages,
            setup: self.setup,
            machine_count,
            horizon,
        })
    }

    /// Rejects dependency cycles. Implicit chain edges (previous task of the
    /// job -> task, for tasks without explicit dependencies) and explicit
    /// dependency edges go into one petgraph DAG; a failed toposort means a
    /// cycle.
    fn check_acyclic(&self) -> Result<(), InstanceError> {
        let mut graph = DiGraph::<(), ()>::new();
        let mut first_node = Vec::with_capacity(self.jobs.len());
        let mut count = 0usize;
        for j in &self.jobs {
            first_node.push(count);
            count += j.len();
        }
        let nodes: Vec<_> = (0..count).map(|_| graph.add_node(())).collect();

        for (job, j) in self.jobs.iter().enumerate() {
            for (index, t) in j.tasks().iter().enumerate() {
                let node = nodes[first_node[job] + index];
                if t.dependencies().is_empty() {
                    if index > 0 {
                        graph.add_edge(nodes[first_node[job] + index - 1], node, ());
                    }
                } else {
                    for dep in t.dependencies() {
                        let on = nodes[first_node[dep.on.job] + dep.on.index];
                        graph.add_edge(on, node, ());
                    }
                }
            }
        }

        toposort(&graph, None)
            .map(|_| ())
            .map_err(|_| InstanceError::DependencyCycle)
    }
}

fn outages_len(outages: &[Vec<Outage>], machine: MachineId) -> Vec<i64> {
    outages
        .get(machine)
        .map(|ws| ws.iter().map(Outage::len).collect())
        .unwrap_or_default()
}
