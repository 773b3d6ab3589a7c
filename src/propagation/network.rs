use crate::domain::{Activity, DomainEmpty, DomainStore, VarId};
use crate::instance::{Instance, Outage, SetupTable};
use crate::{JobId, MachineId};

/// Variable bundle of one task: its candidate activities and, when there is
/// a real choice, the selector ranging over alternative indices.
#[derive(Debug)]
pub(crate) struct TaskNode {
    pub job: JobId,
    pub index: usize,
    pub acts: Vec<usize>,
    pub selector: Option<VarId>,
}

/// Per-machine grouping: candidate activities, outage windows, and the
/// sequence prefix fixed so far by the search.
#[derive(Debug)]
pub(crate) struct MachineNode {
    pub acts: Vec<usize>,
    pub outages: Vec<Outage>,
    pub ranked: Vec<usize>,
    pub constraint: Option<u32>,
}

/// How a precedence link reads its lower bound off the predecessor.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Link {
    /// Successor starts at or after the predecessor ends (job chain).
    AfterEnd,
    /// Successor starts at or after the predecessor starts plus `delay`
    /// (explicit dependency).
    AfterStart { delay: i64 },
}

#[derive(Debug, Clone, Copy)]
pub(super) enum Constraint {
    Span { act: usize },
    Outage { act: usize },
    Selector { task: usize },
    Precedence { pred: usize, succ: usize, link: Link },
    Disjunctive { machine: MachineId },
    Objective,
}

/// The constraint store the search operates on.
///
/// Owns the variable store, the activity arena, and the constraint
/// descriptors. Self-contained: compiling copies what it needs from the
/// instance, so the solver carries no borrow of it.
#[derive(Debug)]
pub(crate) struct Network {
    pub store: DomainStore,
    pub acts: Vec<Activity>,
    pub tasks: Vec<TaskNode>,
    pub machines: Vec<MachineNode>,
    pub makespan: VarId,
    /// Incumbent cap: the makespan may not exceed this (best found - 1).
    /// Survives backtracking on purpose.
    pub cap: Option<i64>,
    constraints: Vec<Constraint>,
    objective: u32,
    setup: SetupTable,
}

impl Network {
    pub fn compile(instance: &Instance) -> Self {
        let horizon = instance.horizon();
        let mut store = DomainStore::new();
        let makespan = store.new_var(0, horizon);

        let mut acts: Vec<Activity> = Vec::new();
        let mut tasks: Vec<TaskNode> = Vec::new();
        let mut machines: Vec<MachineNode> = (0..instance.machine_count())
            .map(|m| MachineNode {
                acts: Vec::new(),
                outages: instance.outages(m).to_vec(),
                ranked: Vec::new(),
                constraint: None,
            })
            .collect();

        for r in instance.task_refs() {
            let t = instance.task(r).expect("instance is validated");
            let task_idx = tasks.len();
            let mut node = TaskNode {
                job: r.job,
                index: r.index,
                acts: Vec::new(),
                selector: None,
            };

            // A pinned start nails the machine choice as well: alternatives
            // on other machines are not materialized at all.
            let kept: Vec<(usize, MachineId, i64)> = t
                .alternatives()
                .iter()
                .enumerate()
                .filter(|(_, a)| t.pinned_start().is_none_or(|p| a.machine == p.machine))
                .map(|(k, a)| (k, a.machine, a.duration))
                .collect();
            let mandatory = kept.len() == 1;

            for (alt, machine, base_duration) in kept {
                let pause: i64 = machines[machine].outages.iter().map(Outage::len).sum();
                let start = match t.pinned_start() {
                    Some(p) => store.new_var(p.at, p.at),
                    None => store.new_var(0, horizon),
                };
                let end = match t.fixed_end() {
                    Some(at) => store.new_var(at, at),
                    None => store.new_var(0, horizon),
                };
                let duration = store.new_var(base_duration, base_duration + pause);
                let performed = if mandatory {
                    store.new_var(1, 1)
                } else {
                    store.new_var(0, 1)
                };
                acts.push(Activity {
                    start,
                    end,
                    duration,
                    performed,
                    base_duration,
                    machine,
                    family: t.family(),
                    task: task_idx,
                    alt,
                });
                node.acts.push(acts.len() - 1);
                machines[machine].acts.push(acts.len() - 1);
            }

            if node.acts.len() > 1 {
                node.selector = Some(store.new_var(0, node.acts.len() as i64 - 1));
            }
            tasks.push(node);
        }

        let mut constraints: Vec<Constraint> = Vec::new();

        for (i, a) in acts.iter().enumerate() {
            let cid = constraints.len() as u32;
            constraints.push(Constraint::Span { act: i });
            store.watch(a.start, cid);
            store.watch(a.end, cid);
            store.watch(a.duration, cid);
        }

        for (i, a) in acts.iter().enumerate() {
            if machines[a.machine].outages.is_empty() {
                continue;
            }
            let cid = constraints.len() as u32;
            constraints.push(Constraint::Outage { act: i });
            store.watch(a.start, cid);
            store.watch(a.end, cid);
            store.watch(a.duration, cid);
            store.watch(a.performed, cid);
        }

        for (i, node) in tasks.iter().enumerate() {
            let Some(selector) = node.selector else { continue };
            let cid = constraints.len() as u32;
            constraints.push(Constraint::Selector { task: i });
            store.watch(selector, cid);
            for &aid in &node.acts {
                store.watch(acts[aid].performed, cid);
            }
        }

        // Precedence mirrors the validated dependency DAG: implicit
        // end-to-start chain within a job unless the task declares explicit
        // start-to-start links, each expanded over both alternative sets.
        let mut first_task = Vec::with_capacity(instance.jobs().len());
        let mut count = 0usize;
        for j in instance.jobs() {
            first_task.push(count);
            count += j.len();
        }
        for r in instance.task_refs() {
            let t = instance.task(r).expect("instance is validated");
            let this = first_task[r.job] + r.index;
            let mut links: Vec<(usize, Link)> = Vec::new();
            if t.dependencies().is_empty() {
                if r.index > 0 {
                    links.push((this - 1, Link::AfterEnd));
                }
            } else {
                for dep in t.dependencies() {
                    let on = first_task[dep.on.job] + dep.on.index;
                    links.push((on, Link::AfterStart { delay: dep.delay }));
                }
            }
            for (pred_task, link) in links {
                for &pred in &tasks[pred_task].acts {
                    for &succ in &tasks[this].acts {
                        let cid = constraints.len() as u32;
                        constraints.push(Constraint::Precedence { pred, succ, link });
                        store.watch(acts[pred].start, cid);
                        store.watch(acts[pred].end, cid);
                        store.watch(acts[pred].performed, cid);
                        store.watch(acts[succ].start, cid);
                        store.watch(acts[succ].performed, cid);
                    }
                }
            }
        }

        for (m, node) in machines.iter_mut().enumerate() {
            if node.acts.len() < 2 {
                continue;
            }
            let cid = constraints.len() as u32;
            constraints.push(Constraint::Disjunctive { machine: m });
            node.constraint = Some(cid);
            for &aid in &node.acts {
                store.watch(acts[aid].start, cid);
                store.watch(acts[aid].end, cid);
                store.watch(acts[aid].performed, cid);
            }
        }

        let objective = constraints.len() as u32;
        constraints.push(Constraint::Objective);
        store.watch(makespan, objective);
        for a in &acts {
            store.watch(a.end, objective);
            store.watch(a.performed, objective);
        }

        store.set_constraint_count(constraints.len());

        Self {
            store,
            acts,
            tasks,
            machines,
            makespan,
            cap: None,
            constraints,
            objective,
            setup: instance.setup().clone(),
        }
    }

    /// Drains the propagation queue to a fixed point.
    ///
    /// On wipeout the queue is discarded; the caller backtracks and the
    /// trail restores every narrowing done here.
    pub fn propagate(&mut self) -> Result<(), DomainEmpty> {
        while let Some(cid) = self.store.pop_queued() {
            let result = match self.constraints[cid as usize] {
                Constraint::Span { act } => self.filter_span(act),
                Constraint::Outage { act } => self.filter_outage(act),
                Constraint::Selector { task } => self.filter_selector(task),
                Constraint::Precedence { pred, succ, link } => {
                    self.filter_precedence(pred, succ, link)
                }
                Constraint::Disjunctive { machine } => self.filter_disjunctive(machine),
                Constraint::Objective => self.filter_objective(),
            };
            if result.is_err() {
                self.store.clear_queue();
                return result;
            }
        }
        Ok(())
    }

    /// Enqueues every constraint and propagates. Used once at the root.
    pub fn propagate_all(&mut self) -> Result<(), DomainEmpty> {
        for cid in 0..self.constraints.len() as u32 {
            self.store.enqueue(cid);
        }
        self.propagate()
    }

    /// Re-arms the objective filter, e.g. after the incumbent cap moved.
    pub fn enqueue_objective(&mut self) {
        self.store.enqueue(self.objective);
    }

    /// Appends `act` to the fixed sequence prefix of `machine`.
    pub fn rank(&mut self, machine: MachineId, act: usize) {
        self.machines[machine].ranked.push(act);
        if let Some(cid) = self.machines[machine].constraint {
            self.store.enqueue(cid);
        }
    }

    /// Reverts the latest [`rank`](Self::rank) on `machine`.
    pub fn unrank(&mut self, machine: MachineId) {
        self.machines[machine].ranked.pop();
    }

    /// Directional setup time between two consecutive activities.
    pub fn setup_between(&self, first: usize, second: usize) -> i64 {
        self.setup
            .between(self.acts[first].family, self.acts[second].family)
    }

    /// Converts a local wipeout on an optional activity into "this
    /// alternative is not performed"; on a mandatory one it is a real
    /// conflict.
    pub(super) fn deactivate_or_fail(&mut self, act: usize) -> Result<(), DomainEmpty> {
        let performed = self.acts[act].performed;
        if self.store.min(performed) == 1 {
            return Err(DomainEmpty);
        }
        self.store.set_max(performed, 0)
    }
}
