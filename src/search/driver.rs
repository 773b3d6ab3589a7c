//! The decision loop: phases, choice points, and backtracking.

use std::time::Instant;

use crate::domain::DomainEmpty;
use crate::instance::TaskRef;
use crate::solution::{MachineTimeline, ScheduledOp, Solution};

use super::Solver;

/// One branching step. Alternatives of a choice point are materialized when
/// the frame is opened, so retrying after a backtrack sees the same list.
#[derive(Debug, Clone, Copy)]
pub(super) enum Decision {
    /// Selector of `task` takes alternative `alt`.
    Choose { task: usize, alt: usize },
    /// `act` runs next on `machine`, after the ranked prefix and before
    /// everything still unranked.
    Rank { machine: usize, act: usize },
    /// Makespan is bound to its lower bound...
    BindMakespan { at: i64 },
    /// ...or proven unreachable, and pushed past it.
    RaiseMakespan { to: i64 },
    /// `act` starts at its earliest instant...
    PlaceStart { act: usize, at: i64 },
    /// ...or is pushed past it when the earliest placement conflicts.
    DelayStart { act: usize, to: i64 },
}

/// A choice point: the alternatives of one decision and how many have been
/// tried. The alternative at `next - 1` is currently applied.
#[derive(Debug)]
pub(super) struct Frame {
    alts: Vec<Decision>,
    next: usize,
}

impl Solver {
    /// Resumes the search and returns the next strictly improving solution,
    /// or `None` once the space or the budget is exhausted.
    pub fn next_improving(&mut self) -> Option<Solution> {
        if self.exhausted || self.limit_hit {
            return None;
        }
        if !self.initialized {
            self.initialized = true;
            self.started = Some(Instant::now());
            if self.net.propagate_all().is_err() {
                self.exhausted = true;
                return None;
            }
        }
        if self.resume_backtrack {
            self.resume_backtrack = false;
            if !self.backtrack() {
                self.exhausted = true;
                return None;
            }
        }
        loop {
            if self.out_of_budget() {
                self.limit_hit = true;
                return None;
            }
            match self.next_decision() {
                Some(alts) => {
                    self.frames.push(Frame { alts, next: 0 });
                    if !self.advance_top() {
                        self.frames.pop();
                        if !self.backtrack() {
                            self.exhausted = true;
                            return None;
                        }
                    }
                }
                None => {
                    let solution = self.extract();
                    self.net.cap = Some(solution.makespan() - 1);
                    self.stats.solutions += 1;
                    self.best = Some(solution.clone());
                    self.resume_backtrack = true;
                    return Some(solution);
                }
            }
        }
    }

    fn out_of_budget(&self) -> bool {
        if self
            .limits
            .decisions
            .is_some_and(|n| self.stats.decisions >= n)
        {
            return true;
        }
        match (self.limits.wall_clock, self.started) {
            (Some(budget), Some(started)) => started.elapsed() >= budget,
            _ => false,
        }
    }

    /// The next open choice point, phase by phase. `None` means the current
    /// assignment is complete.
    fn next_decision(&self) -> Option<Vec<Decision>> {
        if let Some(alts) = self.pick_selector() {
            return Some(alts);
        }
        if let Some(alts) = self.pick_sequence() {
            return Some(alts);
        }
        if !self.net.store.is_fixed(self.net.makespan) {
            let at = self.net.store.min(self.net.makespan);
            return Some(vec![
                Decision::BindMakespan { at },
                Decision::RaiseMakespan { to: at + 1 },
            ]);
        }
        self.pick_settle()
    }

    /// Phase 1: the unfixed selector with the fewest live candidates, ties
    /// broken towards the lowest candidate value; alternatives ascending.
    fn pick_selector(&self) -> Option<Vec<Decision>> {
        let store = &self.net.store;
        let mut pick: Option<(usize, usize, i64)> = None;
        for (task, node) in self.net.tasks.iter().enumerate() {
            let Some(selector) = node.selector else { continue };
            if store.is_fixed(selector) {
                continue;
            }
            let mut size = 0usize;
            let mut lowest = i64::MAX;
            for k in store.min(selector)..=store.max(selector) {
                let act = self.net.acts[node.acts[k as usize]];
                if act.may_perform(store) {
                    size += 1;
                    lowest = lowest.min(k);
                }
            }
            if pick.is_none_or(|(_, s, l)| (size, lowest) < (s, l)) {
                pick = Some((task, size, lowest));
            }
        }
        let (task, ..) = pick?;
        let node = &self.net.tasks[task];
        let selector = node.selector?;
        let alts = (store.min(selector)..=store.max(selector))
            .filter(|&k| self.net.acts[node.acts[k as usize]].may_perform(store))
            .map(|k| Decision::Choose {
                task,
                alt: k as usize,
            })
            .collect();
        Some(alts)
    }

    /// Phase 2: the first machine whose sequence is still partial; the next
    /// slot is offered to every unranked performed activity, earliest
    /// feasible start first, ties by creation order.
    fn pick_sequence(&self) -> Option<Vec<Decision>> {
        let store = &self.net.store;
        for (machine, node) in self.net.machines.iter().enumerate() {
            let mut candidates: Vec<usize> = node
                .acts
                .iter()
                .copied()
                .filter(|&a| {
                    self.net.acts[a].is_performed(store) && !node.ranked.contains(&a)
                })
                .collect();
            if candidates.is_empty() {
                continue;
            }
            candidates.sort_by_key(|&a| (store.min(self.net.acts[a].start), a));
            return Some(
                candidates
                    .into_iter()
                    .map(|act| Decision::Rank { machine, act })
                    .collect(),
            );
        }
        None
    }

    /// Final phase: pin every performed activity to its earliest start.
    fn pick_settle(&self) -> Option<Vec<Decision>> {
        let store = &self.net.store;
        let mut pick: Option<(i64, usize)> = None;
        for (i, a) in self.net.acts.iter().enumerate() {
            if !a.is_performed(store) || store.is_fixed(a.start) {
                continue;
            }
            let key = (store.min(a.start), i);
            if pick.is_none_or(|p| key < p) {
                pick = Some(key);
            }
        }
        let (at, act) = pick?;
        Some(vec![
            Decision::PlaceStart { act, at },
            Decision::DelayStart { act, to: at + 1 },
        ])
    }

    /// Applies the next untried alternative of the top frame, skipping ones
    /// that fail propagation. False when the frame has no alternative left.
    fn advance_top(&mut self) -> bool {
        while let Some(frame) = self.frames.last_mut() {
            if frame.next >= frame.alts.len() {
                return false;
            }
            let decision = frame.alts[frame.next];
            frame.next += 1;
            if self.apply(decision) {
                return true;
            }
        }
        false
    }

    /// Unwinds to the nearest choice point with an untried alternative.
    /// False when the whole search space is exhausted.
    fn backtrack(&mut self) -> bool {
        while let Some(frame) = self.frames.last() {
            let applied = frame.alts[frame.next - 1];
            self.undo(applied);
            if self.advance_top() {
                return true;
            }
            self.frames.pop();
        }
        false
    }

    /// One node expansion: mark the trail, post the decision, propagate to
    /// a fixed point. A conflict rolls everything back.
    fn apply(&mut self, decision: Decision) -> bool {
        self.stats.decisions += 1;
        self.net.store.mark();
        if self.post(decision).is_ok() {
            true
        } else {
            self.stats.failures += 1;
            self.undo(decision);
            false
        }
    }

    fn post(&mut self, decision: Decision) -> Result<(), DomainEmpty> {
        match decision {
            Decision::Choose { task, alt } => {
                if let Some(selector) = self.net.tasks[task].selector {
                    self.net.store.fix(selector, alt as i64)?;
                }
            }
            Decision::Rank { machine, act } => self.net.rank(machine, act),
            Decision::BindMakespan { at } => {
                let makespan = self.net.makespan;
                self.net.store.fix(makespan, at)?;
            }
            Decision::RaiseMakespan { to } => {
                let makespan = self.net.makespan;
                self.net.store.set_min(makespan, to)?;
            }
            Decision::PlaceStart { act, at } => {
                let start = self.net.acts[act].start;
                self.net.store.fix(start, at)?;
            }
            Decision::DelayStart { act, to } => {
                let start = self.net.acts[act].start;
                self.net.store.set_min(start, to)?;
            }
        }
        // the incumbent cap is not trailed, so re-arm it on every node
        self.net.enqueue_objective();
        self.net.propagate()
    }

    fn undo(&mut self, decision: Decision) {
        self.net.store.undo_to_mark();
        if let Decision::Rank { machine, .. } = decision {
            self.net.unrank(machine);
        }
    }

    /// Snapshots the fully fixed assignment into a [`Solution`].
    fn extract(&self) -> Solution {
        let store = &self.net.store;
        let mut machines = Vec::with_capacity(self.net.machines.len());
        for (machine, node) in self.net.machines.iter().enumerate() {
            let mut ops = Vec::with_capacity(node.ranked.len());
            let mut prev: Option<usize> = None;
            for &aid in &node.ranked {
                let a = self.net.acts[aid];
                let owner = &self.net.tasks[a.task];
                ops.push(ScheduledOp {
                    task: TaskRef::new(owner.job, owner.index),
                    alternative: a.alt,
                    machine,
                    start: store.min(a.start),
                    end: store.min(a.end),
                    setup_before: prev.map_or(0, |p| self.net.setup_between(p, aid)),
                });
                prev = Some(aid);
            }
            machines.push(MachineTimeline { machine, ops });
        }
        Solution::new(store.min(self.net.makespan), machines)
    }
}
