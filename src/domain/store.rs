use std::collections::VecDeque;

use thiserror::Error;

/// A narrowing operation would have emptied a variable's interval.
///
/// This is the engine's backtracking token: it is always recovered at the
/// nearest choice point and never surfaces through the public API.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("domain wipeout")]
pub(crate) struct DomainEmpty;

/// Handle of a variable inside a [`DomainStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct VarId(u32);

#[derive(Debug, Clone, Copy)]
struct Bounds {
    min: i64,
    max: i64,
}

/// Interval domains with a trail and a propagation queue.
///
/// Variables hold integer bounds `[min, max]`. Tightening a bound records
/// the previous bounds on the trail and wakes every constraint watching the
/// variable; [`undo_to_mark`](Self::undo_to_mark) restores all changes made
/// since the matching [`mark`](Self::mark). The model itself is never
/// copied - backtracking is purely trail-driven.
#[derive(Debug, Default)]
pub(crate) struct DomainStore {
    bounds: Vec<Bounds>,
    watchers: Vec<Vec<u32>>,
    trail: Vec<(u32, Bounds)>,
    marks: Vec<usize>,
    queue: VecDeque<u32>,
    queued: Vec<bool>,
}

impl DomainStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_var(&mut self, min: i64, max: i64) -> VarId {
        debug_assert!(min <= max, "variable created empty");
        self.bounds.push(Bounds { min, max });
        self.watchers.push(Vec::new());
        VarId(self.bounds.len() as u32 - 1)
    }

    /// Declares `count` constraints so they can be queued. Call once after
    /// the network is wired.
    pub fn set_constraint_count(&mut self, count: usize) {
        self.queued = vec![false; count];
    }

    pub fn min(&self, v: VarId) -> i64 {
        self.bounds[v.0 as usize].min
    }

    pub fn max(&self, v: VarId) -> i64 {
        self.bounds[v.0 as usize].max
    }

    pub fn is_fixed(&self, v: VarId) -> bool {
        let b = self.bounds[v.0 as usize];
        b.min == b.max
    }

    /// The singleton value, if the variable is fixed.
    pub fn value(&self, v: VarId) -> Option<i64> {
        let b = self.bounds[v.0 as usize];
        (b.min == b.max).then_some(b.min)
    }

    /// Registers `constraint` to be re-run whenever `v` changes.
    pub fn watch(&mut self, v: VarId, constraint: u32) {
        self.watchers[v.0 as usize].push(constraint);
    }

    pub fn set_min(&mut self, v: VarId, lo: i64) -> Result<(), DomainEmpty> {
        let b = self.bounds[v.0 as usize];
        if lo <= b.min {
            return Ok(());
        }
        if lo > b.max {
            return Err(DomainEmpty);
        }
        self.trail.push((v.0, b));
        self.bounds[v.0 as usize].min = lo;
        self.wake(v);
        Ok(())
    }

    pub fn set_max(&mut self, v: VarId, hi: i64) -> Result<(), DomainEmpty> {
        let b = self.bounds[v.0 as usize];
        if hi >= b.max {
            return Ok(());
        }
        if hi < b.min {
            return Err(DomainEmpty);
        }
        self.trail.push((v.0, b));
        self.bounds[v.0 as usize].max = hi;
        self.wake(v);
        Ok(())
    }

    pub fn fix(&mut self, v: VarId, value: i64) -> Result<(), DomainEmpty> {
        self.set_min(v, value)?;
        self.set_max(v, value)
    }

    fn wake(&mut self, v: VarId) {
        for i in 0..self.watchers[v.0 as usize].len() {
            let cid = self.watchers[v.0 as usize][i];
            self.enqueue(cid);
        }
    }

    pub fn enqueue(&mut self, constraint: u32) {
        if !self.queued[constraint as usize] {
            self.queued[constraint as usize] = true;
            self.queue.push_back(constraint);
        }
    }

    pub fn pop_queued(&mut self) -> Option<u32> {
        let cid = self.queue.pop_front()?;
        self.queued[cid as usize] = false;
        Some(cid)
    }

    pub fn clear_queue(&mut self) {
        while let Some(cid) = self.queue.pop_front() {
            self.queued[cid as usize] = false;
        }
    }

    /// Opens a choice point: every later change is undone by the matching
    /// [`undo_to_mark`](Self::undo_to_mark).
    pub fn mark(&mut self) {
        self.marks.push(self.trail.len());
    }

    /// Restores all bounds changed since the latest mark and drops any
    /// pending propagation.
    pub fn undo_to_mark(&mut self) {
        let mark = self.marks.pop().expect("undo without a mark");
        while self.trail.len() > mark {
            let (v, b) = self.trail.pop().expect("trail shorter than mark");
            self.bounds[v as usize] = b;
        }
        self.clear_queue();
    }
}
