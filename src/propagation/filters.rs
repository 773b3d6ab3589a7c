//! Filtering rules for each constraint kind.
//!
//! All rules are bounds-consistent and monotone: they only ever tighten.
//! A rule that would wipe out an *optional* activity's domain instead turns
//! the activity off (`performed := 0`), so an unchosen alternative can never
//! make the whole search look infeasible.

use crate::domain::{Activity, DomainEmpty, DomainStore};
use crate::instance::Outage;
use crate::MachineId;

use super::network::{Link, Network};

impl Network {
    /// `start + duration = end`, in all six bound directions.
    pub(super) fn filter_span(&mut self, act: usize) -> Result<(), DomainEmpty> {
        let a = self.acts[act];
        if !a.may_perform(&self.store) {
            return Ok(());
        }
        if Self::span_bounds(&mut self.store, a).is_err() {
            return self.deactivate_or_fail(act);
        }
        Ok(())
    }

    fn span_bounds(store: &mut DomainStore, a: Activity) -> Result<(), DomainEmpty> {
        let (smin, smax) = (store.min(a.start), store.max(a.start));
        let (dmin, dmax) = (store.min(a.duration), store.max(a.duration));
        let (emin, emax) = (store.min(a.end), store.max(a.end));
        store.set_min(a.end, smin + dmin)?;
        store.set_max(a.end, smax + dmax)?;
        store.set_min(a.start, emin - dmax)?;
        store.set_max(a.start, emax - dmin)?;
        store.set_min(a.duration, emin - smax)?;
        store.set_max(a.duration, emax - smin)?;
        Ok(())
    }

    /// Outage windows of the activity's machine: the start may not lie in
    /// `[ws, we-1]`, the end may not lie in `[ws+1, we]`, and the duration
    /// grows by the length of every window the activity spans
    /// (`start < ws < end`), i.e. the work pauses across the gap.
    pub(super) fn filter_outage(&mut self, act: usize) -> Result<(), DomainEmpty> {
        let a = self.acts[act];
        if !a.may_perform(&self.store) {
            return Ok(());
        }
        let result =
            Self::outage_bounds(&mut self.store, &self.machines[a.machine].outages, a);
        if result.is_err() {
            return self.deactivate_or_fail(act);
        }
        Ok(())
    }

    fn outage_bounds(
        store: &mut DomainStore,
        windows: &[Outage],
        a: Activity,
    ) -> Result<(), DomainEmpty> {
        // Hole punching on the bounds. Windows are disjoint and ascending,
        // so one directed sweep per bound is enough.
        let mut smin = store.min(a.start);
        for w in windows {
            if smin >= w.start && smin <= w.end - 1 {
                smin = w.end;
            }
        }
        store.set_min(a.start, smin)?;

        let mut smax = store.max(a.start);
        for w in windows.iter().rev() {
            if smax >= w.start && smax <= w.end - 1 {
                smax = w.start - 1;
            }
        }
        store.set_max(a.start, smax)?;

        let mut emin = store.min(a.end);
        for w in windows {
            if emin >= w.start + 1 && emin <= w.end {
                emin = w.end + 1;
            }
        }
        store.set_min(a.end, emin)?;

        let mut emax = store.max(a.end);
        for w in windows.iter().rev() {
            if emax >= w.start + 1 && emax <= w.end {
                emax = w.start;
            }
        }
        store.set_max(a.end, emax)?;

        if let Some(s) = store.value(a.start) {
            // Start is decided: the spanned windows, and with them the
            // inflated duration, are now exact. Ascending order matters -
            // inflating across one window can reach into the next.
            let mut d = a.base_duration;
            for w in windows {
                if s < w.start && w.start < s + d {
                    d += w.len();
                }
            }
            store.fix(a.duration, d)?;
        } else {
            let mut certain = 0;
            let mut possible = 0;
            for w in windows {
                if store.min(a.start) < w.start && w.start < store.max(a.end) {
                    possible += w.len();
                }
                if store.max(a.start) < w.start && w.start < store.min(a.end) {
                    certain += w.len();
                }
            }
            store.set_min(a.duration, a.base_duration + certain)?;
            store.set_max(a.duration, a.base_duration + possible)?;
        }
        Ok(())
    }

    /// Channels `selector = k` with "alternative k is performed, all others
    /// are not". Impossible alternatives shrink the selector from its
    /// bounds; a forced alternative decides it outright.
    pub(super) fn filter_selector(&mut self, task: usize) -> Result<(), DomainEmpty> {
        let Some(selector) = self.tasks[task].selector else {
            return Ok(());
        };

        let n = self.tasks[task].acts.len();
        for k in 0..n {
            let aid = self.tasks[task].acts[k];
            let performed = self.acts[aid].performed;
            if self.store.min(performed) == 1 {
                self.store.fix(selector, k as i64)?;
            }
        }

        let mut lo = self.store.min(selector);
        let mut hi = self.store.max(selector);
        while lo <= hi {
            let aid = self.tasks[task].acts[lo as usize];
            if self.store.max(self.acts[aid].performed) == 0 {
                lo += 1;
            } else {
                break;
            }
        }
        while hi >= lo {
            let aid = self.tasks[task].acts[hi as usize];
            if self.store.max(self.acts[aid].performed) == 0 {
                hi -= 1;
            } else {
                break;
            }
        }
        if lo > hi {
            return Err(DomainEmpty);
        }
        self.store.set_min(selector, lo)?;
        self.store.set_max(selector, hi)?;

        if lo == hi {
            for k in 0..n {
                let aid = self.tasks[task].acts[k];
                let performed = self.acts[aid].performed;
                if k as i64 == lo {
                    self.store.set_min(performed, 1)?;
                } else {
                    self.store.set_max(performed, 0)?;
                }
            }
        }
        Ok(())
    }

    /// A precedence link between two candidate activities, active only when
    /// both sides run. With the predecessor committed, a successor that can
    /// no longer satisfy the bound is turned off rather than failed.
    pub(super) fn filter_precedence(
        &mut self,
        pred: usize,
        succ: usize,
        link: Link,
    ) -> Result<(), DomainEmpty> {
        let p = self.acts[pred];
        let s = self.acts[succ];
        if !p.may_perform(&self.store) || !s.may_perform(&self.store) {
            return Ok(());
        }

        if p.is_performed(&self.store) {
            let lb = match link {
                Link::AfterEnd => self.store.min(p.end),
                Link::AfterStart { delay } => self.store.min(p.start) + delay,
            };
            if lb > self.store.max(s.start) {
                return self.deactivate_or_fail(succ);
            }
            if s.is_performed(&self.store) {
                self.store.set_min(s.start, lb)?;
            }
        }

        if p.is_performed(&self.store) && s.is_performed(&self.store) {
            let start_max = self.store.max(s.start);
            match link {
                Link::AfterEnd => self.store.set_max(p.end, start_max)?,
                Link::AfterStart { delay } => self.store.set_max(p.start, start_max - delay)?,
            }
        }
        Ok(())
    }

    /// Mutual exclusion on one machine with directional setup times.
    ///
    /// Three rules: bounds along the ranked prefix, "everything unranked
    /// runs after the last ranked activity", and the pairwise disjunction
    /// `a.end + setup(a,b) <= b.start  or  b.end + setup(b,a) <= a.start`
    /// for performed unranked pairs. Activities that are off or still
    /// undecided exert no constraint on the others.
    pub(super) fn filter_disjunctive(&mut self, machine: MachineId) -> Result<(), DomainEmpty> {
        let ranked = self.machines[machine].ranked.clone();
        for pair in ranked.windows(2) {
            let (first, second) = (pair[0], pair[1]);
            let setup = self.setup_between(first, second);
            let first_end = self.acts[first].end;
            let second_start = self.acts[second].start;
            let lb = self.store.min(first_end) + setup;
            self.store.set_min(second_start, lb)?;
            let ub = self.store.max(second_start) - setup;
            self.store.set_max(first_end, ub)?;
        }

        let unranked: Vec<usize> = self.machines[machine]
            .acts
            .iter()
            .copied()
            .filter(|aid| !ranked.contains(aid))
            .collect();

        if let Some(&last) = ranked.last() {
            for &u in &unranked {
                let a = self.acts[u];
                if !a.may_perform(&self.store) {
                    continue;
                }
                let lb = self.store.min(self.acts[last].end) + self.setup_between(last, u);
                if a.is_performed(&self.store) {
                    self.store.set_min(a.start, lb)?;
                } else if lb > self.store.max(a.start) {
                    self.deactivate_or_fail(u)?;
                }
            }
        }

        for i in 0..unranked.len() {
            for j in (i + 1)..unranked.len() {
                let (x, y) = (unranked[i], unranked[j]);
                let (ax, ay) = (self.acts[x], self.acts[y]);
                if !ax.is_performed(&self.store) || !ay.is_performed(&self.store) {
                    continue;
                }
                let setup_xy = self.setup_between(x, y);
                let setup_yx = self.setup_between(y, x);
                let xy_possible =
                    self.store.min(ax.end) + setup_xy <= self.store.max(ay.start);
                let yx_possible =
                    self.store.min(ay.end) + setup_yx <= self.store.max(ax.start);
                match (xy_possible, yx_possible) {
                    (false, false) => return Err(DomainEmpty),
                    (true, false) => {
                        let lb = self.store.min(ax.end) + setup_xy;
                        self.store.set_min(ay.start, lb)?;
                        let ub = self.store.max(ay.start) - setup_xy;
                        self.store.set_max(ax.end, ub)?;
                    }
                    (false, true) => {
                        let lb = self.store.min(ay.end) + setup_yx;
                        self.store.set_min(ax.start, lb)?;
                        let ub = self.store.max(ax.start) - setup_yx;
                        self.store.set_max(ay.end, ub)?;
                    }
                    (true, true) => {}
                }
            }
        }
        Ok(())
    }

    /// `makespan = max(performed ? end : 0)`, plus the incumbent cap.
    pub(super) fn filter_objective(&mut self) -> Result<(), DomainEmpty> {
        if let Some(cap) = self.cap {
            self.store.set_max(self.makespan, cap)?;
        }

        let mut lower = 0i64;
        let mut upper = 0i64;
        for i in 0..self.acts.len() {
            let a = self.acts[i];
            if !a.may_perform(&self.store) {
                continue;
            }
            if a.is_performed(&self.store) {
                lower = lower.max(self.store.min(a.end));
            }
            upper = upper.max(self.store.max(a.end));
        }
        self.store.set_min(self.makespan, lower)?;
        self.store.set_max(self.makespan, upper)?;

        let latest = self.store.max(self.makespan);
        for i in 0..self.acts.len() {
            let a = self.acts[i];
            if !a.may_perform(&self.store) {
                continue;
            }
            if a.is_performed(&self.store) {
                self.store.set_max(a.end, latest)?;
            } else if self.store.min(a.end) > latest {
                self.deactivate_or_fail(i)?;
            }
        }
        Ok(())
    }
}
