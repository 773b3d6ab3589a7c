//! Machine outage windows.

/// Half-open window `[start, end)` during which a machine cannot work.
///
/// An activity may not start inside `[start, end - 1]` nor end inside
/// `[start + 1, end]`; an activity whose span crosses the window pauses
/// for its whole length, so its duration grows by [`len`](Self::len).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Outage {
    pub start: i64,
    pub end: i64,
}

impl Outage {
    pub const fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub const fn len(&self) -> i64 {
        self.end - self.start
    }

    pub const fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Sorts windows by start and merges any that touch or overlap, so the
/// propagation code can assume disjoint ascending windows and inflation
/// never double-counts.
pub(crate) fn normalize(mut windows: Vec<Outage>) -> Vec<Outage> {
    windows.sort_by_key(|w| (w.start, w.end));
    let mut merged: Vec<Outage> = Vec::with_capacity(windows.len());
    for w in windows {
        match merged.last_mut() {
            Some(prev) if w.start <= prev.end => prev.end = prev.end.max(w.end),
            _ => merged.push(w),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_length() {
        assert_eq!(Outage::new(10, 15).len(), 5);
        assert!(Outage::new(4, 4).is_empty());
    }

    #[test]
    fn normalize_sorts_disjoint_windows() {
        let w = normalize(vec![Outage::new(20, 25), Outage::new(3, 7)]);
        assert_eq!(w, vec![Outage::new(3, 7), Outage::new(20, 25)]);
    }

    #[test]
    fn normalize_merges_overlap_and_touch() {
        let w = normalize(vec![
            Outage::new(0, 5),
            Outage::new(4, 9),
            Outage::new(9, 12),
            Outage::new(30, 31),
        ]);
        assert_eq!(w, vec![Outage::new(0, 12), Outage::new(30, 31)]);
    }
}
