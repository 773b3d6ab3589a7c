//! Directional setup times between setup families.

use std::collections::BTreeMap;

/// Setup time charged when a machine switches to a new setup family.
///
/// The cost is keyed by the family of the activity *about to run*: retooling
/// for the next job is what takes time, not putting the previous one away.
/// Consecutive activities of the same family cost nothing, and families
/// absent from the table cost nothing to switch to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SetupTable {
    times: BTreeMap<u32, i64>,
}

impl SetupTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the time needed to retool for `family`.
    pub fn with_time(mut self, family: u32, time: i64) -> Self {
        self.times.insert(family, time);
        self
    }

    /// Time needed to retool for `family`; 0 when unlisted.
    pub fn time(&self, family: u32) -> i64 {
        self.times.get(&family).copied().unwrap_or(0)
    }

    /// Setup time between two consecutive activities, directional.
    pub fn between(&self, from_family: u32, to_family: u32) -> i64 {
        if from_family == to_family {
            0
        } else {
            self.time(to_family)
        }
    }

    /// The first negative entry, if any. Used by instance validation.
    pub(crate) fn first_negative(&self) -> Option<u32> {
        self.times
            .iter()
            .find(|(_, &t)| t < 0)
            .map(|(&family, _)| family)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_family_is_free() {
        let table = SetupTable::new().with_time(1, 7);
        assert_eq!(table.between(1, 1), 0);
    }

    #[test]
    fn switch_cost_keyed_by_successor() {
        let table = SetupTable::new().with_time(0, 2).with_time(1, 7);
        assert_eq!(table.between(0, 1), 7);
        assert_eq!(table.between(1, 0), 2);
    }

    #[test]
    fn unlisted_family_costs_nothing() {
        let table = SetupTable::new().with_time(0, 2);
        assert_eq!(table.between(0, 9), 0);
    }

    #[test]
    fn negative_entry_is_reported() {
        let table = SetupTable::new().with_time(3, -1);
        assert_eq!(table.first_negative(), Some(3));
        assert_eq!(SetupTable::new().first_negative(), None);
    }
}
