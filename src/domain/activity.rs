use crate::MachineId;

use super::store::{DomainStore, VarId};

/// One candidate execution of a task on one machine.
///
/// An activity bundles the start, end and duration variables of a
/// (task, alternative) pair with its 0/1 performed flag. `end = start +
/// duration` holds whenever the activity is performed; a non-performed
/// activity keeps its variables but exerts no constraint on anything.
/// The arena index of an activity doubles as its creation order, which is
/// the tie-breaker for machine sequencing.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Activity {
    pub start: VarId,
    pub end: VarId,
    pub duration: VarId,
    pub performed: VarId,
    /// Processing time before any outage inflation.
    pub base_duration: i64,
    pub machine: MachineId,
    pub family: u32,
    /// Global index of the owning task.
    pub task: usize,
    /// Position in the owning task's alternative list.
    pub alt: usize,
}

impl Activity {
    /// The activity will certainly run.
    pub fn is_performed(&self, store: &DomainStore) -> bool {
        store.min(self.performed) == 1
    }

    /// The activity might still run.
    pub fn may_perform(&self, store: &DomainStore) -> bool {
        store.max(self.performed) == 1
    }

    /// Start, end and duration are all singletons.
    pub fn is_fixed(&self, store: &DomainStore) -> bool {
        store.is_fixed(self.start) && store.is_fixed(self.end) && store.is_fixed(self.duration)
    }
}
