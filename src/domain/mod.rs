//! Finite-domain variables for the scheduling engine.
//!
//! Every quantity the search decides on - activity starts, ends, durations,
//! performed flags, alternative selectors, the makespan - is an integer
//! bound variable in a single [`DomainStore`]. Narrowing is undoable through
//! a trail, and every change wakes the constraints watching the variable.

mod activity;
mod store;

pub(crate) use activity::Activity;
pub(crate) use store::{DomainEmpty, DomainStore, VarId};
