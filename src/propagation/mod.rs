//! The compiled constraint network.
//!
//! [`Network::compile`] turns a validated [`Instance`](crate::instance::Instance)
//! into an arena of activities plus a list of constraint descriptors:
//!
//! - `Span`: `start + duration = end` per activity
//! - `Outage`: forbidden start/end positions and duration inflation across
//!   a machine's outage windows
//! - `Selector`: one alternative per task is performed, channeled through
//!   an integer choice variable
//! - `Precedence`: end-to-start job chains and start-to-start dependency
//!   links, reified on the performed flags of both sides
//! - `Disjunctive`: per-machine mutual exclusion with directional setup
//!   times, plus the chain bounds of the sequence prefix fixed by search
//! - `Objective`: the makespan as the max over performed ends, including
//!   the incumbent cap during branch-and-bound
//!
//! Constraints register as watchers of the variables they read; narrowing a
//! variable enqueues its watchers, and [`Network::propagate`] drains the
//! queue to a fixed point before the search branches again.

mod filters;
mod network;

pub(crate) use network::{Link, Network};
