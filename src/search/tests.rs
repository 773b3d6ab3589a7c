//! End-to-end solver tests: canonical scenarios, budgets, the improving
//! stream, and randomized schedule validity.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::instance::{Instance, InstanceBuilder, Task, TaskRef};
use crate::solution::Solution;

use super::{SearchLimits, Solver};

fn build(configure: impl FnOnce(&mut InstanceBuilder)) -> Instance {
    let mut b = Instance::builder();
    configure(&mut b);
    b.build().unwrap()
}

/// Checks every testable schedule property against the instance.
fn assert_valid(instance: &Instance, solution: &Solution) {
    // exactly one performed alternative per task
    for r in instance.task_refs() {
        let ops: Vec<_> = solution.ops().filter(|op| op.task == r).collect();
        assert_eq!(ops.len(), 1, "task {} scheduled {} times", r, ops.len());
        let op = ops[0];
        let task = instance.task(r).unwrap();
        let alt = task.alternatives()[op.alternative];
        assert_eq!(alt.machine, op.machine);

        // duration reflects outage inflation exactly
        let mut expected = alt.duration;
        for w in instance.outages(op.machine) {
            if op.start < w.start && w.start < op.start + expected {
                expected += w.len();
            }
        }
        assert_eq!(op.end - op.start, expected, "task {} duration", r);

        // start and end stay clear of outage interiors
        for w in instance.outages(op.machine) {
            assert!(
                op.start < w.start || op.start >= w.end,
                "task {} starts inside outage",
                r
            );
            assert!(
                op.end <= w.start || op.end > w.end,
                "task {} ends inside outage",
                r
            );
        }

        // precedence: explicit start-to-start links, or the implicit chain
        if task.dependencies().is_empty() {
            if r.index > 0 {
                let prev = solution.op_for(TaskRef::new(r.job, r.index - 1)).unwrap();
                assert!(op.start >= prev.end, "chain broken at {}", r);
            }
        } else {
            for dep in task.dependencies() {
                let other = solution.op_for(dep.on).unwrap();
                assert!(
                    op.start >= other.start + dep.delay,
                    "dependency of {} violated",
                    r
                );
            }
        }
    }

    // machines: sequence order consistent, setup-separated, within makespan
    for tl in solution.machines() {
        for pair in tl.ops.windows(2) {
            let setup = instance
                .setup()
                .between(task_family(instance, pair[0].task), task_family(instance, pair[1].task));
            assert!(
                pair[0].end + setup <= pair[1].start,
                "machine {} overlap or missing setup",
                tl.machine
            );
            assert_eq!(pair[1].setup_before, setup);
        }
        for op in &tl.ops {
            assert!(op.start >= 0);
            assert!(op.end <= solution.makespan());
        }
    }

    // the makespan is attained, not just an upper bound
    if instance.task_count() > 0 {
        let latest = solution.ops().map(|op| op.end).max().unwrap();
        assert_eq!(latest, solution.makespan());
    }
}

fn task_family(instance: &Instance, r: TaskRef) -> u32 {
    instance.task(r).unwrap().family()
}

#[test]
fn single_task_starts_immediately() {
    let instance = build(|b| {
        b.task(0, Task::new().with_alternative(0, 5));
    });
    let report = Solver::new(&instance).solve();
    assert!(report.is_optimal());
    let best = report.best.unwrap();
    assert_eq!(best.makespan(), 5);
    let op = best.op_for(TaskRef::new(0, 0)).unwrap();
    assert_eq!((op.start, op.end), (0, 5));
    assert_valid(&instance, &best);
}

#[test]
fn shared_machine_serializes_jobs() {
    let instance = build(|b| {
        b.task(0, Task::new().with_alternative(0, 10));
        b.task(1, Task::new().with_alternative(0, 10));
    });
    let report = Solver::new(&instance).solve();
    assert!(report.is_optimal());
    let best = report.best.unwrap();
    assert_eq!(best.makespan(), 20);
    assert_eq!(best.timeline(0).len(), 2);
    assert_valid(&instance, &best);
}

#[test]
fn family_switch_pays_setup_time() {
    let instance = build(|b| {
        b.task(0, Task::new().with_family(0).with_alternative(0, 5));
        b.task(1, Task::new().with_family(1).with_alternative(0, 5));
        b.setup_time(0, 3).setup_time(1, 3);
    });
    let report = Solver::new(&instance).solve();
    assert!(report.is_optimal());
    let best = report.best.unwrap();
    assert_eq!(best.makespan(), 13);
    let second = &best.timeline(0)[1];
    assert_eq!(second.setup_before, 3);
    assert_valid(&instance, &best);
}

#[test]
fn same_family_switch_is_free() {
    let instance = build(|b| {
        b.task(0, Task::new().with_family(1).with_alternative(0, 5));
        b.task(1, Task::new().with_family(1).with_alternative(0, 5));
        b.setup_time(1, 3);
    });
    let best = Solver::new(&instance).solve().best.unwrap();
    assert_eq!(best.makespan(), 10);
}

#[test]
fn start_delay_dependency_is_honored() {
    let instance = build(|b| {
        let first = b.task(0, Task::new().with_alternative(0, 1));
        b.task(1, Task::new().with_alternative(1, 1).after_start(first, 12));
    });
    let report = Solver::new(&instance).solve();
    assert!(report.is_optimal());
    let best = report.best.unwrap();
    assert_eq!(best.makespan(), 13);
    assert_eq!(best.op_for(TaskRef::new(0, 0)).unwrap().start, 0);
    assert_eq!(best.op_for(TaskRef::new(1, 0)).unwrap().start, 12);
    assert_valid(&instance, &best);
}

#[test]
fn outage_inflates_the_spanning_task() {
    let instance = build(|b| {
        b.task(0, Task::new().with_alternative(0, 8));
        b.task(1, Task::new().with_alternative(0, 4));
        b.outage(0, 10, 15);
    });
    let report = Solver::new(&instance).solve();
    assert!(report.is_optimal());
    let best = report.best.unwrap();
    // the 4-tick task starts at 8, pauses across [10, 15) and ends at 17,
    // which beats waiting for the window to pass (19)
    assert_eq!(best.makespan(), 17);
    let second = best.op_for(TaskRef::new(1, 0)).unwrap();
    assert_eq!((second.start, second.end), (8, 17));
    assert_valid(&instance, &best);
}

#[test]
fn flexible_task_picks_the_faster_machine() {
    let instance = build(|b| {
        b.task(0, Task::new().with_alternative(0, 10).with_alternative(1, 3));
    });
    let report = Solver::new(&instance).solve();
    assert!(report.is_optimal());
    let best = report.best.unwrap();
    assert_eq!(best.makespan(), 3);
    assert_eq!(best.ops().count(), 1);
    let op = best.op_for(TaskRef::new(0, 0)).unwrap();
    assert_eq!(op.machine, 1);
    assert_eq!(op.alternative, 1);
    assert_valid(&instance, &best);
}

#[test]
fn flexible_tasks_spread_across_machines() {
    let instance = build(|b| {
        b.task(0, Task::new().with_alternative(0, 10).with_alternative(1, 10));
        b.task(1, Task::new().with_alternative(0, 10).with_alternative(1, 10));
    });
    let best = Solver::new(&instance).solve().best.unwrap();
    assert_eq!(best.makespan(), 10);
    assert_valid(&instance, &best);
}

#[test]
fn pinned_task_is_scheduled_verbatim() {
    let instance = build(|b| {
        b.task(
            0,
            Task::new()
                .with_alternative(0, 7)
                .with_alternative(1, 7)
                .with_pinned_start(1, 40),
        );
    });
    let best = Solver::new(&instance).solve().best.unwrap();
    let op = best.op_for(TaskRef::new(0, 0)).unwrap();
    assert_eq!((op.machine, op.start, op.end), (1, 40, 47));
    assert_eq!(best.makespan(), 47);
}

#[test]
fn fixed_end_pins_the_completion() {
    let instance = build(|b| {
        b.task(0, Task::new().with_alternative(0, 5).with_fixed_end(9));
    });
    let best = Solver::new(&instance).solve().best.unwrap();
    let op = best.op_for(TaskRef::new(0, 0)).unwrap();
    assert_eq!((op.start, op.end), (4, 9));
}

#[test]
fn impossible_fixed_end_is_proven_infeasible() {
    let instance = build(|b| {
        b.task(0, Task::new().with_alternative(0, 5).with_fixed_end(2));
    });
    let report = Solver::new(&instance).solve();
    assert!(report.is_infeasible());
    assert!(report.best.is_none());
}

#[test]
fn too_small_horizon_is_proven_infeasible() {
    let instance = build(|b| {
        b.task(0, Task::new().with_alternative(0, 10));
        b.horizon(5);
    });
    assert!(Solver::new(&instance).solve().is_infeasible());
}

#[test]
fn improving_stream_is_strictly_decreasing() {
    let instance = build(|b| {
        b.task(0, Task::new().with_alternative(0, 10).with_alternative(1, 3));
    });
    let mut solver = Solver::new(&instance);
    let makespans: Vec<i64> = solver.improving_solutions().map(|s| s.makespan()).collect();
    // greedy first descent lands on machine 0, then the improvement pass
    // finds machine 1
    assert_eq!(makespans, vec![10, 3]);
    assert_eq!(solver.best().unwrap().makespan(), 3);
    assert_eq!(solver.stats().solutions, 2);
}

#[test]
fn exhausted_decision_budget_stops_without_proof() {
    let instance = build(|b| {
        b.task(0, Task::new().with_alternative(0, 10));
        b.task(1, Task::new().with_alternative(0, 10));
    });
    let report = Solver::new(&instance)
        .with_limits(SearchLimits::decisions(0))
        .solve();
    assert!(!report.proven);
    assert!(report.best.is_none());
    assert_eq!(report.stats.decisions, 0);
}

#[test]
fn elapsed_wall_clock_budget_stops_without_proof() {
    let instance = build(|b| {
        b.task(0, Task::new().with_alternative(0, 10));
    });
    let report = Solver::new(&instance)
        .with_limits(SearchLimits::wall_clock(std::time::Duration::ZERO))
        .solve();
    assert!(!report.proven);
}

#[test]
fn solving_twice_is_deterministic() {
    let configure = |b: &mut InstanceBuilder| {
        b.task(0, Task::new().with_alternative(0, 4).with_alternative(1, 6));
        b.task(0, Task::new().with_alternative(1, 3));
        b.task(1, Task::new().with_alternative(0, 5).with_alternative(1, 2));
        b.setup_time(0, 1);
    };
    let first = Solver::new(&build(configure)).solve();
    let second = Solver::new(&build(configure)).solve();
    assert_eq!(
        first.best.as_ref().map(Solution::makespan),
        second.best.as_ref().map(Solution::makespan)
    );
    assert_eq!(first.stats, second.stats);
}

#[test]
fn solve_counts_its_work() {
    let instance = build(|b| {
        b.task(0, Task::new().with_alternative(0, 10));
        b.task(1, Task::new().with_alternative(0, 10));
    });
    let report = Solver::new(&instance).solve();
    assert!(report.stats.decisions > 0);
    assert!(report.stats.solutions >= 1);
}

/// Deterministic pseudo-random instance: a couple of jobs over 3 machines,
/// flexible tasks, mixed families, one machine with an outage window.
fn random_instance(rng: &mut StdRng) -> Instance {
    let mut b = Instance::builder();
    let jobs = rng.gen_range(1..=2);
    for job in 0..jobs {
        let tasks = rng.gen_range(1..=2);
        for _ in 0..tasks {
            let mut t = Task::new().with_family(rng.gen_range(0..2));
            let alts = rng.gen_range(1..=2);
            let first_machine = rng.gen_range(0..3usize);
            for a in 0..alts {
                t = t.with_alternative((first_machine + a) % 3, rng.gen_range(1..=8));
            }
            b.task(job, t);
        }
    }
    b.setup_time(0, rng.gen_range(0..=3));
    b.setup_time(1, rng.gen_range(0..=3));
    if rng.gen_bool(0.5) {
        let start = rng.gen_range(2..=6);
        b.outage(0, start, start + rng.gen_range(1..=4));
    }
    b.build().unwrap()
}

#[test]
fn random_schedules_satisfy_every_property() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..40 {
        let instance = random_instance(&mut rng);
        let report = Solver::new(&instance).solve();
        assert!(report.proven, "tiny instances must be solved to proof");
        let best = report.best.expect("tiny instances are feasible");
        assert_valid(&instance, &best);
    }
}

#[test]
fn tightening_a_duration_never_hurts_the_makespan() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..25 {
        let mut b = Instance::builder();
        let d0 = rng.gen_range(2..=8);
        let d1 = rng.gen_range(2..=8);
        let d2 = rng.gen_range(2..=8);
        b.task(0, Task::new().with_alternative(0, d0).with_alternative(1, d0 + 1));
        b.task(0, Task::new().with_alternative(1, d1));
        b.task(1, Task::new().with_alternative(0, d2));
        let loose = Solver::new(&b.build().unwrap()).solve().best.unwrap();

        let mut b = Instance::builder();
        b.task(0, Task::new().with_alternative(0, d0 - 1).with_alternative(1, d0));
        b.task(0, Task::new().with_alternative(1, d1));
        b.task(1, Task::new().with_alternative(0, d2));
        let tight = Solver::new(&b.build().unwrap()).solve().best.unwrap();

        assert!(tight.makespan() <= loose.makespan());
    }
}

#[test]
fn relaxing_an_outage_never_hurts_the_makespan() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..25 {
        let d0 = rng.gen_range(3..=8);
        let d1 = rng.gen_range(3..=8);
        let ws = rng.gen_range(1..=6);
        let wlen = rng.gen_range(1..=5);

        let mut blocked = Instance::builder();
        blocked.task(0, Task::new().with_alternative(0, d0));
        blocked.task(1, Task::new().with_alternative(0, d1));
        blocked.outage(0, ws, ws + wlen);
        let with_window = Solver::new(&blocked.build().unwrap()).solve().best.unwrap();

        let mut open = Instance::builder();
        open.task(0, Task::new().with_alternative(0, d0));
        open.task(1, Task::new().with_alternative(0, d1));
        let without_window = Solver::new(&open.build().unwrap()).solve().best.unwrap();

        assert!(without_window.makespan() <= with_window.makespan());
    }
}
