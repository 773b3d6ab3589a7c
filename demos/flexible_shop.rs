//! Three orders over three machines, with start-to-start delays and a
//! pinned inspection slot. Builds the instance from literals, streams every
//! improving schedule, and prints the final report.

use flexshop::instance::{Instance, Task, TaskRef};
use flexshop::search::Solver;

fn main() {
    let mut builder = Instance::builder();

    // order 0: machining, runs on any machine but at very different speeds
    let machining = builder.task(
        0,
        Task::new()
            .with_alternative(0, 2)
            .with_alternative(1, 2)
            .with_alternative(2, 18)
            .after_start(TaskRef::new(1, 0), 12),
    );

    // order 1: preparation, long on every machine
    builder.task(
        1,
        Task::new()
            .with_alternative(0, 20)
            .with_alternative(1, 25)
            .with_alternative(2, 27),
    );

    // order 2: inspection, pinned to machine 1 at t=40
    builder.task(
        2,
        Task::new()
            .with_alternative(0, 7)
            .with_alternative(1, 7)
            .with_alternative(2, 4)
            .with_pinned_start(1, 40)
            .after_start(machining, 10),
    );

    let instance = match builder.build() {
        Ok(instance) => instance,
        Err(e) => {
            eprintln!("invalid instance: {e}");
            std::process::exit(1);
        }
    };
    println!("{instance}");

    let mut solver = Solver::new(&instance);
    for solution in solver.improving_solutions() {
        println!("improved to {}", solution.makespan());
        println!("{solution}");
    }

    let stats = solver.stats();
    match solver.best() {
        Some(best) => println!(
            "optimal makespan {} ({} decisions, {} fails)",
            best.makespan(),
            stats.decisions,
            stats.failures
        ),
        None => println!("no schedule exists"),
    }
}
