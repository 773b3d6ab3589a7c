//! Two jobs competing for a machine that goes down for part of the day,
//! with a retooling cost between the two product families.

use flexshop::instance::{Instance, Task};
use flexshop::search::{SearchLimits, Solver};

fn main() {
    let mut builder = Instance::builder();

    builder.task(
        0,
        Task::new()
            .with_family(0)
            .with_alternative(0, 8)
            .with_alternative(1, 12),
    );
    builder.task(0, Task::new().with_family(0).with_alternative(0, 4));
    builder.task(
        1,
        Task::new()
            .with_family(1)
            .with_alternative(0, 6)
            .with_alternative(1, 6),
    );

    // machine 0 is down over [10, 15); work crossing the window pauses
    builder.outage(0, 10, 15);
    // retooling for family 1 costs 3 ticks, family 0 is quick
    builder.setup_time(0, 1).setup_time(1, 3);

    let instance = match builder.build() {
        Ok(instance) => instance,
        Err(e) => {
            eprintln!("invalid instance: {e}");
            std::process::exit(1);
        }
    };
    println!("{instance}");

    let report = Solver::new(&instance)
        .with_limits(SearchLimits::decisions(100_000))
        .solve();

    match &report.best {
        Some(best) => {
            println!("{best}");
            if report.proven {
                println!("proven optimal");
            } else {
                println!("best found within budget, not proven optimal");
            }
        }
        None if report.proven => println!("no schedule exists"),
        None => println!("budget exhausted before a first schedule"),
    }
}
