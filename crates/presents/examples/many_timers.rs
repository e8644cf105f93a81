//! Several countdown timers running side by side on real threads.
//!
//! Each timer starts ticking when it is presented and is torn down when it
//! reaches zero. Run with `RUST_LOG=presents_runtime=debug` to see the
//! presentation effects and cancellations.

use std::time::Duration;

use presents::prelude::*;
use presents::runtime::Scheduler;
use presents_harness::fixtures::{ManyTimers, ManyTimersAction, TimerEnv};
use tracing_subscriber::EnvFilter;

fn render(model: &ManyTimers) {
    let line: Vec<String> = model
        .timers
        .phases()
        .iter()
        .filter_map(|(_, phase)| {
            let timer = phase.value()?;
            Some(format!("{} {} ({})", timer.name, timer.count, phase.kind()))
        })
        .collect();
    if line.is_empty() {
        println!("no timers");
    } else {
        println!("{}", line.join(" | "));
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let env = TimerEnv {
        every: Duration::from_millis(200),
        ..TimerEnv::default()
    };
    let mut store = Store::new(ManyTimers::default(), env);
    for (name, limit) in [("Pasta", 6), ("Tea", 3), ("Coffee", 4)] {
        store.send(ManyTimersAction::StartTimer {
            name: name.into(),
            limit,
        })?;
    }
    render(store.model());

    let poll = store.config().poll_timeout;
    loop {
        if store.tick()? > 0 {
            render(store.model());
        }
        if store.queued().next().is_none() && store.scheduler().pending() == 0 {
            break;
        }
        store.scheduler_mut().wait(poll);
    }

    println!("{} timers finished", store.model().next_id);
    Ok(())
}
