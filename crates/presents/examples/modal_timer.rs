//! One fast or slow timer at a time.
//!
//! Switching from the fast timer to the slow one drains the fast timer
//! completely, end effect included, before the slow one begins.

use std::time::{Duration, Instant};

use presents::prelude::*;
use presents::runtime::Scheduler;
use presents_harness::fixtures::{ModalTimer, ModalTimerAction, ModalTimerEnv};
use tracing_subscriber::EnvFilter;

fn describe(model: &ModalTimer) -> String {
    match model.timer.get() {
        Some(option) => {
            let timer = option.state();
            format!("{} timer at {} ({})", timer.name, timer.count, model.timer.phases().kind())
        }
        None => "no timer".to_owned(),
    }
}

/// Run the store for `duration`, printing every change.
fn run_for(
    store: &mut Store<ModalTimer>,
    duration: Duration,
) -> Result<(), presents::RuntimeError> {
    let deadline = Instant::now() + duration;
    while Instant::now() < deadline {
        if store.tick()? > 0 {
            println!("{}", describe(store.model()));
        }
        let poll = store.config().poll_timeout;
        store.scheduler_mut().wait(poll);
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut store = Store::new(ModalTimer::default(), ModalTimerEnv::default());

    store.send(ModalTimerAction::StartFast)?;
    println!("{}", describe(store.model()));
    run_for(&mut store, Duration::from_secs(1))?;

    store.send(ModalTimerAction::StartSlow)?;
    println!("{}", describe(store.model()));
    run_for(&mut store, Duration::from_secs(3))?;

    store.send(ModalTimerAction::Dismiss)?;
    store.run_until_idle()?;
    println!("{}", describe(store.model()));
    Ok(())
}
