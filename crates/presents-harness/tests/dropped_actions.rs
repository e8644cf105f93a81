//! Child actions addressed to timers that are not on screen.

use std::time::Duration;

use presents_core::{KeyedPhases, PhaseKind, PresentationPhase};
use presents_harness::fixtures::{ManyTimers, ManyTimersAction, TimerAction, TimerEnv, TimerState};
use presents_harness::{LogCapture, TestScheduler, TestStore};
use presents_runtime::{DroppedActionPolicy, Presents, RuntimeConfig, Scheduler, Store};
use tracing::Level;

const DROPPED: &str = "dropped action for inactive child";

fn env(dropped_actions: DroppedActionPolicy) -> TimerEnv {
    TimerEnv {
        dropped_actions,
        ..TimerEnv::default()
    }
}

#[test]
fn unknown_child_is_dropped_with_a_warning() {
    let capture = LogCapture::new();
    let _guard = capture.install();

    let mut store = TestStore::new(ManyTimers::default(), TimerEnv::default());
    store.send(ManyTimersAction::Timer(9, TimerAction::Tick), |_| {});
    store.finish();

    let warnings = capture.matching(Level::WARN, DROPPED);
    assert_eq!(warnings.len(), 1);
    let warning = &warnings[0];
    assert_eq!(warning.field("scope").as_deref(), Some("timers"));
    assert_eq!(warning.field("identity").as_deref(), Some("9"));
    assert_eq!(warning.field("phase").as_deref(), Some("dismissed"));
}

#[test]
fn late_tick_after_removal_is_dropped() {
    let capture = LogCapture::new();
    let _guard = capture.install();

    let mut store = TestStore::new(ManyTimers::default(), TimerEnv::default());
    store.send(
        ManyTimersAction::StartTimer {
            name: "Tea".into(),
            limit: 3,
        },
        |m| {
            m.next_id = 1;
            m.timers = Presents::new(KeyedPhases::from_phases([(
                0,
                PresentationPhase::Presented(TimerState::new(0, "Tea", 3)),
            )]));
        },
    );
    store.receive(ManyTimersAction::Timer(0, TimerAction::Begin), |_| {});
    store.send(ManyTimersAction::Timer(0, TimerAction::Finished), |m| {
        m.timers = Presents::new(KeyedPhases::from_phases([(
            0,
            PresentationPhase::Cancelling(TimerState::new(0, "Tea", 3)),
        )]));
    });
    store.receive(ManyTimersAction::Timer(0, TimerAction::Cancel), |m| {
        m.timers = Presents::default();
    });
    assert!(!capture.contains(Level::WARN, DROPPED));

    // A tick that raced the removal.
    store.send(ManyTimersAction::Timer(0, TimerAction::Tick), |_| {});
    assert!(capture.contains(Level::WARN, DROPPED));

    store.advance(Duration::from_secs(5));
    store.finish();
}

#[test]
fn tick_while_cancelling_is_dropped() {
    let capture = LogCapture::new();
    let _guard = capture.install();

    let mut store = Store::with_scheduler(ManyTimers::default(), TimerEnv::default(), TestScheduler::new());
    store
        .send(ManyTimersAction::StartTimer {
            name: "Tea".into(),
            limit: 3,
        })
        .expect("start timer");

    // Finish without draining the queue, so the end effect's `Cancel` is
    // still waiting and the timer sits in `Cancelling`.
    store.step(ManyTimersAction::Timer(0, TimerAction::Finished));
    assert_eq!(store.model().timers.phases().kind(&0), PhaseKind::Cancelling);
    assert!(!capture.contains(Level::WARN, DROPPED));

    store.step(ManyTimersAction::Timer(0, TimerAction::Tick));
    let warnings = capture.matching(Level::WARN, DROPPED);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].field("identity").as_deref(), Some("0"));
    assert_eq!(warnings[0].field("phase").as_deref(), Some("cancelling"));

    // The tick never reached the countdown: no `Finished` was produced.
    let queued: Vec<ManyTimersAction> = store.queued().cloned().collect();
    assert_eq!(queued, vec![ManyTimersAction::Timer(0, TimerAction::Cancel)]);

    store.tick().expect("drain");
    store.scheduler_mut().advance(Duration::from_secs(5));
    store.tick().expect("drain");
    assert!(store.model().timers.phases().is_empty());
    assert_eq!(store.scheduler().pending(), 0);
}

#[test]
fn ignore_policy_drops_silently() {
    let capture = LogCapture::new();
    let _guard = capture.install();

    let mut store = TestStore::new(ManyTimers::default(), env(DroppedActionPolicy::Ignore));
    store.send(ManyTimersAction::Timer(3, TimerAction::Tick), |_| {});
    store.finish();

    assert!(!capture.contains(Level::WARN, DROPPED));
}

#[test]
#[should_panic(expected = "action for inactive child 9 in timers (dismissed)")]
fn strict_config_panics() {
    let strict = RuntimeConfig::strict();
    let mut store = TestStore::new(ManyTimers::default(), env(strict.dropped_actions))
        .with_config(strict);
    store.send(ManyTimersAction::Timer(9, TimerAction::Tick), |_| {});
}
