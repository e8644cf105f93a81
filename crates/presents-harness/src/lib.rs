#![forbid(unsafe_code)]

//! Test support for Presents.
//!
//! - [`TestStore`] runs a model on a [`TestScheduler`] and asserts every
//!   action and every model change, so effects started on presentation and
//!   stopped on dismissal are checked end to end.
//! - [`LogCapture`] records tracing events for assertions on what the
//!   runtime logged.
//! - [`EffectLedger`] checks begin/end pairing across many advances.
//! - [`strategies`] holds proptest generators for phase operations.
//! - [`fixtures`] holds timer models used by the tests and demos.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use presents_core::{KeyedPhases, PresentationPhase};
//! use presents_harness::TestStore;
//! use presents_harness::fixtures::{
//!     ManyTimers, ManyTimersAction, TimerAction, TimerEnv, TimerState,
//! };
//! use presents_runtime::Presents;
//!
//! let tea = |count| TimerState::new(0, "Tea", count);
//! let mut store = TestStore::new(ManyTimers::default(), TimerEnv::default());
//!
//! store.send(ManyTimersAction::StartTimer { name: "Tea".into(), limit: 1 }, |m| {
//!     m.next_id = 1;
//!     m.timers = Presents::new(KeyedPhases::from_phases([(0, PresentationPhase::Presented(tea(1)))]));
//! });
//! store.receive(ManyTimersAction::Timer(0, TimerAction::Begin), |_| {});
//!
//! store.advance(Duration::from_secs(1));
//! store.receive(ManyTimersAction::Timer(0, TimerAction::Tick), |m| {
//!     m.timers = Presents::new(KeyedPhases::from_phases([(0, PresentationPhase::Presented(tea(0)))]));
//! });
//! store.receive(ManyTimersAction::Timer(0, TimerAction::Finished), |m| {
//!     m.timers = Presents::new(KeyedPhases::from_phases([(0, PresentationPhase::Cancelling(tea(0)))]));
//! });
//! store.receive(ManyTimersAction::Timer(0, TimerAction::Cancel), |m| {
//!     m.timers = Presents::default();
//! });
//! store.finish();
//! ```

pub mod fixtures;
pub mod ledger;
pub mod logs;
pub mod scheduler;
pub mod strategies;
pub mod test_store;

pub use ledger::{EffectLedger, LedgerViolation};
pub use logs::{CapturedEvent, LogCapture};
pub use scheduler::TestScheduler;
pub use test_store::TestStore;
