#![forbid(unsafe_code)]

//! Exhaustive store assertions.
//!
//! Every action a [`TestStore`] processes is asserted: actions the test sends
//! with [`send`](TestStore::send), and actions the store produces itself with
//! [`receive`](TestStore::receive). Each assertion describes the full model
//! expected afterwards by mutating a copy of the previous model.
//!
//! ```ignore
//! store.send(Action::Show, |m| m.sheet = Presents::new(PresentationPhase::Presented(sheet())));
//! store.receive(Action::Sheet(SheetAction::Begin), |_| {});
//! store.advance(Duration::from_secs(1));
//! store.receive(Action::Sheet(SheetAction::Tick), |m| m.ticks += 1);
//! store.finish();
//! ```

use std::fmt::Debug;
use std::time::Duration;

use presents_runtime::{Model, RuntimeConfig, Scheduler, Store};

use crate::scheduler::TestScheduler;

/// A [`Store`] on virtual time with exhaustive assertions.
pub struct TestStore<M: Model> {
    store: Store<M, TestScheduler<M::Action>>,
}

impl<M> Debug for TestStore<M>
where
    M: Model + Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestStore").field("store", &self.store).finish()
    }
}

impl<M> TestStore<M>
where
    M: Model + Clone + PartialEq + Debug,
    M::Action: PartialEq + Debug,
{
    /// Start the store. Actions queued by `init` must be received first.
    pub fn new(model: M, env: M::Environment) -> Self {
        let mut store = Store::with_scheduler(model, env, TestScheduler::new());
        store.start();
        Self { store }
    }

    #[must_use]
    pub fn with_config(mut self, config: RuntimeConfig) -> Self {
        self.store = self.store.with_config(config);
        self
    }

    pub fn model(&self) -> &M {
        self.store.model()
    }

    pub fn env(&self) -> &M::Environment {
        self.store.env()
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.store.scheduler().now()
    }

    /// Process `action` and assert the resulting model.
    ///
    /// # Panics
    ///
    /// When actions produced earlier have not been received, or when the
    /// model differs from the one `expected` describes.
    #[track_caller]
    pub fn send(&mut self, action: M::Action, expected: impl FnOnce(&mut M)) {
        self.run_due();
        if let Some(pending) = self.store.queued().next() {
            panic!("must receive {pending:?} before sending {action:?}");
        }
        self.step(action, expected, "sending");
    }

    /// Process the next action the store produced and assert it and the
    /// resulting model.
    ///
    /// # Panics
    ///
    /// When nothing was produced, when the produced action differs from
    /// `action`, or when the model differs from the expectation.
    #[track_caller]
    pub fn receive(&mut self, action: M::Action, expected: impl FnOnce(&mut M)) {
        self.run_due();
        let Some(received) = self.store.take_queued() else {
            panic!("expected to receive {action:?}, but no action was produced");
        };
        assert_eq!(received, action, "received an unexpected action");
        self.step(received, expected, "receiving");
    }

    /// Move virtual time forward, delivering due effect output.
    pub fn advance(&mut self, by: Duration) {
        self.store.scheduler_mut().advance(by);
        self.store.poll_scheduler();
    }

    /// Process every produced action without asserting. Returns how many
    /// were processed.
    pub fn skip_received(&mut self) -> usize {
        let mut skipped = 0;
        loop {
            self.run_due();
            let Some(action) = self.store.take_queued() else {
                return skipped;
            };
            self.store.step(action);
            skipped += 1;
        }
    }

    /// Assert that every produced action was received and no effect is
    /// still able to deliver.
    ///
    /// # Panics
    ///
    /// When either condition does not hold.
    #[track_caller]
    pub fn finish(mut self) {
        self.run_due();
        let unreceived: Vec<_> = self.store.queued().collect();
        if !unreceived.is_empty() {
            panic!("{} action(s) not received: {unreceived:?}", unreceived.len());
        }
        let pending = self.store.scheduler().pending();
        if pending > 0 {
            panic!("{pending} effect(s) still running at finish");
        }
    }

    #[track_caller]
    fn step(&mut self, action: M::Action, expected: impl FnOnce(&mut M), verb: &str) {
        let mut want = self.store.model().clone();
        expected(&mut want);
        let description = format!("{action:?}");
        self.store.step(action);
        assert_eq!(self.store.model(), &want, "model after {verb} {description}");
    }

    fn run_due(&mut self) {
        self.store.scheduler_mut().run();
        self.store.poll_scheduler();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use presents_runtime::Cmd;

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Echo {
        heard: Vec<u8>,
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Act {
        Say(u8),
        Later(u8),
        Heard(u8),
    }

    impl Model for Echo {
        type Action = Act;
        type Environment = ();

        fn update(&mut self, action: Act, _env: &()) -> Cmd<Act> {
            match action {
                Act::Say(n) => Cmd::msg(Act::Heard(n)),
                Act::Later(n) => Cmd::task(move || Act::Heard(n)),
                Act::Heard(n) => {
                    self.heard.push(n);
                    Cmd::none()
                }
            }
        }
    }

    #[test]
    fn send_then_receive() {
        let mut store = TestStore::new(Echo::default(), ());
        store.send(Act::Say(1), |_| {});
        store.receive(Act::Heard(1), |m| m.heard.push(1));
        store.finish();
    }

    #[test]
    fn tasks_are_received_without_advancing() {
        let mut store = TestStore::new(Echo::default(), ());
        store.send(Act::Later(2), |_| {});
        store.receive(Act::Heard(2), |m| m.heard.push(2));
        store.finish();
    }

    #[test]
    fn skip_received_processes_everything() {
        let mut store = TestStore::new(Echo::default(), ());
        store.send(Act::Say(3), |_| {});
        assert_eq!(store.skip_received(), 1);
        assert_eq!(store.model().heard, vec![3]);
        store.finish();
    }

    #[test]
    #[should_panic(expected = "must receive")]
    fn send_requires_receiving_first() {
        let mut store = TestStore::new(Echo::default(), ());
        store.send(Act::Say(1), |_| {});
        store.send(Act::Say(2), |_| {});
    }

    #[test]
    #[should_panic(expected = "model after sending")]
    fn wrong_expectation_fails() {
        let mut store = TestStore::new(Echo::default(), ());
        store.send(Act::Heard(1), |_| {});
    }

    #[test]
    #[should_panic(expected = "not received")]
    fn finish_requires_received_actions() {
        let mut store = TestStore::new(Echo::default(), ());
        store.send(Act::Say(1), |_| {});
        store.finish();
    }
}
