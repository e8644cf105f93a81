#![forbid(unsafe_code)]

//! Virtual-time scheduler.
//!
//! Nothing runs until the test says so. Tasks are due at the moment they
//! are spawned and run on the next [`TestScheduler::run`] or
//! [`TestScheduler::advance`]; timers fire at `spawn + every * n`. Work due
//! at the same instant runs in spawn order, so deliveries are deterministic.

use std::collections::VecDeque;
use std::time::Duration;

use presents_runtime::{CancelToken, Job, Scheduler, TickFn};

/// Shortest timer period. A zero period is rounded up to this so `advance`
/// always terminates.
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

enum Work<A> {
    Task(Job<A>),
    Timer {
        every: Duration,
        tick: TickFn<A>,
        count: u64,
    },
}

struct Entry<A> {
    due: Duration,
    seq: u64,
    token: CancelToken,
    work: Work<A>,
}

/// Scheduler driven by an explicit virtual clock.
pub struct TestScheduler<A> {
    now: Duration,
    next_seq: u64,
    entries: Vec<Entry<A>>,
    delivered: VecDeque<(CancelToken, A)>,
}

impl<A> std::fmt::Debug for TestScheduler<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestScheduler")
            .field("now", &self.now)
            .field("scheduled", &self.entries.len())
            .field("delivered", &self.delivered.len())
            .finish()
    }
}

impl<A> Default for TestScheduler<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> TestScheduler<A> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_seq: 0,
            entries: Vec::new(),
            delivered: VecDeque::new(),
        }
    }

    /// Virtual time elapsed since creation.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of scheduled jobs that have not been cancelled.
    #[must_use]
    pub fn scheduled(&self) -> usize {
        self.entries.iter().filter(|e| !e.token.is_cancelled()).count()
    }

    /// Run everything due now.
    pub fn run(&mut self) {
        self.advance(Duration::ZERO);
    }

    /// Move the clock forward by `by`, running due work in time order.
    pub fn advance(&mut self, by: Duration) {
        let target = self.now + by;
        while let Some(index) = self.next_due(target) {
            let entry = self.entries.swap_remove(index);
            self.now = entry.due;
            self.fire(entry);
        }
        self.now = target;
    }

    fn next_due(&mut self, target: Duration) -> Option<usize> {
        self.entries.retain(|e| !e.token.is_cancelled());
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due <= target)
            .min_by_key(|(_, e)| (e.due, e.seq))
            .map(|(index, _)| index)
    }

    fn fire(&mut self, entry: Entry<A>) {
        let Entry { due, token, work, .. } = entry;
        match work {
            Work::Task(job) => self.delivered.push_back((token, job())),
            Work::Timer {
                every,
                mut tick,
                count,
            } => {
                let count = count + 1;
                if let Some(action) = tick(count) {
                    self.delivered.push_back((token.clone(), action));
                    self.push(due + every, token, Work::Timer { every, tick, count });
                }
            }
        }
    }

    fn push(&mut self, due: Duration, token: CancelToken, work: Work<A>) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(Entry {
            due,
            seq,
            token,
            work,
        });
    }
}

impl<A> Scheduler<A> for TestScheduler<A> {
    fn spawn_task(&mut self, task: Job<A>, token: CancelToken) {
        self.push(self.now, token, Work::Task(task));
    }

    fn spawn_timer(&mut self, every: Duration, tick: TickFn<A>, token: CancelToken) {
        let every = every.max(MIN_PERIOD);
        self.push(self.now + every, token, Work::Timer {
            every,
            tick,
            count: 0,
        });
    }

    fn drain(&mut self) -> Vec<A> {
        self.delivered
            .drain(..)
            .filter(|(token, _)| !token.is_cancelled())
            .map(|(_, action)| action)
            .collect()
    }

    fn pending(&self) -> usize {
        self.scheduled()
            + self
                .delivered
                .iter()
                .filter(|(token, _)| !token.is_cancelled())
                .count()
    }
}
