#![forbid(unsafe_code)]

//! Execution of asynchronous commands.
//!
//! The store hands every `Cmd::Task` and `Cmd::Timer` to a [`Scheduler`]
//! together with a [`CancelToken`]. Results come back through
//! [`Scheduler::drain`]; results of cancelled work are discarded there, so a
//! cancelled timer never delivers a late tick.
//!
//! [`ThreadScheduler`] runs each job on its own thread and reports over an
//! `mpsc` channel. Deterministic virtual-time scheduling for tests lives in
//! the harness crate.
//!
//! # Failure Modes
//!
//! - A job that panics is counted as finished; its result is lost.
//! - A cancelled timer thread exits at its next wakeup, at most one period
//!   after cancellation.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::trace;

use crate::cancel::CancelToken;
use crate::cmd::{Job, TickFn};

/// Executes asynchronous work on behalf of the store.
pub trait Scheduler<A> {
    /// Run `task` once and deliver its result unless `token` is cancelled.
    fn spawn_task(&mut self, task: Job<A>, token: CancelToken);

    /// Call `tick` every `every` until it returns `None` or `token` is
    /// cancelled.
    fn spawn_timer(&mut self, every: Duration, tick: TickFn<A>, token: CancelToken);

    /// Take every delivered action, in delivery order.
    fn drain(&mut self) -> Vec<A>;

    /// Number of jobs that may still deliver.
    fn pending(&self) -> usize;

    /// Block up to `timeout` for a delivery. Returns whether one is ready.
    fn wait(&mut self, timeout: Duration) -> bool {
        let _ = timeout;
        false
    }
}

type Delivery<A> = (CancelToken, A);

/// Decrements the live-job counter when a job thread ends, panics included.
struct LiveGuard(Arc<AtomicUsize>);

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Sending half handed to job threads.
///
/// Counts deliveries sitting in the channel so that a finished job is never
/// reported idle before its result has been received.
struct Outbox<A> {
    sender: mpsc::Sender<Delivery<A>>,
    undelivered: Arc<AtomicUsize>,
}

impl<A> Outbox<A> {
    fn send(&self, delivery: Delivery<A>) -> bool {
        self.undelivered.fetch_add(1, Ordering::AcqRel);
        if self.sender.send(delivery).is_err() {
            self.undelivered.fetch_sub(1, Ordering::AcqRel);
            return false;
        }
        true
    }
}

/// Thread-per-job scheduler.
pub struct ThreadScheduler<A> {
    sender: mpsc::Sender<Delivery<A>>,
    receiver: mpsc::Receiver<Delivery<A>>,
    ready: VecDeque<Delivery<A>>,
    live: Arc<AtomicUsize>,
    undelivered: Arc<AtomicUsize>,
    handles: Vec<JoinHandle<()>>,
}

impl<A> std::fmt::Debug for ThreadScheduler<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadScheduler")
            .field("ready", &self.ready.len())
            .field("live", &self.live.load(Ordering::Acquire))
            .finish()
    }
}

impl<A: Send + 'static> Default for ThreadScheduler<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Send + 'static> ThreadScheduler<A> {
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver,
            ready: VecDeque::new(),
            live: Arc::new(AtomicUsize::new(0)),
            undelivered: Arc::new(AtomicUsize::new(0)),
            handles: Vec::new(),
        }
    }

    fn spawn(&mut self, body: impl FnOnce(Outbox<A>) + Send + 'static) {
        self.reap_finished();
        self.live.fetch_add(1, Ordering::AcqRel);
        let guard = LiveGuard(Arc::clone(&self.live));
        let outbox = Outbox {
            sender: self.sender.clone(),
            undelivered: Arc::clone(&self.undelivered),
        };
        let handle = thread::spawn(move || {
            let _guard = guard;
            body(outbox);
        });
        self.handles.push(handle);
    }

    fn reap_finished(&mut self) {
        if self.handles.is_empty() {
            return;
        }

        let mut remaining = Vec::with_capacity(self.handles.len());
        for handle in self.handles.drain(..) {
            if handle.is_finished() {
                let _ = handle.join();
            } else {
                remaining.push(handle);
            }
        }
        self.handles = remaining;
    }

    fn accept(&mut self, delivery: Delivery<A>) {
        self.undelivered.fetch_sub(1, Ordering::AcqRel);
        if delivery.0.is_cancelled() {
            trace!("discarded delivery from cancelled work");
        } else {
            self.ready.push_back(delivery);
        }
    }
}

impl<A: Send + 'static> Scheduler<A> for ThreadScheduler<A> {
    fn spawn_task(&mut self, task: Job<A>, token: CancelToken) {
        self.spawn(move |outbox| {
            if token.is_cancelled() {
                return;
            }
            let action = task();
            outbox.send((token, action));
        });
    }

    fn spawn_timer(&mut self, every: Duration, mut tick: TickFn<A>, token: CancelToken) {
        self.spawn(move |outbox| {
            let mut count = 0u64;
            loop {
                thread::sleep(every);
                if token.is_cancelled() {
                    break;
                }
                count += 1;
                let Some(action) = tick(count) else {
                    break;
                };
                if !outbox.send((token.clone(), action)) {
                    break;
                }
            }
        });
    }

    fn drain(&mut self) -> Vec<A> {
        while let Ok(delivery) = self.receiver.try_recv() {
            self.accept(delivery);
        }
        self.reap_finished();
        // Work cancelled after delivery but before draining is discarded too.
        self.ready
            .drain(..)
            .filter(|(token, _)| !token.is_cancelled())
            .map(|(_, action)| action)
            .collect()
    }

    fn pending(&self) -> usize {
        self.live.load(Ordering::Acquire)
            + self.undelivered.load(Ordering::Acquire)
            + self.ready.len()
    }

    fn wait(&mut self, timeout: Duration) -> bool {
        if !self.ready.is_empty() {
            return true;
        }
        match self.receiver.recv_timeout(timeout) {
            Ok(delivery) => {
                self.accept(delivery);
                !self.ready.is_empty()
            }
            Err(_) => false,
        }
    }
}
