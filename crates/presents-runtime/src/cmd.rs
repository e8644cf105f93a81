#![forbid(unsafe_code)]

//! Commands: side effects requested by `update` and by presenters.
//!
//! A [`Cmd`] is data. The store interprets it after the cycle that produced
//! it: messages are queued, tasks and timers go to the scheduler, and
//! cancellation commands flip the tokens registered under their id.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::cancel::CancelId;

/// A blocking job whose result is delivered as an action.
pub type Job<A> = Box<dyn FnOnce() -> A + Send>;

/// A periodic callback. Receives the 1-based tick count; returning `None`
/// stops the timer.
pub type TickFn<A> = Box<dyn FnMut(u64) -> Option<A> + Send>;

/// Commands represent side effects to be executed by the store.
#[derive(Default)]
pub enum Cmd<A> {
    /// No operation.
    #[default]
    None,
    /// Stop the store's run loop.
    Quit,
    /// Queue an action. It is processed in its own cycle, after the current
    /// one.
    Msg(A),
    /// Execute commands in order.
    Batch(Vec<Cmd<A>>),
    /// Execute commands in order, stopping early after a `Quit`.
    Sequence(Vec<Cmd<A>>),
    /// Run a blocking job on the scheduler and deliver its result.
    Task(Job<A>),
    /// Call `tick` every `every` until it returns `None` or is cancelled.
    Timer { every: Duration, tick: TickFn<A> },
    /// Register asynchronous work inside the command under `CancelId`.
    Cancellable(CancelId, Box<Cmd<A>>),
    /// Cancel all work registered under `CancelId`.
    Cancel(CancelId),
}

impl<A: fmt::Debug> fmt::Debug for Cmd<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Quit => write!(f, "Quit"),
            Self::Msg(a) => f.debug_tuple("Msg").field(a).finish(),
            Self::Batch(cmds) => f.debug_tuple("Batch").field(cmds).finish(),
            Self::Sequence(cmds) => f.debug_tuple("Sequence").field(cmds).finish(),
            Self::Task(_) => write!(f, "Task(...)"),
            Self::Timer { every, .. } => f.debug_struct("Timer").field("every", every).finish_non_exhaustive(),
            Self::Cancellable(id, cmd) => f.debug_tuple("Cancellable").field(id).field(cmd).finish(),
            Self::Cancel(id) => f.debug_tuple("Cancel").field(id).finish(),
        }
    }
}

impl<A> Cmd<A> {
    /// Create a no-op command.
    #[inline]
    pub fn none() -> Self {
        Self::None
    }

    /// Create a quit command.
    #[inline]
    pub fn quit() -> Self {
        Self::Quit
    }

    /// Create a message command.
    #[inline]
    pub fn msg(a: A) -> Self {
        Self::Msg(a)
    }

    /// Create a batch of commands.
    pub fn batch(cmds: Vec<Self>) -> Self {
        let mut cmds: Vec<Self> = cmds.into_iter().filter(|c| !c.is_none()).collect();
        match cmds.len() {
            0 => Self::None,
            1 => cmds.pop().unwrap_or_default(),
            _ => Self::Batch(cmds),
        }
    }

    /// Create a sequence of commands.
    pub fn sequence(cmds: Vec<Self>) -> Self {
        let mut cmds: Vec<Self> = cmds.into_iter().filter(|c| !c.is_none()).collect();
        match cmds.len() {
            0 => Self::None,
            1 => cmds.pop().unwrap_or_default(),
            _ => Self::Sequence(cmds),
        }
    }

    /// Create a background task command.
    ///
    /// The closure runs on the scheduler. When it completes, the returned
    /// action is queued for `update`.
    pub fn task<F>(f: F) -> Self
    where
        F: FnOnce() -> A + Send + 'static,
    {
        Self::Task(Box::new(f))
    }

    /// Create a periodic timer.
    pub fn timer<F>(every: Duration, tick: F) -> Self
    where
        F: FnMut(u64) -> Option<A> + Send + 'static,
    {
        Self::Timer {
            every,
            tick: Box::new(tick),
        }
    }

    /// Make asynchronous work in `cmd` cancellable through `id`.
    pub fn cancellable(id: CancelId, cmd: Self) -> Self {
        if cmd.is_none() {
            Self::None
        } else {
            Self::Cancellable(id, Box::new(cmd))
        }
    }

    /// Create a cancel command.
    #[inline]
    pub fn cancel(id: CancelId) -> Self {
        Self::Cancel(id)
    }

    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Return a stable name for tracing.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Quit => "Quit",
            Self::Msg(_) => "Msg",
            Self::Batch(_) => "Batch",
            Self::Sequence(_) => "Sequence",
            Self::Task(_) => "Task",
            Self::Timer { .. } => "Timer",
            Self::Cancellable(..) => "Cancellable",
            Self::Cancel(_) => "Cancel",
        }
    }

    /// Count the number of atomic commands in this command.
    ///
    /// Returns 0 for None, 1 for atomic commands, and recursively counts for
    /// Batch, Sequence and Cancellable.
    pub fn count(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Batch(cmds) | Self::Sequence(cmds) => cmds.iter().map(Self::count).sum(),
            Self::Cancellable(_, cmd) => cmd.count(),
            _ => 1,
        }
    }

    /// Convert every action this command can produce, including those of
    /// tasks and timers that run later.
    pub fn map<B>(self, f: impl Fn(A) -> B + Send + Sync + 'static) -> Cmd<B>
    where
        A: 'static,
        B: 'static,
    {
        let f: Arc<dyn Fn(A) -> B + Send + Sync> = Arc::new(f);
        self.map_shared(&f)
    }

    fn map_shared<B>(self, f: &Arc<dyn Fn(A) -> B + Send + Sync>) -> Cmd<B>
    where
        A: 'static,
        B: 'static,
    {
        match self {
            Self::None => Cmd::None,
            Self::Quit => Cmd::Quit,
            Self::Msg(a) => Cmd::Msg(f(a)),
            Self::Batch(cmds) => Cmd::Batch(cmds.into_iter().map(|c| c.map_shared(f)).collect()),
            Self::Sequence(cmds) => {
                Cmd::Sequence(cmds.into_iter().map(|c| c.map_shared(f)).collect())
            }
            Self::Task(job) => {
                let f = Arc::clone(f);
                Cmd::Task(Box::new(move || f(job())))
            }
            Self::Timer { every, mut tick } => {
                let f = Arc::clone(f);
                Cmd::Timer {
                    every,
                    tick: Box::new(move |n| tick(n).map(|a| f(a))),
                }
            }
            Self::Cancellable(id, cmd) => Cmd::Cancellable(id, Box::new(cmd.map_shared(f))),
            Self::Cancel(id) => Cmd::Cancel(id),
        }
    }
}
