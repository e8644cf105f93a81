#![forbid(unsafe_code)]

//! Headless Elm-style store.
//!
//! A [`Model`] receives actions in `update` and re-derives its presented
//! children in `present`. The store runs both for every action, executes the
//! resulting [`Cmd`]s, and feeds actions produced by commands and by the
//! scheduler back into the queue.
//!
//! # Cycle
//!
//! One cycle handles exactly one action:
//!
//! 1. `update(action)`
//! 2. `present()`
//! 3. execute both commands; `Cmd::Msg` actions are queued for later cycles
//!
//! [`Store::tick`] drains scheduler deliveries and then processes cycles
//! until the queue is empty, bounded by
//! [`RuntimeConfig::max_cycles_per_tick`].

use std::collections::VecDeque;
use std::fmt;

use tracing::{debug, debug_span, trace};
use web_time::Instant;

use crate::cancel::{CancelId, CancelRegistry};
use crate::cmd::Cmd;
use crate::config::RuntimeConfig;
use crate::error::{Result, RuntimeError};
use crate::scheduler::{Scheduler, ThreadScheduler};

/// Application state and behavior driven by a [`Store`].
pub trait Model: Sized {
    /// Actions handled by `update`.
    type Action: Send + 'static;

    /// Dependencies handed to `update`, `present` and presenters.
    type Environment;

    /// Commands to run before the first action.
    fn init(&mut self, env: &Self::Environment) -> Cmd<Self::Action> {
        let _ = env;
        Cmd::none()
    }

    /// Apply one action.
    fn update(&mut self, action: Self::Action, env: &Self::Environment) -> Cmd<Self::Action>;

    /// Advance presented children after `update`.
    ///
    /// Typically a batch of [`drive`](crate::drive) calls, one per slot.
    fn present(&mut self, env: &Self::Environment) -> Cmd<Self::Action> {
        let _ = env;
        Cmd::none()
    }
}

/// Runs a [`Model`] and the side effects it requests.
pub struct Store<M: Model, Sch = ThreadScheduler<<M as Model>::Action>> {
    model: M,
    env: M::Environment,
    config: RuntimeConfig,
    scheduler: Sch,
    registry: CancelRegistry,
    queue: VecDeque<M::Action>,
    running: bool,
    started: bool,
}

impl<M, Sch> fmt::Debug for Store<M, Sch>
where
    M: Model + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("model", &self.model)
            .field("queued", &self.queue.len())
            .field("cancel_ids", &self.registry.len())
            .field("running", &self.running)
            .finish_non_exhaustive()
    }
}

impl<M: Model> Store<M> {
    /// Store running asynchronous work on threads.
    pub fn new(model: M, env: M::Environment) -> Self {
        Self::with_scheduler(model, env, ThreadScheduler::new())
    }
}

impl<M, Sch> Store<M, Sch>
where
    M: Model,
    Sch: Scheduler<M::Action>,
{
    pub fn with_scheduler(model: M, env: M::Environment, scheduler: Sch) -> Self {
        Self {
            model,
            env,
            config: RuntimeConfig::default(),
            scheduler,
            registry: CancelRegistry::new(),
            queue: VecDeque::new(),
            running: true,
            started: false,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// [`with_config`](Self::with_config) after checking `config`.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::Config`] when [`RuntimeConfig::validate`] rejects it.
    pub fn try_with_config(self, config: RuntimeConfig) -> Result<Self> {
        config.validate()?;
        Ok(self.with_config(config))
    }

    /// Load the runtime configuration from a TOML or JSON file.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::Config`] when the file cannot be read, parsed or
    /// validated.
    #[cfg(feature = "policy-config")]
    pub fn with_config_file(self, path: impl AsRef<std::path::Path>) -> Result<Self> {
        let config = RuntimeConfig::load(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "runtime config loaded");
        Ok(self.with_config(config))
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn env(&self) -> &M::Environment {
        &self.env
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &Sch {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut Sch {
        &mut self.scheduler
    }

    /// False once a `Cmd::Quit` has run.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Run `init` and the first `present`. Later calls do nothing.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        let _span = debug_span!("presents.store.init").entered();
        let init = self.model.init(&self.env);
        let presented = self.model.present(&self.env);
        self.execute(Cmd::batch(vec![init, presented]), &mut Vec::new());
    }

    /// Queue `action` and process it along with everything it triggers
    /// synchronously.
    pub fn send(&mut self, action: M::Action) -> Result<usize> {
        self.start();
        self.queue.push_back(action);
        self.tick()
    }

    /// Drain scheduler deliveries and process queued actions.
    ///
    /// Returns the number of cycles run.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::CascadeLimit`] when the queue does not empty within
    /// [`RuntimeConfig::max_cycles_per_tick`] cycles. Unprocessed actions
    /// stay queued.
    pub fn tick(&mut self) -> Result<usize> {
        self.start();
        self.poll_scheduler();

        let limit = self.config.max_cycles_per_tick;
        let mut cycles = 0;
        while self.running {
            let Some(action) = self.queue.pop_front() else {
                break;
            };
            if cycles == limit {
                self.queue.push_front(action);
                return Err(RuntimeError::CascadeLimit { limit });
            }
            self.cycle(action);
            cycles += 1;
        }

        self.registry.prune();
        Ok(cycles)
    }

    /// Tick until nothing is queued and no scheduled work can deliver, or
    /// until the model quits.
    ///
    /// A timer that never stops keeps this from returning until the model
    /// quits.
    pub fn run_until_idle(&mut self) -> Result<()> {
        loop {
            self.tick()?;
            if !self.running || (self.queue.is_empty() && self.scheduler.pending() == 0) {
                return Ok(());
            }
            self.scheduler.wait(self.config.poll_timeout);
        }
    }

    /// Run to completion and return the final model.
    pub fn run(mut self) -> Result<M> {
        self.run_until_idle()?;
        debug!(running = self.running, "store finished");
        Ok(self.model)
    }

    /// Run exactly one cycle for `action`, leaving resulting actions queued.
    pub fn step(&mut self, action: M::Action) {
        self.start();
        self.cycle(action);
        self.registry.prune();
    }

    /// Pop the oldest queued action without processing it.
    pub fn take_queued(&mut self) -> Option<M::Action> {
        self.queue.pop_front()
    }

    pub fn queued(&self) -> impl Iterator<Item = &M::Action> {
        self.queue.iter()
    }

    /// Move scheduler deliveries into the queue. Returns how many arrived.
    pub fn poll_scheduler(&mut self) -> usize {
        let delivered = self.scheduler.drain();
        let count = delivered.len();
        self.queue.extend(delivered);
        count
    }

    /// Whether work registered under `id` may still deliver.
    pub fn is_in_flight(&self, id: CancelId) -> bool {
        self.registry.contains(id)
    }

    fn cycle(&mut self, action: M::Action) {
        let _span = debug_span!(
            "presents.store.cycle",
            action_type = std::any::type_name::<M::Action>(),
            duration_us = tracing::field::Empty,
            cmd_count = tracing::field::Empty
        )
        .entered();
        let start = Instant::now();
        let updated = self.model.update(action, &self.env);
        let presented = self.model.present(&self.env);
        let cmd = Cmd::batch(vec![updated, presented]);
        tracing::Span::current().record("duration_us", start.elapsed().as_micros() as u64);
        tracing::Span::current().record("cmd_count", cmd.count());
        self.execute(cmd, &mut Vec::new());
    }

    fn execute(&mut self, cmd: Cmd<M::Action>, scope: &mut Vec<CancelId>) {
        match cmd {
            Cmd::None => {}
            Cmd::Quit => self.running = false,
            Cmd::Msg(action) => self.queue.push_back(action),
            Cmd::Batch(cmds) => {
                for c in cmds {
                    self.execute(c, scope);
                }
            }
            Cmd::Sequence(cmds) => {
                for c in cmds {
                    self.execute(c, scope);
                    if !self.running {
                        break;
                    }
                }
            }
            Cmd::Task(job) => {
                let token = self.registry.register(scope);
                self.scheduler.spawn_task(job, token);
            }
            Cmd::Timer { every, tick } => {
                let token = self.registry.register(scope);
                trace!(every_ms = every.as_millis() as u64, "timer scheduled");
                self.scheduler.spawn_timer(every, tick, token);
            }
            Cmd::Cancellable(id, inner) => {
                scope.push(id);
                self.execute(*inner, scope);
                scope.pop();
            }
            Cmd::Cancel(id) => {
                let cancelled = self.registry.cancel(id);
                debug!(%id, cancelled, "cancel");
            }
        }
    }
}
