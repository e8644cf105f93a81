#![forbid(unsafe_code)]

//! Reference models built from a countdown timer.
//!
//! A timer child starts ticking when presented, counts down once per tick
//! and reports `Finished` at zero. Two parents host it:
//!
//! - [`ManyTimers`] runs any number of timers side by side in a keyed
//!   collection and removes each one as it finishes.
//! - [`ModalTimer`] shows one fast or slow timer at a time in an exclusive
//!   phase; switching kinds tears the old timer down before the new starts.

use std::time::Duration;

use presents_core::{ExclusivePhase, Identified, KeyedPhases, Presenter, PresenterEffect};
use presents_runtime::{
    ActionGuard, CancelId, Cmd, Driver, DroppedActionPolicy, LongRunningAction, LongRunningEvent, Model,
    Presents, drive, long_running,
};

/// Scope of [`ManyTimers`] children.
pub const TIMERS: &str = "timers";

/// Scope of the [`ModalTimer`] child.
pub const MODAL: &str = "modal";

/// Countdown state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerState {
    pub id: u32,
    pub name: String,
    pub count: i32,
}

impl TimerState {
    pub fn new(id: u32, name: impl Into<String>, count: i32) -> Self {
        Self {
            id,
            name: name.into(),
            count,
        }
    }

    /// Id of the ticking timer this countdown starts.
    #[must_use]
    pub fn ticks_id(&self) -> CancelId {
        CancelId::scoped("timer.ticks", &self.id)
    }
}

impl Identified for TimerState {
    type Id = u32;

    fn id(&self) -> u32 {
        self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerAction {
    Begin,
    Cancel,
    Tick,
    Finished,
}

impl TimerAction {
    /// Whether this is the action a timer's own end effect sends it.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Cancel)
    }
}

impl LongRunningAction for TimerAction {
    fn long_running(event: LongRunningEvent) -> Self {
        match event {
            LongRunningEvent::Start => Self::Begin,
            LongRunningEvent::Stop => Self::Cancel,
        }
    }
}

/// Timer child update.
pub fn update(state: &mut TimerState, action: TimerAction, every: Duration) -> Cmd<TimerAction> {
    match action {
        TimerAction::Begin => Cmd::cancellable(
            state.ticks_id(),
            Cmd::timer(every, |_| Some(TimerAction::Tick)),
        ),
        TimerAction::Cancel => Cmd::cancel(state.ticks_id()),
        TimerAction::Tick => {
            state.count -= 1;
            if state.count <= 0 {
                Cmd::msg(TimerAction::Finished)
            } else {
                Cmd::none()
            }
        }
        TimerAction::Finished => Cmd::none(),
    }
}

// ============================================================================
// ManyTimers
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerEnv {
    pub every: Duration,
    pub dropped_actions: DroppedActionPolicy,
}

impl Default for TimerEnv {
    fn default() -> Self {
        Self {
            every: Duration::from_secs(1),
            dropped_actions: DroppedActionPolicy::Warn,
        }
    }
}

/// Parallel timers, each with its own lifecycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManyTimers {
    pub timers: Presents<KeyedPhases<u32, TimerState>>,
    pub next_id: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManyTimersAction {
    StartTimer { name: String, limit: i32 },
    Timer(u32, TimerAction),
}

impl Model for ManyTimers {
    type Action = ManyTimersAction;
    type Environment = TimerEnv;

    fn update(&mut self, action: ManyTimersAction, env: &TimerEnv) -> Cmd<ManyTimersAction> {
        match action {
            ManyTimersAction::StartTimer { name, limit } => {
                let id = self.next_id;
                self.next_id += 1;
                self.timers
                    .phases_mut()
                    .insert(id, TimerState::new(id, name, limit));
                Cmd::none()
            }
            ManyTimersAction::Timer(id, action) => {
                let guard = ActionGuard::new(TIMERS).with_policy(env.dropped_actions);
                let step = |timer: &mut TimerState| update(timer, action, env.every);
                let routed = if action.is_terminal() {
                    guard.route_terminal(self.timers.phases_mut(), &id, step)
                } else {
                    guard.route(self.timers.phases_mut(), &id, step)
                };
                let child = routed.unwrap_or_default();
                if action == TimerAction::Finished {
                    self.timers.phases_mut().dismiss(&id);
                }
                // Ticks stop with the end effect even if `Cancel` arrives late.
                Driver::new(TIMERS)
                    .scoped(&id, child)
                    .map(move |a| ManyTimersAction::Timer(id, a))
            }
        }
    }

    fn present(&mut self, _env: &TimerEnv) -> Cmd<ManyTimersAction> {
        drive(
            self.timers.phases_mut(),
            &long_running(),
            &(),
            TIMERS,
            ManyTimersAction::Timer,
        )
    }
}

// ============================================================================
// ModalTimer
// ============================================================================

/// Identity of a [`TimerOption`]: which kind of timer is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerCase {
    Fast,
    Slow,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerOption {
    Fast(TimerState),
    Slow(TimerState),
}

impl TimerOption {
    #[must_use]
    pub const fn case(&self) -> TimerCase {
        match self {
            Self::Fast(_) => TimerCase::Fast,
            Self::Slow(_) => TimerCase::Slow,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &TimerState {
        match self {
            Self::Fast(s) | Self::Slow(s) => s,
        }
    }

    pub fn state_mut(&mut self) -> &mut TimerState {
        match self {
            Self::Fast(s) | Self::Slow(s) => s,
        }
    }
}

impl Identified for TimerOption {
    type Id = TimerCase;

    fn id(&self) -> TimerCase {
        self.case()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerOptionAction {
    pub case: TimerCase,
    pub action: TimerAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModalTimerEnv {
    pub fast: Duration,
    pub slow: Duration,
    pub dropped_actions: DroppedActionPolicy,
}

impl Default for ModalTimerEnv {
    fn default() -> Self {
        Self {
            fast: Duration::from_millis(250),
            slow: Duration::from_secs(1),
            dropped_actions: DroppedActionPolicy::Warn,
        }
    }
}

impl ModalTimerEnv {
    #[must_use]
    pub const fn period(&self, case: TimerCase) -> Duration {
        match case {
            TimerCase::Fast => self.fast,
            TimerCase::Slow => self.slow,
        }
    }
}

/// One fast or slow timer at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModalTimer {
    pub timer: Presents<ExclusivePhase<TimerOption>>,
    pub next_id: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalTimerAction {
    StartFast,
    StartSlow,
    Dismiss,
    Timer(TimerOptionAction),
}

impl ModalTimer {
    /// Long-running presenter that addresses the child by its case.
    pub fn presenter() -> Presenter<TimerOption, ModalTimerEnv, Cmd<TimerOptionAction>> {
        let notify = |option: &TimerOption, action| {
            PresenterEffect::Action(Cmd::msg(TimerOptionAction {
                case: option.case(),
                action,
            }))
        };
        Presenter::begin_end(
            move |option, _| notify(option, TimerAction::Begin),
            move |option, _| notify(option, TimerAction::Cancel),
        )
    }

    fn start(&mut self, case: TimerCase, limit: i32) {
        let state = TimerState::new(self.next_id, format!("{case:?}"), limit);
        self.next_id += 1;
        self.timer.set(Some(match case {
            TimerCase::Fast => TimerOption::Fast(state),
            TimerCase::Slow => TimerOption::Slow(state),
        }));
    }
}

/// Countdown length of a modal timer.
pub const MODAL_LIMIT: i32 = 10;

impl Model for ModalTimer {
    type Action = ModalTimerAction;
    type Environment = ModalTimerEnv;

    fn update(&mut self, action: ModalTimerAction, env: &ModalTimerEnv) -> Cmd<ModalTimerAction> {
        match action {
            ModalTimerAction::StartFast => {
                self.start(TimerCase::Fast, MODAL_LIMIT);
                Cmd::none()
            }
            ModalTimerAction::StartSlow => {
                self.start(TimerCase::Slow, MODAL_LIMIT);
                Cmd::none()
            }
            ModalTimerAction::Dismiss => {
                self.timer.set(None);
                Cmd::none()
            }
            ModalTimerAction::Timer(TimerOptionAction { case, action }) => {
                let every = env.period(case);
                let guard = ActionGuard::new(MODAL).with_policy(env.dropped_actions);
                let step = |option: &mut TimerOption| update(option.state_mut(), action, every);
                let routed = if action.is_terminal() {
                    guard.route_terminal(self.timer.phases_mut(), &case, step)
                } else {
                    guard.route(self.timer.phases_mut(), &case, step)
                };
                let child = routed.unwrap_or_default();
                if action == TimerAction::Finished {
                    self.timer.set(None);
                }
                Driver::new(MODAL)
                    .scoped(&case, child)
                    .map(move |action| ModalTimerAction::Timer(TimerOptionAction { case, action }))
            }
        }
    }

    fn present(&mut self, env: &ModalTimerEnv) -> Cmd<ModalTimerAction> {
        drive(
            self.timer.phases_mut(),
            &Self::presenter(),
            env,
            MODAL,
            |_, action| ModalTimerAction::Timer(action),
        )
    }
}
