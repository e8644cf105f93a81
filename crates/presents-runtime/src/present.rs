#![forbid(unsafe_code)]

//! Wiring between phase containers and the store's command model.
//!
//! A model keeps each presented child in a [`Presents`] slot, sets the
//! desired value during `update`, and calls [`drive`] from `present`. The
//! driver turns presenter effects into commands:
//!
//! - a begin effect runs inside `Cmd::Cancellable` under an id derived from
//!   the slot's scope and the child's identity;
//! - an end effect is preceded by `Cmd::Cancel` for that same id, so work
//!   started on begin stops when the child leaves;
//! - local child actions are embedded into the model's action type together
//!   with the identity they came from.
//!
//! Child actions flowing back into the model go through an [`ActionGuard`],
//! which refuses actions for children that are not on screen.

use core::fmt::Debug;
use core::hash::Hash;
use std::sync::Arc;

use presents_core::{
    ExclusivePhase, Identified, KeyedPhases, KeyedValues, PhaseDriver, PhaseKind,
    PresentationPhase, Presenter, PresenterEffect, Transition,
};
use tracing::{debug, warn};

use crate::cancel::CancelId;
use crate::cmd::Cmd;
use crate::config::{DroppedActionPolicy, RuntimeConfig};

/// Converts presenter effects of one container into store commands.
#[derive(Debug, Clone, Copy)]
pub struct Driver<'a> {
    scope: &'a str,
    cancel_on_end: bool,
}

impl<'a> Driver<'a> {
    /// Driver for the container named `scope`.
    ///
    /// Scopes must be unique per container within a store.
    #[must_use]
    pub const fn new(scope: &'a str) -> Self {
        Self {
            scope,
            cancel_on_end: true,
        }
    }

    /// Whether an end effect is preceded by cancelling the identity's begin
    /// work. Defaults to `true`.
    #[must_use]
    pub const fn cancel_on_end(mut self, enabled: bool) -> Self {
        self.cancel_on_end = enabled;
        self
    }

    #[must_use]
    pub const fn scope(&self) -> &'a str {
        self.scope
    }

    /// Cancellation id of the begin work for `identity`.
    #[must_use]
    pub fn cancel_id<I: Hash + ?Sized>(&self, identity: &I) -> CancelId {
        CancelId::scoped(self.scope, identity)
    }

    /// Run `cmd` under the cancellation scope of `identity`.
    ///
    /// Wrap commands returned by a child's own `update` with this so that
    /// work the child starts is cancelled along with its begin effect.
    pub fn scoped<I: Hash + ?Sized, A>(&self, identity: &I, cmd: Cmd<A>) -> Cmd<A> {
        Cmd::cancellable(self.cancel_id(identity), cmd)
    }

    /// Advance `phases`, collect dismissed entries, and return the resulting
    /// commands as one batch.
    pub fn drive<P, S, Env, L, A>(
        &self,
        phases: &mut P,
        presenter: &Presenter<S, Env, Cmd<L>>,
        env: &Env,
        embed: impl Fn(P::Identity, L) -> A + Send + Sync + 'static,
    ) -> Cmd<A>
    where
        P: PhaseDriver<S>,
        P::Identity: Hash + Send + Sync + 'static,
        L: 'static,
        A: 'static,
    {
        let embed = Arc::new(embed);
        let mut cmds = Vec::new();

        for effect in phases.advance(presenter, env) {
            let id = self.cancel_id(&effect.identity);
            let identity = effect.identity.clone();
            let embed = Arc::clone(&embed);
            let cmd = effect.effect.map(move |local| embed(identity.clone(), local));

            debug!(
                scope = self.scope,
                identity = ?effect.identity,
                transition = %effect.transition,
                gating = effect.gating,
                cmd_type = cmd.type_name(),
                "presentation effect"
            );

            cmds.push(match effect.transition {
                Transition::Begin => Cmd::cancellable(id, cmd),
                Transition::End if self.cancel_on_end => Cmd::sequence(vec![Cmd::cancel(id), cmd]),
                Transition::End => cmd,
            });
        }

        phases.garbage_collect();
        Cmd::batch(cmds)
    }
}

/// [`Driver::drive`] with default options.
pub fn drive<P, S, Env, L, A>(
    phases: &mut P,
    presenter: &Presenter<S, Env, Cmd<L>>,
    env: &Env,
    scope: &str,
    embed: impl Fn(P::Identity, L) -> A + Send + Sync + 'static,
) -> Cmd<A>
where
    P: PhaseDriver<S>,
    P::Identity: Hash + Send + Sync + 'static,
    L: 'static,
    A: 'static,
{
    Driver::new(scope).drive(phases, presenter, env, embed)
}

/// Slot holding a phase container inside a model.
///
/// `get` reads what is visible; `set` records what is desired.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Presents<P> {
    phases: P,
}

impl<P> Presents<P> {
    #[must_use]
    pub const fn new(phases: P) -> Self {
        Self { phases }
    }

    #[must_use]
    pub const fn phases(&self) -> &P {
        &self.phases
    }

    pub fn phases_mut(&mut self) -> &mut P {
        &mut self.phases
    }

    #[must_use]
    pub fn into_inner(self) -> P {
        self.phases
    }
}

impl<S> Presents<PresentationPhase<S>> {
    #[must_use]
    pub fn get(&self) -> Option<&S> {
        self.phases.value()
    }

    pub fn set(&mut self, value: Option<S>) {
        self.phases.set_value(value);
    }
}

impl<S: Identified> Presents<ExclusivePhase<S>> {
    /// The visible value. During a switch this is the outgoing child.
    #[must_use]
    pub fn get(&self) -> Option<&S> {
        self.phases.value()
    }

    pub fn set(&mut self, value: Option<S>) {
        self.phases.set_value(value);
    }
}

impl<K: Hash + Eq + Clone, S> Presents<KeyedPhases<K, S>> {
    /// Every visible child, in order.
    #[must_use]
    pub fn get(&self) -> KeyedValues<K, S>
    where
        S: Clone,
    {
        self.phases.visible_values()
    }

    pub fn set(&mut self, values: impl IntoIterator<Item = (K, S)>) {
        self.phases.reconcile(values);
    }

    /// Replace the tracked phases, keeping entries that are still on
    /// screen and dropping dismissed ones.
    pub fn set_phases(&mut self, phases: KeyedPhases<K, S>) {
        self.phases.merge(phases);
    }
}

/// Lifecycle notification sent to a long-running child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LongRunningEvent {
    Start,
    Stop,
}

/// Child action type that can receive [`LongRunningEvent`]s.
pub trait LongRunningAction: Sized {
    fn long_running(event: LongRunningEvent) -> Self;
}

/// Presenter sending `Start` on begin and `Stop` on end.
///
/// Both are gating. A dismissed child holds in `Cancelling` until the next
/// cycle, which is normally the one handling `Stop`.
pub fn long_running<S, Env, A>() -> Presenter<S, Env, Cmd<A>>
where
    A: LongRunningAction,
{
    Presenter::begin_end(
        |_, _| PresenterEffect::Action(Cmd::msg(A::long_running(LongRunningEvent::Start))),
        |_, _| PresenterEffect::Action(Cmd::msg(A::long_running(LongRunningEvent::Stop))),
    )
}

/// `Presenter::long_running()` constructor syntax.
pub trait LongRunningPresenter {
    fn long_running() -> Self;
}

impl<S, Env, A: LongRunningAction> LongRunningPresenter for Presenter<S, Env, Cmd<A>> {
    fn long_running() -> Self {
        long_running()
    }
}

/// Routes child actions to children that can receive them.
#[derive(Debug, Clone, Copy)]
pub struct ActionGuard<'a> {
    scope: &'a str,
    policy: DroppedActionPolicy,
}

impl<'a> ActionGuard<'a> {
    #[must_use]
    pub const fn new(scope: &'a str) -> Self {
        Self {
            scope,
            policy: DroppedActionPolicy::Warn,
        }
    }

    #[must_use]
    pub const fn with_policy(mut self, policy: DroppedActionPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub const fn from_config(scope: &'a str, config: &RuntimeConfig) -> Self {
        Self::new(scope).with_policy(config.dropped_actions)
    }

    /// Whether a child in `kind` may receive ordinary actions.
    #[must_use]
    pub const fn admits(kind: PhaseKind) -> bool {
        matches!(kind, PhaseKind::Presented)
    }

    /// Whether a child in `kind` may receive the terminal action of its own
    /// end effect.
    ///
    /// A gated end effect leaves the child `Cancelling` for exactly the cycle
    /// that delivers that action (`Stop` for [`long_running`]).
    #[must_use]
    pub const fn admits_terminal(kind: PhaseKind) -> bool {
        matches!(kind, PhaseKind::Cancelling)
    }

    /// Run `f` on the child at `identity` if it is presented.
    ///
    /// Otherwise the action is dropped according to the policy and `None`
    /// is returned.
    ///
    /// # Panics
    ///
    /// With [`DroppedActionPolicy::Panic`], when the action is dropped.
    pub fn route<S, P, R>(
        &self,
        phases: &mut P,
        identity: &P::Identity,
        f: impl FnOnce(&mut S) -> R,
    ) -> Option<R>
    where
        P: PhaseDriver<S>,
    {
        self.route_when(Self::admits, phases, identity, f)
    }

    /// Run `f` on the child at `identity` if it is waiting for the terminal
    /// action of its end effect.
    ///
    /// Use this only for the action the end effect itself sends; everything
    /// else goes through [`route`](Self::route).
    ///
    /// # Panics
    ///
    /// With [`DroppedActionPolicy::Panic`], when the action is dropped.
    pub fn route_terminal<S, P, R>(
        &self,
        phases: &mut P,
        identity: &P::Identity,
        f: impl FnOnce(&mut S) -> R,
    ) -> Option<R>
    where
        P: PhaseDriver<S>,
    {
        self.route_when(Self::admits_terminal, phases, identity, f)
    }

    fn route_when<S, P, R>(
        &self,
        admit: fn(PhaseKind) -> bool,
        phases: &mut P,
        identity: &P::Identity,
        f: impl FnOnce(&mut S) -> R,
    ) -> Option<R>
    where
        P: PhaseDriver<S>,
    {
        let kind = phases.kind_of(identity);
        if admit(kind) {
            if let Some(child) = phases.value_of_mut(identity) {
                return Some(f(child));
            }
        }
        self.reject(identity, kind);
        None
    }

    fn reject(&self, identity: &impl Debug, kind: PhaseKind) {
        match self.policy {
            DroppedActionPolicy::Ignore => {}
            DroppedActionPolicy::Warn => {
                warn!(scope = self.scope, identity = ?identity, phase = %kind, "dropped action for inactive child");
            }
            DroppedActionPolicy::Panic => {
                panic!("action for inactive child {identity:?} in {} ({kind})", self.scope)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Clock {
        Start,
        Stop,
        Tick,
    }

    impl LongRunningAction for Clock {
        fn long_running(event: LongRunningEvent) -> Self {
            match event {
                LongRunningEvent::Start => Self::Start,
                LongRunningEvent::Stop => Self::Stop,
            }
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum App {
        Clock(Clock),
        Row(u32, Clock),
    }

    fn unwrap_cancellable(cmd: Cmd<App>) -> (CancelId, Cmd<App>) {
        match cmd {
            Cmd::Cancellable(id, inner) => (id, *inner),
            other => panic!("expected cancellable, got {other:?}"),
        }
    }

    #[test]
    fn begin_runs_in_identity_scope() {
        let mut phase = PresentationPhase::default();
        phase.set_value(Some(3u32));
        let presenter = Presenter::long_running();

        let cmd = drive(&mut phase, &presenter, &(), "clock", |(), a| App::Clock(a));
        let (id, inner) = unwrap_cancellable(cmd);
        assert_eq!(id, CancelId::scoped("clock", &()));
        assert!(matches!(inner, Cmd::Msg(App::Clock(Clock::Start))));
        assert_eq!(phase.kind(), PhaseKind::Presented);
    }

    #[test]
    fn end_cancels_begin_work_first() {
        let presenter = Presenter::long_running();
        let mut phase = PresentationPhase::Presented(3u32);
        phase.set_value(None);

        let cmd = drive(&mut phase, &presenter, &(), "clock", |(), a| App::Clock(a));
        let Cmd::Sequence(parts) = cmd else {
            panic!("expected sequence");
        };
        assert!(matches!(parts[0], Cmd::Cancel(id) if id == CancelId::scoped("clock", &())));
        assert!(matches!(parts[1], Cmd::Msg(App::Clock(Clock::Stop))));
        assert_eq!(phase.kind(), PhaseKind::Cancelling);
    }

    #[test]
    fn cancel_on_end_can_be_disabled() {
        let presenter = Presenter::long_running();
        let mut phase = PresentationPhase::Presented(3u32);
        phase.set_value(None);

        let cmd = Driver::new("clock")
            .cancel_on_end(false)
            .drive(&mut phase, &presenter, &(), |(), a| App::Clock(a));
        assert!(matches!(cmd, Cmd::Msg(App::Clock(Clock::Stop))));
    }

    #[test]
    fn keyed_effects_carry_their_key() {
        let mut rows: KeyedPhases<u32, &str> = [(1, "john"), (2, "mary")].into_iter().collect();
        let presenter = Presenter::long_running();

        let cmd = drive(&mut rows, &presenter, &(), "rows", App::Row);
        let Cmd::Batch(parts) = cmd else {
            panic!("expected batch");
        };
        let (id_1, inner_1) = unwrap_cancellable(parts.into_iter().next().unwrap());
        assert_eq!(id_1, CancelId::scoped("rows", &1u32));
        assert!(matches!(inner_1, Cmd::Msg(App::Row(1, Clock::Start))));
        assert_ne!(id_1, CancelId::scoped("rows", &2u32));
    }

    #[test]
    fn drive_collects_dismissed_entries() {
        let mut rows: KeyedPhases<u32, &str> = [(1, "john")].into_iter().collect();
        let presenter: Presenter<&str, (), Cmd<Clock>> = Presenter::immediate();
        assert!(drive(&mut rows, &presenter, &(), "rows", App::Row).is_none());

        rows.dismiss(&1);
        let cmd = drive(&mut rows, &presenter, &(), "rows", App::Row);
        assert!(matches!(cmd, Cmd::Cancel(_)));
        assert!(rows.is_empty());
    }

    #[test]
    fn timer_begin_effect_is_cancellable() {
        let presenter: Presenter<u32, (), Cmd<Clock>> = Presenter::begin_end(
            |_, _| {
                PresenterEffect::Action(Cmd::timer(std::time::Duration::from_secs(1), |_| {
                    Some(Clock::Tick)
                }))
            },
            |_, _| PresenterEffect::immediate(),
        );
        let mut phase = PresentationPhase::default();
        phase.set_value(Some(1));
        let cmd = drive(&mut phase, &presenter, &(), "clock", |(), a| App::Clock(a));
        let (_, inner) = unwrap_cancellable(cmd);
        assert_eq!(inner.type_name(), "Timer");
    }

    #[test]
    fn scoped_child_work_shares_the_begin_id() {
        let driver = Driver::new("rows");
        let cmd: Cmd<Clock> = driver.scoped(&7u32, Cmd::task(|| Clock::Tick));
        let Cmd::Cancellable(id, _) = cmd else {
            panic!("expected cancellable");
        };
        assert_eq!(id, driver.cancel_id(&7u32));
        assert!(driver.scoped(&7u32, Cmd::<Clock>::none()).is_none());
    }

    #[test]
    fn slot_reads_visible_and_records_desired() {
        let mut slot: Presents<PresentationPhase<u32>> = Presents::default();
        assert_eq!(slot.get(), None);
        slot.set(Some(4));
        assert_eq!(slot.get(), Some(&4));
        assert_eq!(slot.phases().kind(), PhaseKind::Presenting);

        slot.phases_mut().advance(&Presenter::<u32, (), Cmd<Clock>>::immediate(), &());
        slot.set(None);
        // Still visible while tearing down.
        assert_eq!(slot.get(), Some(&4));
    }

    #[test]
    fn keyed_slot_merges_phases() {
        let mut slot: Presents<KeyedPhases<u32, &str>> = Presents::default();
        slot.set([(1, "john"), (2, "mary")]);
        assert_eq!(slot.get().len(), 2);

        let mut replacement = KeyedPhases::new();
        replacement.insert(3, "ann");
        slot.set_phases(replacement);
        assert_eq!(slot.get().keys().copied().collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn guard_routes_to_presented_child() {
        let mut phase = PresentationPhase::Presented(1u32);
        let guard = ActionGuard::new("counter");
        let routed = guard.route(&mut phase, &(), |n: &mut u32| {
            *n += 1;
            *n
        });
        assert_eq!(routed, Some(2));
    }

    #[test]
    fn guard_drops_ordinary_actions_while_cancelling() {
        let guard = ActionGuard::new("counter").with_policy(DroppedActionPolicy::Ignore);
        let mut phase = PresentationPhase::Cancelling(1u32);
        assert_eq!(guard.route(&mut phase, &(), |n: &mut u32| *n), None);
        assert_eq!(guard.route_terminal(&mut phase, &(), |n: &mut u32| *n), Some(1));
    }

    #[test]
    fn terminal_route_needs_a_cancelling_child() {
        let guard = ActionGuard::new("counter").with_policy(DroppedActionPolicy::Ignore);
        for mut phase in [
            PresentationPhase::Presented(1u32),
            PresentationPhase::Dismissing(1u32),
            PresentationPhase::Dismissed,
        ] {
            assert_eq!(guard.route_terminal(&mut phase, &(), |n: &mut u32| *n), None);
        }
    }

    #[test]
    fn guard_drops_for_inactive_child() {
        let guard = ActionGuard::new("counter").with_policy(DroppedActionPolicy::Ignore);
        let mut phase = PresentationPhase::Presenting(1u32);
        assert_eq!(guard.route(&mut phase, &(), |n: &mut u32| *n), None);
        let mut phase: PresentationPhase<u32> = PresentationPhase::Dismissed;
        assert_eq!(guard.route(&mut phase, &(), |n: &mut u32| *n), None);
    }

    #[test]
    #[should_panic(expected = "action for inactive child")]
    fn strict_guard_panics() {
        let guard = ActionGuard::from_config("counter", &RuntimeConfig::strict());
        let mut phase = PresentationPhase::Dismissing(1u32);
        guard.route(&mut phase, &(), |n: &mut u32| *n);
    }
}
