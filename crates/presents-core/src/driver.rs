#![forbid(unsafe_code)]

//! The driver protocol shared by every phase container.
//!
//! Hosts run one cycle per update:
//!
//! 1. [`PhaseDriver::apply`] the latest desired value(s).
//! 2. [`PhaseDriver::advance`] once, collecting [`PhaseEffect`]s.
//! 3. Route the effects to whatever executes work, keyed by
//!    [`PhaseEffect::identity`].
//!
//! Being generic over [`PhaseDriver`] lets one host loop drive a single
//! phase, an exclusive phase or a keyed collection.

use core::fmt::Debug;

use crate::phase::{PhaseKind, PresentationPhase};
use crate::presenter::{Presenter, PresenterEffect, Transition};

/// An effect requested by a presenter, tagged with its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseEffect<I, Fx> {
    /// Identity of the value whose transition produced this effect.
    pub identity: I,
    pub transition: Transition,
    /// Whether completion gates the lifecycle (see [`PresenterEffect::Action`]).
    pub gating: bool,
    pub effect: Fx,
}

impl<I, Fx> PhaseEffect<I, Fx> {
    pub(crate) fn new(identity: I, transition: Transition, outcome: PresenterEffect<Fx>) -> Self {
        Self {
            identity,
            transition,
            gating: outcome.is_gating(),
            effect: outcome.into_effect(),
        }
    }

    /// Transform the effect, keeping identity and transition.
    pub fn map<G>(self, f: impl FnOnce(Fx) -> G) -> PhaseEffect<I, G> {
        PhaseEffect {
            identity: self.identity,
            transition: self.transition,
            gating: self.gating,
            effect: f(self.effect),
        }
    }

    #[must_use]
    pub const fn is_begin(&self) -> bool {
        matches!(self.transition, Transition::Begin)
    }

    #[must_use]
    pub const fn is_end(&self) -> bool {
        matches!(self.transition, Transition::End)
    }
}

/// A phase container that can be reconciled and advanced.
pub trait PhaseDriver<S> {
    /// Identity attached to produced effects.
    type Identity: Clone + Debug + PartialEq;

    /// The shape of the desired value applied each cycle.
    type Desired;

    /// Apply the latest desired value(s).
    fn apply(&mut self, desired: Self::Desired);

    /// Advance every tracked phase by one step.
    ///
    /// Begin effects are returned before end effects only within a single
    /// identity; across identities the order follows the container.
    fn advance<Env, Fx>(
        &mut self,
        presenter: &Presenter<S, Env, Fx>,
        env: &Env,
    ) -> Vec<PhaseEffect<Self::Identity, Fx>>;

    /// Phase of `identity`. Identities the container does not hold are
    /// `Dismissed`.
    fn kind_of(&self, identity: &Self::Identity) -> PhaseKind;

    /// Mutable access to the value carried for `identity`, in any
    /// non-dismissed phase.
    fn value_of_mut(&mut self, identity: &Self::Identity) -> Option<&mut S>;

    /// Whether another `advance` would be a no-op.
    fn is_settled(&self) -> bool;

    /// Whether `identity` is currently `Presented`.
    fn is_active(&self, identity: &Self::Identity) -> bool {
        self.kind_of(identity) == PhaseKind::Presented
    }

    /// Drop fully dismissed entries. Returns the number removed.
    fn garbage_collect(&mut self) -> usize {
        0
    }
}

impl<S> PhaseDriver<S> for PresentationPhase<S> {
    type Identity = ();
    type Desired = Option<S>;

    fn apply(&mut self, desired: Option<S>) {
        self.set_value(desired);
    }

    fn advance<Env, Fx>(
        &mut self,
        presenter: &Presenter<S, Env, Fx>,
        env: &Env,
    ) -> Vec<PhaseEffect<(), Fx>> {
        self.step(presenter, env)
            .map(|(transition, outcome)| PhaseEffect::new((), transition, outcome))
            .into_iter()
            .collect()
    }

    fn kind_of(&self, _identity: &()) -> PhaseKind {
        self.kind()
    }

    fn value_of_mut(&mut self, _identity: &()) -> Option<&mut S> {
        self.value_mut()
    }

    fn is_settled(&self) -> bool {
        PresentationPhase::is_settled(self)
    }
}

/// Apply `desired` and advance until the container settles.
///
/// Returns every effect produced along the way. `max_steps` bounds the loop;
/// every container settles within a handful of steps for a fixed input.
pub fn settle<S, D, Env, Fx>(
    driver: &mut D,
    desired: D::Desired,
    presenter: &Presenter<S, Env, Fx>,
    env: &Env,
    max_steps: usize,
) -> Vec<PhaseEffect<D::Identity, Fx>>
where
    D: PhaseDriver<S>,
    D::Desired: Clone,
{
    let mut effects = Vec::new();
    for _ in 0..max_steps {
        driver.apply(desired.clone());
        effects.extend(driver.advance(presenter, env));
        if driver.is_settled() {
            break;
        }
    }
    effects
}

#[cfg(test)]
mod tests {
    use super::*;

    fn presenter() -> Presenter<u32, (), String> {
        Presenter::new(|s, t, _| PresenterEffect::Action(format!("{t}:{s}")))
    }

    #[test]
    fn scenario_single_present() {
        let mut phase = PresentationPhase::Dismissed;
        phase.apply(Some(7));
        assert_eq!(phase, PresentationPhase::Presenting(7));

        let effects = phase.advance(&presenter(), &());
        assert_eq!(phase, PresentationPhase::Presented(7));
        assert_eq!(effects.len(), 1);
        assert!(effects[0].is_begin());
        assert!(effects[0].gating);
        assert_eq!(effects[0].effect, "begin:7");
    }

    #[test]
    fn scenario_single_dismiss() {
        let mut phase = PresentationPhase::Presented(7);
        phase.apply(None);
        assert_eq!(phase, PresentationPhase::Dismissing(7));

        let effects = phase.advance(&presenter(), &());
        assert_eq!(phase, PresentationPhase::Cancelling(7));
        assert_eq!(effects.len(), 1);
        assert!(effects[0].is_end());
        assert_eq!(effects[0].effect, "end:7");

        let effects = phase.advance(&presenter(), &());
        assert!(effects.is_empty());
        assert_eq!(phase.kind(), PhaseKind::Dismissed);
    }

    #[test]
    fn is_active_guard() {
        let phase = PresentationPhase::Presented(1);
        assert!(PhaseDriver::is_active(&phase, &()));
        let phase = PresentationPhase::Presenting(1);
        assert!(!PhaseDriver::is_active(&phase, &()));
    }

    #[test]
    fn settle_runs_until_stable() {
        let mut phase = PresentationPhase::Presented(1);
        let effects = settle(&mut phase, None, &presenter(), &(), 8);
        assert!(phase.is_dismissed());
        let transitions: Vec<_> = effects.iter().map(|e| e.transition).collect();
        assert_eq!(transitions, vec![Transition::End]);
    }

    #[test]
    fn effect_map_keeps_tags() {
        let effect = PhaseEffect {
            identity: "k",
            transition: Transition::End,
            gating: false,
            effect: 2,
        };
        let mapped = effect.map(|n| n * 3);
        assert_eq!(mapped.identity, "k");
        assert_eq!(mapped.transition, Transition::End);
        assert!(!mapped.gating);
        assert_eq!(mapped.effect, 6);
    }
}
