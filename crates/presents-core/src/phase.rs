#![forbid(unsafe_code)]

//! The per-child presentation lifecycle.
//!
//! A [`PresentationPhase`] is an `Option` with memory: besides "there is a
//! value" it records whether the begin effect for that value has run and
//! whether the end effect has been requested.
//!
//! ```text
//!              set Some          advance (begin)
//!  Dismissed ───────────▶ Presenting ───────────▶ Presented
//!      ▲  ▲                   │                       │
//!      │  └───────────────────┘ set None              │ set None
//!      │                                              ▼
//!      │                  Dismissing ◀────────────────┘
//!      │                      │
//!      │  advance (end,       │ advance (end, gating)
//!      │  fire and forget)    ▼
//!      ├──────────────── Cancelling
//!      │                      │
//!      └──────────────────────┘ advance
//! ```
//!
//! # Invariants
//!
//! - [`set_value`](PresentationPhase::set_value) with `Some` never changes the
//!   variant of a non-dismissed phase; it only refreshes the carried value.
//! - Repeated `None` requests are idempotent once teardown has started.
//! - An end effect is only ever requested for a value whose begin effect ran:
//!   a value withdrawn while still `Presenting` is dropped without effects.
//! - Only the driver step moves a phase out of `Presenting`, `Dismissing` or
//!   `Cancelling`.

use core::fmt;

use crate::presenter::{Presenter, PresenterEffect, Transition};

/// Lifecycle state of a single presentable value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PresentationPhase<S> {
    /// No value.
    Dismissed,
    /// The value just arrived; its begin effect has not run.
    Presenting(S),
    /// The value is active; its begin effect has run.
    Presented(S),
    /// The value was removed; its end effect has not run.
    Dismissing(S),
    /// The end effect has run; waiting for the final step to `Dismissed`.
    Cancelling(S),
}

impl<S> Default for PresentationPhase<S> {
    fn default() -> Self {
        Self::Dismissed
    }
}

/// Fieldless mirror of [`PresentationPhase`], used in logs and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    Dismissed,
    Presenting,
    Presented,
    Dismissing,
    Cancelling,
}

impl PhaseKind {
    /// Lowercase name of the phase.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dismissed => "dismissed",
            Self::Presenting => "presenting",
            Self::Presented => "presented",
            Self::Dismissing => "dismissing",
            Self::Cancelling => "cancelling",
        }
    }

    /// Whether the phase is part of a teardown.
    #[must_use]
    pub const fn is_tearing_down(self) -> bool {
        matches!(self, Self::Dismissing | Self::Cancelling)
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<S> PresentationPhase<S> {
    /// Create a phase that is about to present `value`.
    #[must_use]
    pub const fn presenting(value: S) -> Self {
        Self::Presenting(value)
    }

    /// The carried value, `None` only when dismissed.
    #[must_use]
    pub fn value(&self) -> Option<&S> {
        match self {
            Self::Dismissed => None,
            Self::Presenting(s) | Self::Presented(s) | Self::Dismissing(s) | Self::Cancelling(s) => {
                Some(s)
            }
        }
    }

    /// Mutable access to the carried value. Mutating through this reference
    /// never changes the phase.
    pub fn value_mut(&mut self) -> Option<&mut S> {
        match self {
            Self::Dismissed => None,
            Self::Presenting(s) | Self::Presented(s) | Self::Dismissing(s) | Self::Cancelling(s) => {
                Some(s)
            }
        }
    }

    /// Consume the phase, returning the carried value.
    #[must_use]
    pub fn into_value(self) -> Option<S> {
        match self {
            Self::Dismissed => None,
            Self::Presenting(s) | Self::Presented(s) | Self::Dismissing(s) | Self::Cancelling(s) => {
                Some(s)
            }
        }
    }

    /// Apply the latest desired value.
    ///
    /// | current              | `Some(x)`             | `None`          |
    /// |----------------------|-----------------------|-----------------|
    /// | `Dismissed`          | `Presenting(x)`       | unchanged       |
    /// | `Presenting(_)`      | `Presenting(x)`       | `Dismissed`     |
    /// | `Presented(_)`       | `Presented(x)`        | `Dismissing(s)` |
    /// | `Dismissing(_)`      | `Dismissing(x)`       | unchanged       |
    /// | `Cancelling(_)`      | `Cancelling(x)`       | unchanged       |
    pub fn set_value(&mut self, value: Option<S>) {
        let before = self.kind();
        *self = match (core::mem::take(self), value) {
            (Self::Dismissed, Some(x)) => Self::Presenting(x),
            (Self::Dismissed, None) => Self::Dismissed,
            (Self::Presenting(_), Some(x)) => Self::Presenting(x),
            (Self::Presented(_), Some(x)) => Self::Presented(x),
            (Self::Dismissing(_), Some(x)) => Self::Dismissing(x),
            (Self::Cancelling(_), Some(x)) => Self::Cancelling(x),
            (Self::Presenting(_), None) => Self::Dismissed,
            (Self::Presented(s), None) => Self::Dismissing(s),
            (held @ (Self::Dismissing(_) | Self::Cancelling(_)), None) => held,
        };
        let after = self.kind();
        if before != after {
            crate::phase_trace!(from = %before, to = %after, "phase set");
        }
    }

    /// Fieldless discriminant of the current phase.
    #[must_use]
    pub const fn kind(&self) -> PhaseKind {
        match self {
            Self::Dismissed => PhaseKind::Dismissed,
            Self::Presenting(_) => PhaseKind::Presenting,
            Self::Presented(_) => PhaseKind::Presented,
            Self::Dismissing(_) => PhaseKind::Dismissing,
            Self::Cancelling(_) => PhaseKind::Cancelling,
        }
    }

    /// True only in `Presented`: the child may receive actions.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Presented(_))
    }

    #[must_use]
    pub const fn is_dismissed(&self) -> bool {
        matches!(self, Self::Dismissed)
    }

    /// Whether the driver step would leave this phase unchanged.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        matches!(self, Self::Dismissed | Self::Presented(_))
    }

    /// Advance one lifecycle step, invoking `presenter` on begin and end.
    ///
    /// Returns the transition and the presenter's outcome when one ran.
    pub(crate) fn step<Env, Fx>(
        &mut self,
        presenter: &Presenter<S, Env, Fx>,
        env: &Env,
    ) -> Option<(Transition, PresenterEffect<Fx>)> {
        let before = self.kind();
        let (next, fired) = match core::mem::take(self) {
            Self::Presenting(s) => {
                let outcome = presenter.call(&s, Transition::Begin, env);
                (Self::Presented(s), Some((Transition::Begin, outcome)))
            }
            Self::Dismissing(s) => {
                let outcome = presenter.call(&s, Transition::End, env);
                let next = if outcome.is_gating() {
                    Self::Cancelling(s)
                } else {
                    Self::Dismissed
                };
                (next, Some((Transition::End, outcome)))
            }
            Self::Cancelling(_) => (Self::Dismissed, None),
            settled @ (Self::Dismissed | Self::Presented(_)) => (settled, None),
        };
        *self = next;
        let after = self.kind();
        if before != after {
            crate::phase_trace!(from = %before, to = %after, "phase advanced");
        }
        fired
    }

    /// Like [`step`](Self::step), but when `desired` is set a value that is
    /// tearing down finishes its teardown and begins a new appearance in the
    /// same step.
    pub(crate) fn step_reappearing<Env, Fx>(
        &mut self,
        presenter: &Presenter<S, Env, Fx>,
        env: &Env,
        desired: bool,
    ) -> Vec<(Transition, PresenterEffect<Fx>)> {
        if !desired || !self.kind().is_tearing_down() {
            return self.step(presenter, env).into_iter().collect();
        }
        let mut fired = Vec::with_capacity(2);
        *self = match core::mem::take(self) {
            Self::Dismissing(s) => {
                let outcome = presenter.call(&s, Transition::End, env);
                let gating = outcome.is_gating();
                fired.push((Transition::End, outcome));
                if gating {
                    Self::Cancelling(s)
                } else {
                    Self::Presenting(s)
                }
            }
            Self::Cancelling(s) => Self::Presenting(s),
            other => other,
        };
        if matches!(self, Self::Presenting(_)) {
            crate::phase_trace!("phase reappearing");
            fired.extend(self.step(presenter, env));
        }
        fired
    }
}

impl<S> From<Option<S>> for PresentationPhase<S> {
    /// `Some` starts a new appearance; `None` is dismissed.
    fn from(value: Option<S>) -> Self {
        value.map_or(Self::Dismissed, Self::Presenting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presenter::PresenterEffect;

    fn gated() -> Presenter<&'static str, (), (Transition, &'static str)> {
        Presenter::new(|s, t, _| PresenterEffect::Action((t, *s)))
    }

    fn immediate() -> Presenter<&'static str, (), (Transition, &'static str)> {
        Presenter::new(|s, t, _| PresenterEffect::FireAndForget((t, *s)))
    }

    // --- set_value ---

    #[test]
    fn dismissed_with_some_starts_presenting() {
        let mut phase = PresentationPhase::Dismissed;
        phase.set_value(Some("a"));
        assert_eq!(phase, PresentationPhase::Presenting("a"));
    }

    #[test]
    fn dismissed_with_none_is_unchanged() {
        let mut phase: PresentationPhase<u8> = PresentationPhase::Dismissed;
        phase.set_value(None);
        assert!(phase.is_dismissed());
    }

    #[test]
    fn some_refreshes_without_changing_variant() {
        for mut phase in [
            PresentationPhase::Presenting(1),
            PresentationPhase::Presented(1),
            PresentationPhase::Dismissing(1),
            PresentationPhase::Cancelling(1),
        ] {
            let kind = phase.kind();
            phase.set_value(Some(2));
            assert_eq!(phase.kind(), kind);
            assert_eq!(phase.value(), Some(&2));
        }
    }

    #[test]
    fn none_begins_teardown_from_presented() {
        let mut presented = PresentationPhase::Presented("a");
        presented.set_value(None);
        assert_eq!(presented, PresentationPhase::Dismissing("a"));
    }

    #[test]
    fn repeated_none_is_idempotent() {
        let mut phase = PresentationPhase::Presented("a");
        phase.set_value(None);
        phase.set_value(None);
        phase.set_value(None);
        assert_eq!(phase, PresentationPhase::Dismissing("a"));

        let mut cancelling = PresentationPhase::Cancelling("a");
        cancelling.set_value(None);
        assert_eq!(cancelling, PresentationPhase::Cancelling("a"));
    }

    #[test]
    fn value_accessors() {
        assert_eq!(PresentationPhase::<u8>::Dismissed.value(), None);
        assert_eq!(PresentationPhase::Cancelling(3).value(), Some(&3));
        assert_eq!(PresentationPhase::Dismissing(4).into_value(), Some(4));

        let mut phase = PresentationPhase::Presented(String::from("x"));
        if let Some(v) = phase.value_mut() {
            v.push('y');
        }
        assert_eq!(phase, PresentationPhase::Presented(String::from("xy")));
    }

    // --- step ---

    #[test]
    fn present_then_dismiss_with_gated_end() {
        let presenter = gated();
        let mut phase = PresentationPhase::Dismissed;

        phase.set_value(Some("a"));
        let begin = phase.step(&presenter, &());
        assert_eq!(phase, PresentationPhase::Presented("a"));
        assert_eq!(
            begin.map(|(t, fx)| (t, fx.into_effect())),
            Some((Transition::Begin, (Transition::Begin, "a")))
        );

        assert!(phase.step(&presenter, &()).is_none());
        assert_eq!(phase, PresentationPhase::Presented("a"));

        phase.set_value(None);
        let end = phase.step(&presenter, &());
        assert_eq!(phase, PresentationPhase::Cancelling("a"));
        assert!(matches!(end, Some((Transition::End, PresenterEffect::Action(_)))));

        assert!(phase.step(&presenter, &()).is_none());
        assert!(phase.is_dismissed());
    }

    #[test]
    fn fire_and_forget_end_skips_cancelling() {
        let presenter = immediate();
        let mut phase = PresentationPhase::Presented("a");
        phase.set_value(None);
        let end = phase.step(&presenter, &());
        assert!(phase.is_dismissed());
        assert!(matches!(
            end,
            Some((Transition::End, PresenterEffect::FireAndForget(_)))
        ));
    }

    #[test]
    fn many_sets_before_step_fire_begin_once() {
        let presenter = gated();
        let mut phase = PresentationPhase::Dismissed;
        phase.set_value(Some("a"));
        phase.set_value(Some("b"));
        phase.set_value(Some("c"));
        let fired = phase.step(&presenter, &());
        assert_eq!(
            fired.map(|(_, fx)| fx.into_effect()),
            Some((Transition::Begin, "c"))
        );
        assert!(phase.step(&presenter, &()).is_none());
    }

    #[test]
    fn appear_and_vanish_in_one_cycle_fires_nothing() {
        let presenter = gated();
        let mut phase = PresentationPhase::Dismissed;
        phase.set_value(Some("a"));
        phase.set_value(None);
        assert!(phase.is_dismissed());
        assert!(phase.step(&presenter, &()).is_none());
        assert!(phase.step(&presenter, &()).is_none());

        // A later appearance still begins normally.
        phase.set_value(Some("b"));
        let fired = phase.step(&presenter, &());
        assert_eq!(
            fired.map(|(_, fx)| fx.into_effect()),
            Some((Transition::Begin, "b"))
        );
    }

    #[test]
    fn kind_display_and_settled() {
        assert_eq!(PhaseKind::Cancelling.to_string(), "cancelling");
        assert!(PhaseKind::Dismissing.is_tearing_down());
        assert!(!PhaseKind::Presented.is_tearing_down());
        assert!(PresentationPhase::Presented(1).is_settled());
        assert!(!PresentationPhase::Presenting(1).is_settled());
        assert!(PresentationPhase::Presented(1).is_active());
        assert!(!PresentationPhase::Dismissing(1).is_active());
    }

    #[test]
    fn from_option() {
        assert_eq!(
            PresentationPhase::from(Some(1)),
            PresentationPhase::Presenting(1)
        );
        assert!(PresentationPhase::<u8>::from(None).is_dismissed());
    }
}
