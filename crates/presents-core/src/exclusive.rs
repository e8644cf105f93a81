#![forbid(unsafe_code)]

//! One presented child at a time, selected by identity.
//!
//! An [`ExclusivePhase`] behaves like a [`PresentationPhase`] until a value
//! with a different identity is requested. The current child is then drained
//! completely, end effect included, before the new one begins.
//!
//! # Invariants
//!
//! - A `Transition` exists only while `from` and `to` have different
//!   identities, and `from` is always tearing down.
//! - Two different identities are never `Presented` at the same time.
//! - The old value stays visible through [`ExclusivePhase::value`] until it
//!   fully clears.
//!
//! # Failure Modes
//!
//! - A third identity requested during a transition is ignored and logged at
//!   debug level. Resend it once the transition settles.
//! - `None` during a transition drops the pending value; the old value keeps
//!   draining.

use crate::Identified;
use crate::driver::{PhaseDriver, PhaseEffect};
use crate::phase::{PhaseKind, PresentationPhase};
use crate::presenter::Presenter;

/// A phase that switches between mutually exclusive identities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExclusivePhase<S> {
    /// No identity change pending.
    Single(PresentationPhase<S>),
    /// `from` is draining toward `Dismissed`; `to` begins once it clears.
    Transition {
        from: PresentationPhase<S>,
        to: S,
    },
}

impl<S> Default for ExclusivePhase<S> {
    fn default() -> Self {
        Self::Single(PresentationPhase::Dismissed)
    }
}

impl<S> From<PresentationPhase<S>> for ExclusivePhase<S> {
    fn from(phase: PresentationPhase<S>) -> Self {
        Self::Single(phase)
    }
}

impl<S> ExclusivePhase<S> {
    /// The visible phase: the single phase, or the draining `from` side.
    #[must_use]
    pub const fn phase(&self) -> &PresentationPhase<S> {
        match self {
            Self::Single(p) | Self::Transition { from: p, .. } => p,
        }
    }

    /// The visible value.
    #[must_use]
    pub fn value(&self) -> Option<&S> {
        self.phase().value()
    }

    /// Mutable access to the visible value.
    pub fn value_mut(&mut self) -> Option<&mut S> {
        match self {
            Self::Single(p) | Self::Transition { from: p, .. } => p.value_mut(),
        }
    }

    /// The value waiting for the current one to clear.
    #[must_use]
    pub const fn pending(&self) -> Option<&S> {
        match self {
            Self::Single(_) => None,
            Self::Transition { to, .. } => Some(to),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> PhaseKind {
        self.phase().kind()
    }

    #[must_use]
    pub const fn is_transitioning(&self) -> bool {
        matches!(self, Self::Transition { .. })
    }

    /// Whether the next step would change nothing.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        match self {
            Self::Single(p) => p.is_settled(),
            Self::Transition { .. } => false,
        }
    }
}

impl<S: Identified> ExclusivePhase<S> {
    /// Identity of the visible value.
    #[must_use]
    pub fn identity(&self) -> Option<S::Id> {
        self.value().map(Identified::id)
    }

    /// Whether `id` is the presented identity.
    #[must_use]
    pub fn is_active(&self, id: &S::Id) -> bool {
        let phase = self.phase();
        phase.is_active() && phase.value().is_some_and(|v| v.id() == *id)
    }

    /// Apply the latest desired value.
    ///
    /// The same identity refreshes the current child. A different identity
    /// starts draining the current child and queues the new value, unless the
    /// current child has not begun yet, in which case it is replaced.
    pub fn set_value(&mut self, value: Option<S>) {
        *self = match (core::mem::take(self), value) {
            (Self::Single(mut phase), Some(next)) => {
                let replaces = phase.value().is_some_and(|current| current.id() != next.id());
                if replaces {
                    phase.set_value(None);
                    if phase.is_dismissed() {
                        // The old value never began; nothing to drain.
                        phase.set_value(Some(next));
                        Self::Single(phase)
                    } else {
                        crate::phase_trace!(from = %phase.kind(), "exclusive transition queued");
                        Self::Transition {
                            from: phase,
                            to: next,
                        }
                    }
                } else {
                    phase.set_value(Some(next));
                    Self::Single(phase)
                }
            }
            (Self::Single(mut phase), None) => {
                phase.set_value(None);
                Self::Single(phase)
            }
            (Self::Transition { mut from, to }, Some(next)) => {
                let id = next.id();
                if to.id() == id {
                    Self::Transition { from, to: next }
                } else if from.value().is_some_and(|current| current.id() == id) {
                    from.set_value(Some(next));
                    Self::Transition { from, to }
                } else {
                    crate::phase_debug!(
                        requested = ?id,
                        pending = ?to.id(),
                        "third identity ignored during exclusive transition"
                    );
                    Self::Transition { from, to }
                }
            }
            (Self::Transition { from, .. }, None) => {
                crate::phase_trace!("exclusive transition abandoned");
                Self::Single(from)
            }
        };
    }

    fn step_into<Env, Fx>(
        phase: &mut PresentationPhase<S>,
        presenter: &Presenter<S, Env, Fx>,
        env: &Env,
        effects: &mut Vec<PhaseEffect<S::Id, Fx>>,
    ) {
        let Some(id) = phase.value().map(Identified::id) else {
            return;
        };
        if let Some((transition, outcome)) = phase.step(presenter, env) {
            effects.push(PhaseEffect::new(id, transition, outcome));
        }
    }
}

impl<S: Identified> PhaseDriver<S> for ExclusivePhase<S> {
    type Identity = S::Id;
    type Desired = Option<S>;

    fn apply(&mut self, desired: Option<S>) {
        self.set_value(desired);
    }

    /// Advance the visible phase. When a draining `from` clears, the queued
    /// value begins in the same step.
    fn advance<Env, Fx>(
        &mut self,
        presenter: &Presenter<S, Env, Fx>,
        env: &Env,
    ) -> Vec<PhaseEffect<S::Id, Fx>> {
        let mut effects = Vec::new();
        *self = match core::mem::take(self) {
            Self::Single(mut phase) => {
                Self::step_into(&mut phase, presenter, env, &mut effects);
                Self::Single(phase)
            }
            Self::Transition { mut from, to } => {
                Self::step_into(&mut from, presenter, env, &mut effects);
                if from.is_dismissed() {
                    crate::phase_trace!("exclusive transition collapsed");
                    let mut next = PresentationPhase::Presenting(to);
                    Self::step_into(&mut next, presenter, env, &mut effects);
                    Self::Single(next)
                } else {
                    Self::Transition { from, to }
                }
            }
        };
        effects
    }

    fn kind_of(&self, identity: &S::Id) -> PhaseKind {
        if self.identity().as_ref() == Some(identity) {
            self.kind()
        } else {
            PhaseKind::Dismissed
        }
    }

    fn value_of_mut(&mut self, identity: &S::Id) -> Option<&mut S> {
        if self.identity().as_ref() == Some(identity) {
            self.value_mut()
        } else {
            None
        }
    }

    fn is_settled(&self) -> bool {
        ExclusivePhase::is_settled(self)
    }
}
