#![forbid(unsafe_code)]

//! Requests that change presented state from outside an update function.
//!
//! A UI layer that only sends actions can wrap a [`PresentsRequest`] in its
//! action type; the update function then applies it to the phase it names.

use crate::driver::PhaseDriver;

/// Present a value, or present nothing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PresentsRequest<S> {
    /// Present `S`, starting a new appearance or refreshing the current one.
    Set(S),
    /// Dismiss whatever is presented.
    Dismiss,
}

impl<S> PresentsRequest<S> {
    /// The desired value this request stands for.
    #[must_use]
    pub fn into_desired(self) -> Option<S> {
        match self {
            Self::Set(value) => Some(value),
            Self::Dismiss => None,
        }
    }

    #[must_use]
    pub const fn is_dismiss(&self) -> bool {
        matches!(self, Self::Dismiss)
    }

    /// Apply the request to a single or exclusive phase.
    pub fn apply_to<P>(self, phases: &mut P)
    where
        P: PhaseDriver<S, Desired = Option<S>>,
    {
        phases.apply(self.into_desired());
    }
}

impl<S> From<Option<S>> for PresentsRequest<S> {
    fn from(value: Option<S>) -> Self {
        value.map_or(Self::Dismiss, Self::Set)
    }
}
