#![forbid(unsafe_code)]

//! Bookkeeping for begin/end pairing across many advances.

use std::fmt;

use presents_core::{PhaseEffect, Transition};

/// A presenter effect that broke begin/end pairing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerViolation<I> {
    /// An end effect for an identity with no open appearance.
    EndWithoutBegin(I),
    /// A second begin effect before the first appearance ended.
    BeginWhileOpen(I),
}

impl<I: fmt::Debug> fmt::Display for LedgerViolation<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EndWithoutBegin(id) => write!(f, "end effect for {id:?} without a begin"),
            Self::BeginWhileOpen(id) => write!(f, "begin effect for {id:?} while already open"),
        }
    }
}

impl<I: fmt::Debug> std::error::Error for LedgerViolation<I> {}

/// Tracks which identities have an open appearance.
///
/// Identities are compared with `PartialEq`, so a unit identity works for a
/// single phase.
#[derive(Debug, Clone)]
pub struct EffectLedger<I> {
    open: Vec<I>,
    begins: usize,
    ends: usize,
}

impl<I> Default for EffectLedger<I> {
    fn default() -> Self {
        Self {
            open: Vec::new(),
            begins: 0,
            ends: 0,
        }
    }
}

impl<I: Clone + PartialEq> EffectLedger<I> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one advance worth of effects, in order.
    ///
    /// # Errors
    ///
    /// The first effect that breaks pairing. Effects before it are kept.
    pub fn record<Fx>(&mut self, effects: &[PhaseEffect<I, Fx>]) -> Result<(), LedgerViolation<I>> {
        for effect in effects {
            let position = self.open.iter().position(|id| *id == effect.identity);
            match (effect.transition, position) {
                (Transition::Begin, None) => {
                    self.open.push(effect.identity.clone());
                    self.begins += 1;
                }
                (Transition::Begin, Some(_)) => {
                    return Err(LedgerViolation::BeginWhileOpen(effect.identity.clone()));
                }
                (Transition::End, Some(index)) => {
                    self.open.swap_remove(index);
                    self.ends += 1;
                }
                (Transition::End, None) => {
                    return Err(LedgerViolation::EndWithoutBegin(effect.identity.clone()));
                }
            }
        }
        Ok(())
    }

    /// Identities begun and not yet ended.
    #[must_use]
    pub fn open(&self) -> &[I] {
        &self.open
    }

    #[must_use]
    pub fn is_open(&self, identity: &I) -> bool {
        self.open.contains(identity)
    }

    #[must_use]
    pub const fn begins(&self) -> usize {
        self.begins
    }

    #[must_use]
    pub const fn ends(&self) -> usize {
        self.ends
    }
}
