#![forbid(unsafe_code)]

//! Proptest strategies for driving phase containers with random input.
//!
//! A cycle is a batch of steps applied between two advances. Batches may be
//! empty or hold several updates, as a reducer can set the desired value
//! more than once before the store advances.

use presents_core::{ExclusivePhase, Identified, KeyedPhases, Presenter, PresenterEffect};
use proptest::prelude::*;

/// A small identified value. `rev` changes on refresh, `id` never does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tagged {
    pub id: u8,
    pub rev: u8,
}

impl Identified for Tagged {
    type Id = u8;

    fn id(&self) -> u8 {
        self.id
    }
}

/// One update of an exclusive phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExclusiveStep {
    Set(Option<Tagged>),
    /// Advance without applying anything.
    Idle,
}

/// One update of a keyed collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyedStep {
    Insert(u8, u8),
    Dismiss(u8),
    Reconcile(Vec<(u8, u8)>),
    Idle,
}

impl ExclusiveStep {
    pub fn apply(self, phase: &mut ExclusivePhase<Tagged>) {
        if let Self::Set(value) = self {
            phase.set_value(value);
        }
    }
}

impl KeyedStep {
    pub fn apply(self, phases: &mut KeyedPhases<u8, u8>) {
        match self {
            Self::Insert(key, value) => phases.insert(key, value),
            Self::Dismiss(key) => phases.dismiss(&key),
            Self::Reconcile(values) => phases.reconcile(values),
            Self::Idle => {}
        }
    }
}

/// A [`Tagged`] value with one of `ids` identities.
pub fn tagged(ids: u8) -> impl Strategy<Value = Tagged> {
    (0..ids.max(1), any::<u8>()).prop_map(|(id, rev)| Tagged { id, rev })
}

fn exclusive_step() -> impl Strategy<Value = ExclusiveStep> {
    prop_oneof![
        3 => tagged(3).prop_map(|t| ExclusiveStep::Set(Some(t))),
        1 => Just(ExclusiveStep::Set(None)),
        2 => Just(ExclusiveStep::Idle),
    ]
}

fn keyed_step() -> impl Strategy<Value = KeyedStep> {
    prop_oneof![
        2 => (0u8..4, any::<u8>()).prop_map(|(k, v)| KeyedStep::Insert(k, v)),
        1 => (0u8..4).prop_map(KeyedStep::Dismiss),
        1 => prop::collection::vec((0u8..4, any::<u8>()), 0..4).prop_map(KeyedStep::Reconcile),
        2 => Just(KeyedStep::Idle),
    ]
}

/// Up to `max_len` exclusive cycles over three identities, each holding
/// zero to three steps.
pub fn exclusive_cycles(max_len: usize) -> impl Strategy<Value = Vec<Vec<ExclusiveStep>>> {
    prop::collection::vec(prop::collection::vec(exclusive_step(), 0..=3), 0..=max_len)
}

/// Up to `max_len` keyed cycles over four keys, each holding zero to three
/// steps.
pub fn keyed_cycles(max_len: usize) -> impl Strategy<Value = Vec<Vec<KeyedStep>>> {
    prop::collection::vec(prop::collection::vec(keyed_step(), 0..=3), 0..=max_len)
}

/// Presenter with no effect payload, gating or not.
#[must_use]
pub fn presenter<S: 'static>(gated: bool) -> Presenter<S, (), ()> {
    if gated {
        Presenter::new(|_, _, _| PresenterEffect::Action(()))
    } else {
        Presenter::immediate()
    }
}
