#![forbid(unsafe_code)]

//! Many children with independent lifecycles.
//!
//! [`KeyedPhases`] tracks one [`PresentationPhase`] per key. Each cycle the
//! host [`reconcile`](KeyedPhases::reconcile)s against the desired keyed
//! values, [`advance`](PhaseDriver::advance)s, and then
//! [`garbage_collect`](KeyedPhases::garbage_collect)s to drop keys whose
//! teardown finished.
//!
//! # Invariants
//!
//! - Iteration follows insertion order. New keys are appended in the order
//!   they appear in the desired values.
//! - `garbage_collect` removes only `Dismissed` entries.
//! - A key requested again while tearing down finishes its teardown and then
//!   begins a new appearance in the same step, so repeated
//!   reconcile-and-advance converges on the desired values.
//!
//! # Failure Modes
//!
//! - Calling `garbage_collect` between `reconcile` and `advance` is safe:
//!   reconcile never leaves a desired key `Dismissed`.

use core::fmt::Debug;
use core::hash::Hash;

use ahash::{AHashSet, RandomState};
use indexmap::IndexMap;

use crate::driver::{PhaseDriver, PhaseEffect};
use crate::phase::{PhaseKind, PresentationPhase};
use crate::presenter::Presenter;

/// Desired values for a keyed collection, in presentation order.
pub type KeyedValues<K, S> = IndexMap<K, S, RandomState>;

/// A key → phase collection with bulk reconciliation.
#[derive(Clone)]
pub struct KeyedPhases<K, S> {
    phases: IndexMap<K, PresentationPhase<S>, RandomState>,
    /// Keys of the last reconciled desired values.
    wanted: AHashSet<K>,
}

impl<K, S> Default for KeyedPhases<K, S> {
    fn default() -> Self {
        Self {
            phases: IndexMap::with_hasher(RandomState::new()),
            wanted: AHashSet::default(),
        }
    }
}

impl<K: Debug, S: Debug> Debug for KeyedPhases<K, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.phases.iter()).finish()
    }
}

/// Equality compares phases in order; reconciliation bookkeeping is ignored.
impl<K: Hash + Eq, S: PartialEq> PartialEq for KeyedPhases<K, S> {
    fn eq(&self, other: &Self) -> bool {
        self.phases.len() == other.phases.len()
            && self
                .phases
                .iter()
                .zip(other.phases.iter())
                .all(|(a, b)| a == b)
    }
}

impl<K: Hash + Eq, S: Eq> Eq for KeyedPhases<K, S> {}

impl<K, S> KeyedPhases<K, S> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.phases.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// Tracked keys and phases in insertion order, dismissed ones included.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &PresentationPhase<S>)> {
        self.phases.iter()
    }

    /// Keys and values of every phase that is not `Dismissed`.
    pub fn values(&self) -> impl Iterator<Item = (&K, &S)> {
        self.phases
            .iter()
            .filter_map(|(k, phase)| phase.value().map(|v| (k, v)))
    }

    /// Whether every phase is settled.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.phases.values().all(PresentationPhase::is_settled)
    }
}

impl<K: Hash + Eq + Clone, S> KeyedPhases<K, S> {
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&PresentationPhase<S>> {
        self.phases.get(key)
    }

    /// The carried value for `key`, in any non-dismissed phase.
    #[must_use]
    pub fn value(&self, key: &K) -> Option<&S> {
        self.phases.get(key).and_then(PresentationPhase::value)
    }

    /// Mutable access for routing a child update to `key`.
    pub fn value_mut(&mut self, key: &K) -> Option<&mut S> {
        self.phases.get_mut(key).and_then(PresentationPhase::value_mut)
    }

    /// Phase of `key`; unknown keys are `Dismissed`.
    #[must_use]
    pub fn kind(&self, key: &K) -> PhaseKind {
        self.phases
            .get(key)
            .map_or(PhaseKind::Dismissed, PresentationPhase::kind)
    }

    /// Whether `key` is `Presented`.
    #[must_use]
    pub fn is_active(&self, key: &K) -> bool {
        self.phases.get(key).is_some_and(PresentationPhase::is_active)
    }

    /// Snapshot of [`values`](Self::values).
    #[must_use]
    pub fn visible_values(&self) -> KeyedValues<K, S>
    where
        S: Clone,
    {
        self.values().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    /// Apply the desired keyed values.
    ///
    /// Unknown keys are tracked as new appearances; tracked keys missing
    /// from `desired` begin their teardown. Later duplicates of a key win.
    pub fn reconcile(&mut self, desired: impl IntoIterator<Item = (K, S)>) {
        let mut desired: KeyedValues<K, S> = desired.into_iter().collect();
        self.wanted.clear();
        for key in desired.keys() {
            if !self.phases.contains_key(key) {
                self.phases.insert(key.clone(), PresentationPhase::Dismissed);
            }
            self.wanted.insert(key.clone());
        }
        for (key, phase) in &mut self.phases {
            phase.set_value(desired.swap_remove(key));
        }
    }

    /// Request one key without touching the others.
    pub fn insert(&mut self, key: K, value: S) {
        self.wanted.insert(key.clone());
        self.phases.entry(key).or_default().set_value(Some(value));
    }

    /// Begin the teardown of one key without touching the others.
    pub fn dismiss(&mut self, key: &K) {
        self.wanted.remove(key);
        if let Some(phase) = self.phases.get_mut(key) {
            phase.set_value(None);
        }
    }

    /// Remove every `Dismissed` entry. Returns the number removed.
    pub fn garbage_collect(&mut self) -> usize {
        let before = self.phases.len();
        self.phases.retain(|_, phase| !phase.is_dismissed());
        let removed = before - self.phases.len();
        if removed > 0 {
            crate::phase_debug!(removed, remaining = self.phases.len(), "keyed phases collected");
        }
        removed
    }

    /// Adopt `other` wholesale, dropping its dismissed entries.
    ///
    /// Keys that are presenting or presented in `other` become the desired
    /// set; keys tearing down are left to finish.
    pub fn merge(&mut self, other: Self) {
        self.phases = other.phases;
        self.garbage_collect();
        self.wanted = self
            .phases
            .iter()
            .filter(|(_, phase)| !phase.kind().is_tearing_down())
            .map(|(k, _)| k.clone())
            .collect();
    }

    /// Collection holding exactly the given phases, in order.
    ///
    /// Treated like [`merge`](Self::merge) input: dismissed entries are
    /// dropped and keys not tearing down count as requested.
    pub fn from_phases(phases: impl IntoIterator<Item = (K, PresentationPhase<S>)>) -> Self {
        let mut out = Self::new();
        out.merge(Self {
            phases: phases.into_iter().collect(),
            wanted: AHashSet::default(),
        });
        out
    }
}

impl<K: Hash + Eq + Clone, S> FromIterator<(K, S)> for KeyedPhases<K, S> {
    /// Every value starts as a new appearance.
    fn from_iter<T: IntoIterator<Item = (K, S)>>(iter: T) -> Self {
        let mut phases = Self::new();
        phases.reconcile(iter);
        phases
    }
}

impl<K, S> PhaseDriver<S> for KeyedPhases<K, S>
where
    K: Hash + Eq + Clone + Debug,
{
    type Identity = K;
    type Desired = KeyedValues<K, S>;

    fn apply(&mut self, desired: KeyedValues<K, S>) {
        self.reconcile(desired);
    }

    fn advance<Env, Fx>(
        &mut self,
        presenter: &Presenter<S, Env, Fx>,
        env: &Env,
    ) -> Vec<PhaseEffect<K, Fx>> {
        let mut effects = Vec::new();
        for (key, phase) in &mut self.phases {
            let reappear = self.wanted.contains(key);
            for (transition, outcome) in phase.step_reappearing(presenter, env, reappear) {
                effects.push(PhaseEffect::new(key.clone(), transition, outcome));
            }
        }
        effects
    }

    fn kind_of(&self, identity: &K) -> PhaseKind {
        self.kind(identity)
    }

    fn value_of_mut(&mut self, identity: &K) -> Option<&mut S> {
        self.value_mut(identity)
    }

    fn is_settled(&self) -> bool {
        KeyedPhases::is_settled(self)
    }

    fn garbage_collect(&mut self) -> usize {
        KeyedPhases::garbage_collect(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presenter::{PresenterEffect, Transition};

    type Fired = (Transition, &'static str, u32);

    fn gated() -> Presenter<u32, (), Fired> {
        Presenter::new(|v, t, _| PresenterEffect::Action((t, "", *v)))
    }

    fn desired(entries: &[(&'static str, u32)]) -> KeyedValues<&'static str, u32> {
        entries.iter().copied().collect()
    }

    fn keyed_effects(effects: &[PhaseEffect<&'static str, Fired>]) -> Vec<(&'static str, Transition)> {
        effects.iter().map(|e| (e.identity, e.transition)).collect()
    }

    #[test]
    fn reconcile_presents_new_keys_in_order() {
        let mut phases = KeyedPhases::new();
        phases.reconcile(desired(&[("john", 0), ("mary", 0)]));
        let kinds: Vec<_> = phases.iter().map(|(k, p)| (*k, p.kind())).collect();
        assert_eq!(
            kinds,
            vec![("john", PhaseKind::Presenting), ("mary", PhaseKind::Presenting)]
        );
    }

    #[test]
    fn scenario_keyed_begins_are_distinct() {
        let mut phases = KeyedPhases::new();
        phases.reconcile(desired(&[("john", 0)]));
        phases.reconcile(desired(&[("john", 0), ("mary", 0)]));
        let effects = phases.advance(&gated(), &());
        assert_eq!(
            keyed_effects(&effects),
            vec![("john", Transition::Begin), ("mary", Transition::Begin)]
        );

        phases.reconcile(desired(&[("mary", 0)]));
        let effects = phases.advance(&gated(), &());
        assert_eq!(keyed_effects(&effects), vec![("john", Transition::End)]);
        assert!(phases.is_active(&"mary"));
        assert_eq!(phases.kind(&"john"), PhaseKind::Cancelling);
    }

    #[test]
    fn dismissed_keys_are_collected() {
        let mut phases: KeyedPhases<&str, u32> = [("john", 1), ("mary", 2)].into_iter().collect();
        phases.advance(&gated(), &());
        phases.reconcile(desired(&[("mary", 2)]));
        phases.advance(&gated(), &());
        assert_eq!(phases.garbage_collect(), 0);
        phases.advance(&gated(), &());
        assert_eq!(phases.garbage_collect(), 1);
        assert_eq!(phases.len(), 1);
        assert_eq!(phases.visible_values(), desired(&[("mary", 2)]));
    }

    #[test]
    fn garbage_collect_keeps_tearing_down_entries() {
        let mut phases: KeyedPhases<&str, u32> = [("a", 1), ("b", 2)].into_iter().collect();
        phases.advance(&gated(), &());
        phases.reconcile(desired(&[]));
        assert_eq!(phases.garbage_collect(), 0);
        assert_eq!(phases.kind(&"a"), PhaseKind::Dismissing);
        phases.advance(&gated(), &());
        assert_eq!(phases.garbage_collect(), 0);
        assert_eq!(phases.values().count(), 2);
    }

    #[test]
    fn visible_values_include_children_mid_dismissal() {
        let mut phases: KeyedPhases<&str, u32> = [("a", 1)].into_iter().collect();
        phases.advance(&gated(), &());
        phases.reconcile(desired(&[]));
        assert_eq!(phases.visible_values(), desired(&[("a", 1)]));
    }

    #[test]
    fn requested_again_while_tearing_down_reappears() {
        let mut phases: KeyedPhases<&str, u32> = [("a", 1)].into_iter().collect();
        phases.advance(&gated(), &());
        phases.reconcile(desired(&[]));
        phases.advance(&gated(), &());
        assert_eq!(phases.kind(&"a"), PhaseKind::Cancelling);

        phases.reconcile(desired(&[("a", 7)]));
        let effects = phases.advance(&gated(), &());
        assert_eq!(keyed_effects(&effects), vec![("a", Transition::Begin)]);
        assert_eq!(phases.get(&"a"), Some(&PresentationPhase::Presented(7)));
    }

    #[test]
    fn withdrawn_before_begin_is_collected_silently() {
        let mut phases: KeyedPhases<&str, u32> = KeyedPhases::new();
        phases.reconcile(desired(&[("a", 1), ("b", 2)]));
        phases.reconcile(desired(&[("b", 2)]));
        assert_eq!(phases.kind(&"a"), PhaseKind::Dismissed);

        let effects = phases.advance(&gated(), &());
        assert_eq!(keyed_effects(&effects), vec![("b", Transition::Begin)]);
        assert_eq!(phases.garbage_collect(), 1);
        assert_eq!(phases.visible_values(), desired(&[("b", 2)]));
    }

    #[test]
    fn reconcile_refreshes_values_in_place() {
        let mut phases: KeyedPhases<&str, u32> = [("a", 1)].into_iter().collect();
        phases.advance(&gated(), &());
        phases.reconcile(desired(&[("a", 5)]));
        assert_eq!(phases.get(&"a"), Some(&PresentationPhase::Presented(5)));
        assert!(phases.advance(&gated(), &()).is_empty());
    }

    #[test]
    fn insert_and_dismiss_touch_one_key() {
        let mut phases: KeyedPhases<&str, u32> = [("a", 1)].into_iter().collect();
        phases.advance(&gated(), &());
        phases.insert("b", 2);
        phases.dismiss(&"a");
        let effects = phases.advance(&gated(), &());
        assert_eq!(
            keyed_effects(&effects),
            vec![("a", Transition::End), ("b", Transition::Begin)]
        );
    }

    #[test]
    fn merge_drops_dismissed_entries() {
        let mut other: KeyedPhases<&str, u32> = KeyedPhases::new();
        other.phases.insert("gone", PresentationPhase::Dismissed);
        other.phases.insert("kept", PresentationPhase::Presented(3));
        other.phases.insert("leaving", PresentationPhase::Dismissing(4));

        let mut phases = KeyedPhases::new();
        phases.merge(other);
        let keys: Vec<_> = phases.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["kept", "leaving"]);

        phases.advance(&gated(), &());
        phases.advance(&gated(), &());
        phases.garbage_collect();
        assert_eq!(phases.visible_values(), desired(&[("kept", 3)]));
    }

    #[test]
    fn value_mut_routes_to_one_child() {
        let mut phases: KeyedPhases<&str, u32> = [("a", 1), ("b", 1)].into_iter().collect();
        if let Some(v) = phases.value_mut(&"b") {
            *v += 10;
        }
        assert_eq!(phases.value(&"a"), Some(&1));
        assert_eq!(phases.value(&"b"), Some(&11));
        assert_eq!(phases.value(&"missing"), None);
    }

    #[test]
    fn equality_ignores_bookkeeping() {
        let mut a: KeyedPhases<&str, u32> = KeyedPhases::new();
        a.phases.insert("x", PresentationPhase::Presented(1));
        let b: KeyedPhases<&str, u32> = [("x", 1)].into_iter().collect();
        assert_ne!(a, b);
        let mut b = b;
        b.advance(&gated(), &());
        assert_eq!(a, b);
    }

    #[test]
    fn from_phases_matches_driven_state() {
        let mut driven: KeyedPhases<&str, u32> = [("a", 1), ("b", 2)].into_iter().collect();
        driven.advance(&gated(), &());
        driven.dismiss(&"a");
        driven.advance(&gated(), &());

        let expected = KeyedPhases::from_phases([
            ("a", PresentationPhase::Cancelling(1)),
            ("b", PresentationPhase::Presented(2)),
            ("c", PresentationPhase::Dismissed),
        ]);
        assert_eq!(driven, expected);
        assert!(expected.is_active(&"b"));
    }
}
