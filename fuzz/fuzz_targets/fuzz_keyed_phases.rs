#![no_main]

//! Random keyed-collection cycles. Updates accumulate until an `Advance` op,
//! which advances and collects the collection once.
//!
//! Checks: begin and end alternate per key, a key has an open appearance
//! exactly while it is presented, and collection only removes dismissed
//! entries.

use std::collections::HashSet;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use presents_core::{KeyedPhases, PhaseDriver, PhaseKind, Presenter, PresenterEffect, Transition};

#[derive(Debug, Arbitrary)]
enum Op {
    Insert { key: u8, value: u8 },
    Dismiss { key: u8 },
    Reconcile { entries: Vec<(u8, u8)> },
    Advance,
}

#[derive(Debug, Arbitrary)]
struct Input {
    gated: bool,
    ops: Vec<Op>,
}

fuzz_target!(|input: Input| {
    let gated = input.gated;
    let presenter: Presenter<u8, (), ()> = Presenter::new(move |_, _, _| {
        if gated {
            PresenterEffect::Action(())
        } else {
            PresenterEffect::FireAndForget(())
        }
    });

    let mut phases: KeyedPhases<u8, u8> = KeyedPhases::new();
    let mut open: HashSet<u8> = HashSet::new();

    for op in input.ops.into_iter().take(256) {
        let advance = matches!(op, Op::Advance);
        match op {
            Op::Insert { key, value } => phases.insert(key % 8, value),
            Op::Dismiss { key } => phases.dismiss(&(key % 8)),
            Op::Reconcile { entries } => {
                phases.reconcile(entries.into_iter().take(16).map(|(k, v)| (k % 8, v)));
            }
            Op::Advance => {}
        }
        if !advance {
            continue;
        }
        for effect in phases.advance(&presenter, &()) {
            match effect.transition {
                Transition::Begin => assert!(open.insert(effect.identity), "double begin"),
                Transition::End => assert!(open.remove(&effect.identity), "end without begin"),
            }
        }

        let live: Vec<u8> = phases
            .iter()
            .filter(|(_, p)| p.kind() != PhaseKind::Dismissed)
            .map(|(k, _)| *k)
            .collect();
        phases.garbage_collect();
        let kept: Vec<u8> = phases.iter().map(|(k, _)| *k).collect();
        assert_eq!(live, kept);

        for key in 0..8u8 {
            assert_eq!(open.contains(&key), phases.is_active(&key), "key {key}");
        }
    }
});
