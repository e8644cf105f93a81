#![no_main]

//! Random exclusive-phase cycles. Updates accumulate until an `Advance` op,
//! so several values may land between two advances.
//!
//! Checks: at most one identity has an open appearance, end effects only
//! close open appearances, and any state settles within three advances.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use presents_core::{ExclusivePhase, Identified, PhaseDriver, Presenter, PresenterEffect, Transition};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Child {
    id: u8,
    rev: u8,
}

impl Identified for Child {
    type Id = u8;

    fn id(&self) -> u8 {
        self.id
    }
}

#[derive(Debug, Arbitrary)]
enum Op {
    Set { id: u8, rev: u8 },
    Clear,
    Advance,
}

#[derive(Debug, Arbitrary)]
struct Input {
    gated: bool,
    ops: Vec<Op>,
}

fuzz_target!(|input: Input| {
    let gated = input.gated;
    let presenter: Presenter<Child, (), ()> = Presenter::new(move |_, _, _| {
        if gated {
            PresenterEffect::Action(())
        } else {
            PresenterEffect::FireAndForget(())
        }
    });

    let mut phase = ExclusivePhase::default();
    let mut open: Option<u8> = None;

    for op in input.ops.into_iter().take(256) {
        let advance = matches!(op, Op::Advance);
        match op {
            Op::Set { id, rev } => phase.set_value(Some(Child { id: id % 4, rev })),
            Op::Clear => phase.set_value(None),
            Op::Advance => {}
        }
        if !advance {
            continue;
        }
        for effect in phase.advance(&presenter, &()) {
            match effect.transition {
                Transition::Begin => {
                    assert_eq!(open, None, "begin for {} while {:?} is open", effect.identity, open);
                    open = Some(effect.identity);
                }
                Transition::End => {
                    assert_eq!(open, Some(effect.identity), "end without begin");
                    open = None;
                }
            }
        }
    }

    let mut settle = phase.clone();
    for _ in 0..3 {
        settle.advance(&presenter, &());
    }
    assert!(settle.is_settled(), "unsettled after three advances: {settle:?}");
});
