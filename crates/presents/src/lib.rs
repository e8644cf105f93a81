#![forbid(unsafe_code)]

//! Presents: lifecycle-managed child state for Elm-style stores.
//!
//! A parent model keeps a child in a phase container instead of an
//! `Option`. Setting the desired value and advancing the lifecycle are
//! separate steps, so a presenter's begin effect runs exactly once when the
//! child appears and its end effect runs exactly once when the child leaves.
//!
//! - [`core`]: the phase state machines and the presenter protocol.
//! - [`runtime`]: a store that advances phases every cycle, runs the effects
//!   and cancels work started for a child when it is dismissed.
//!
//! Most programs only need the [`prelude`].
//!
//! ```
//! use presents::prelude::*;
//!
//! #[derive(Default)]
//! struct App {
//!     sheet: Presents<PresentationPhase<u32>>,
//!     log: Vec<&'static str>,
//! }
//!
//! #[derive(Debug)]
//! enum Action {
//!     Show(u32),
//!     Hide,
//!     Sheet(SheetAction),
//! }
//!
//! #[derive(Debug)]
//! enum SheetAction {
//!     Appeared,
//!     Left,
//! }
//!
//! impl LongRunningAction for SheetAction {
//!     fn long_running(event: LongRunningEvent) -> Self {
//!         match event {
//!             LongRunningEvent::Start => Self::Appeared,
//!             LongRunningEvent::Stop => Self::Left,
//!         }
//!     }
//! }
//!
//! impl Model for App {
//!     type Action = Action;
//!     type Environment = ();
//!
//!     fn update(&mut self, action: Action, _env: &()) -> Cmd<Action> {
//!         match action {
//!             Action::Show(n) => self.sheet.set(Some(n)),
//!             Action::Hide => self.sheet.set(None),
//!             Action::Sheet(SheetAction::Appeared) => self.log.push("appeared"),
//!             Action::Sheet(SheetAction::Left) => self.log.push("left"),
//!         }
//!         Cmd::none()
//!     }
//!
//!     fn present(&mut self, _env: &()) -> Cmd<Action> {
//!         drive(self.sheet.phases_mut(), &Presenter::long_running(), &(), "sheet", |(), a| {
//!             Action::Sheet(a)
//!         })
//!     }
//! }
//!
//! let mut store = Store::new(App::default(), ());
//! store.send(Action::Show(1)).unwrap();
//! store.send(Action::Show(2)).unwrap();
//! store.send(Action::Hide).unwrap();
//! assert_eq!(store.model().log, ["appeared", "left"]);
//! assert_eq!(store.model().sheet.get(), None);
//! ```

pub use presents_core as core;
#[cfg(feature = "runtime")]
pub use presents_runtime as runtime;

pub use presents_core::{
    ExclusivePhase, Identified, KeyedPhases, KeyedValues, PhaseDriver, PhaseEffect, PhaseKind,
    PresentationPhase, Presenter, PresenterEffect, PresentsRequest, Transition, case_identified,
};

#[cfg(feature = "runtime")]
pub use presents_runtime::{
    ActionGuard, CancelId, Cmd, Driver, DroppedActionPolicy, LongRunningAction, LongRunningEvent,
    LongRunningPresenter, Model, Presents, RuntimeConfig, RuntimeError, Scheduler, Store,
    ThreadScheduler, drive, long_running,
};

/// Everything needed to write a model with presented children.
pub mod prelude {
    pub use presents_core::{
        ExclusivePhase, Identified, KeyedPhases, PhaseKind, PresentationPhase, Presenter,
        PresenterEffect, Transition, case_identified,
    };

    #[cfg(feature = "runtime")]
    pub use presents_runtime::{
        ActionGuard, Cmd, Driver, LongRunningAction, LongRunningEvent, LongRunningPresenter, Model,
        Presents, RuntimeConfig, Store, drive,
    };
}
