#![forbid(unsafe_code)]

//! Presentation lifecycle state machines for Presents.
//!
//! Child state that comes and goes over time is tracked as a *phase* rather
//! than a plain `Option`. The phase separates "the desired value changed"
//! ([`PresentationPhase::set_value`]) from "the lifecycle advanced"
//! ([`PhaseDriver::advance`]), which lets a host apply any number of desired
//! value updates per cycle while the begin/end side effects of a
//! [`Presenter`] fire exactly once per appearance and disappearance.
//!
//! Three containers share the same driver protocol:
//!
//! - [`PresentationPhase`]: a single optional child.
//! - [`ExclusivePhase`]: one child at a time, keyed by identity. Switching
//!   identity drains the old child completely before the new one begins.
//! - [`KeyedPhases`]: many children, each with an independent lifecycle.
//!
//! # Invariants
//!
//! 1. A begin effect for an appearance is requested before any end effect for
//!    the same appearance.
//! 2. Setting a new value never changes which phase variant holds.
//! 3. An [`ExclusivePhase`] never holds two distinct identities in
//!    [`PhaseKind::Presented`].
//! 4. [`KeyedPhases::garbage_collect`] only removes [`PhaseKind::Dismissed`]
//!    entries.
//!
//! # Example
//!
//! ```
//! use presents_core::{PhaseDriver, PhaseKind, PresentationPhase, Presenter, PresenterEffect, Transition};
//!
//! let presenter: Presenter<&str, (), &str> = Presenter::new(|_, transition, _| match transition {
//!     Transition::Begin => PresenterEffect::Action("start"),
//!     Transition::End => PresenterEffect::Action("stop"),
//! });
//!
//! let mut phase = PresentationPhase::default();
//! phase.set_value(Some("timer"));
//! assert_eq!(phase.kind(), PhaseKind::Presenting);
//!
//! let effects = phase.advance(&presenter, &());
//! assert_eq!(phase.kind(), PhaseKind::Presented);
//! assert_eq!(effects[0].effect, "start");
//! ```

/// Trace-level event, compiled out without the `tracing` feature.
macro_rules! phase_trace {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        {
            tracing::trace!($($arg)*);
        }
    };
}

/// Debug-level event, compiled out without the `tracing` feature.
macro_rules! phase_debug {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        {
            tracing::debug!($($arg)*);
        }
    };
}

pub(crate) use phase_debug;
pub(crate) use phase_trace;

pub mod driver;
pub mod exclusive;
pub mod keyed;
pub mod phase;
pub mod presenter;
pub mod request;

pub use driver::{PhaseDriver, PhaseEffect, settle};
pub use exclusive::ExclusivePhase;
pub use keyed::{KeyedPhases, KeyedValues};
pub use phase::{PhaseKind, PresentationPhase};
pub use presenter::{Presenter, PresenterBuilder, PresenterEffect, PresenterError, Transition};
pub use request::PresentsRequest;

use core::fmt::Debug;
use core::hash::Hash;

/// A value with a stable identity that survives updates.
///
/// Exclusive presentation compares identities to decide whether an incoming
/// value refreshes the current child or replaces it.
pub trait Identified {
    /// The identity type.
    type Id: Eq + Hash + Clone + Debug;

    /// Stable identity of this value.
    fn id(&self) -> Self::Id;
}

/// Implement [`Identified`] for an enum using its variant discriminant.
///
/// Each variant is one identity, regardless of the data it carries.
///
/// ```
/// use presents_core::{Identified, case_identified};
///
/// enum TimerOption {
///     Fast(u32),
///     Slow(u32),
/// }
/// case_identified!(TimerOption);
///
/// assert_eq!(TimerOption::Fast(1).id(), TimerOption::Fast(9).id());
/// assert_ne!(TimerOption::Fast(1).id(), TimerOption::Slow(1).id());
/// ```
#[macro_export]
macro_rules! case_identified {
    ($ty:ty) => {
        impl $crate::Identified for $ty {
            type Id = ::core::mem::Discriminant<$ty>;

            fn id(&self) -> Self::Id {
                ::core::mem::discriminant(self)
            }
        }
    };
}
