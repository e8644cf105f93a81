#![forbid(unsafe_code)]

//! Store runtime for Presents.
//!
//! The runtime owns a [`Model`], runs its `update` and `present` for every
//! action, and executes the [`Cmd`]s they return. Presentation effects are
//! scoped by identity: work started when a child is presented is cancelled
//! when that child, and only that child, is dismissed.
//!
//! # Example
//!
//! ```
//! use presents_runtime::{Cmd, Model, Store};
//!
//! struct Counter(i32);
//!
//! impl Model for Counter {
//!     type Action = i32;
//!     type Environment = ();
//!
//!     fn update(&mut self, n: i32, _env: &()) -> Cmd<i32> {
//!         self.0 += n;
//!         Cmd::none()
//!     }
//! }
//!
//! let mut store = Store::new(Counter(0), ());
//! store.send(2).unwrap();
//! assert_eq!(store.model().0, 2);
//! ```

pub mod cancel;
pub mod cmd;
pub mod config;
pub mod error;
#[cfg(feature = "tracing-json")]
pub mod logging;
pub mod present;
pub mod scheduler;
pub mod store;

pub use cancel::{CancelId, CancelRegistry, CancelToken};
pub use cmd::{Cmd, Job, TickFn};
pub use config::{DroppedActionPolicy, RuntimeConfig};
pub use error::{ConfigError, Result, RuntimeError};
pub use present::{
    ActionGuard, Driver, LongRunningAction, LongRunningEvent, LongRunningPresenter, Presents,
    drive, long_running,
};
pub use presents_core::PresentsRequest;
pub use scheduler::{Scheduler, ThreadScheduler};
pub use store::{Model, Store};
