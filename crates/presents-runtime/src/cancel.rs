#![forbid(unsafe_code)]

//! Identity-scoped cancellation.
//!
//! Every asynchronous job the store starts carries a [`CancelToken`]. The
//! token is registered in the [`CancelRegistry`] under each [`CancelId`] of
//! the `Cmd::Cancellable` scopes enclosing the job, so cancelling one id
//! stops exactly the work started under it.
//!
//! # Invariants
//!
//! - [`CancelId::scoped`] is deterministic: the same scope and identity give
//!   the same id across runs of the same build.
//! - Cancelling an id never flips a token registered only under other ids.
//! - A cancelled token stays cancelled.

use core::fmt;
use core::hash::{BuildHasher, Hash, Hasher};
use std::sync::{Arc, Weak};
use std::sync::atomic::{AtomicBool, Ordering};

use ahash::{AHashMap, RandomState};

/// Fixed hasher seeds for [`CancelId::scoped`].
const ID_SEEDS: [u64; 4] = [
    0x243f_6a88_85a3_08d3,
    0x1319_8a2e_0370_7344,
    0xa409_3822_299f_31d0,
    0x082e_fa98_ec4e_6c89,
];

/// Key used to cancel in-flight work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CancelId(u64);

impl CancelId {
    /// Wrap a raw id.
    #[inline]
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Id for `identity` within `scope`.
    ///
    /// The scope keeps identities of different containers apart: key `1` of
    /// a `"timers"` collection and key `1` of a `"downloads"` collection get
    /// different ids.
    #[must_use]
    pub fn scoped<I: Hash + ?Sized>(scope: &str, identity: &I) -> Self {
        let state = RandomState::with_seeds(ID_SEEDS[0], ID_SEEDS[1], ID_SEEDS[2], ID_SEEDS[3]);
        let mut hasher = state.build_hasher();
        scope.hash(&mut hasher);
        identity.hash(&mut hasher);
        Self(hasher.finish())
    }

    /// Id for a named singleton effect.
    #[must_use]
    pub fn named(name: &str) -> Self {
        Self::scoped(name, &())
    }

    /// Get the raw id value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CancelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cancel#{:016x}", self.0)
    }
}

/// Shared flag checked by running work.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the token. Returns `false` if it was already cancelled.
    pub fn cancel(&self) -> bool {
        !self.flag.swap(true, Ordering::AcqRel)
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    fn downgrade(&self) -> Weak<AtomicBool> {
        Arc::downgrade(&self.flag)
    }
}

/// Map from [`CancelId`] to the tokens of work started under it.
///
/// The registry holds tokens weakly: once the work that owns a token drops
/// it, the entry is dead and [`prune`](Self::prune) forgets it.
#[derive(Debug, Default)]
pub struct CancelRegistry {
    tokens: AHashMap<CancelId, Vec<Weak<AtomicBool>>>,
}

impl CancelRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a token registered under every id in `scope`.
    ///
    /// An empty scope yields a token nothing can cancel.
    pub fn register(&mut self, scope: &[CancelId]) -> CancelToken {
        let token = CancelToken::new();
        for id in scope {
            self.tokens.entry(*id).or_default().push(token.downgrade());
        }
        token
    }

    /// Cancel all work registered under `id`. Returns the number of tokens
    /// that flipped.
    pub fn cancel(&mut self, id: CancelId) -> usize {
        self.tokens
            .remove(&id)
            .map_or(0, |tokens| {
                tokens
                    .iter()
                    .filter_map(Weak::upgrade)
                    .filter(|flag| !flag.swap(true, Ordering::AcqRel))
                    .count()
            })
    }

    /// Forget tokens whose work has finished or been cancelled.
    pub fn prune(&mut self) {
        self.tokens.retain(|_, tokens| {
            tokens.retain(is_live);
            !tokens.is_empty()
        });
    }

    /// Whether live work is registered under `id`.
    #[must_use]
    pub fn contains(&self, id: CancelId) -> bool {
        self.tokens
            .get(&id)
            .is_some_and(|tokens| tokens.iter().any(is_live))
    }

    /// Number of ids with registered work.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

fn is_live(token: &Weak<AtomicBool>) -> bool {
    token
        .upgrade()
        .is_some_and(|flag| !flag.load(Ordering::Acquire))
}
