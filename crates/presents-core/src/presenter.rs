#![forbid(unsafe_code)]

//! Presentation side effects.
//!
//! A [`Presenter`] is called by the driver when a value begins or ends its
//! presentation. It returns a [`PresenterEffect`] describing the work to run
//! and whether completion of that work gates the lifecycle.
//!
//! A presenter never mutates phase state. It is a pure function of the value,
//! the [`Transition`] and the host-supplied environment, and it may be called
//! for distinct identities in any order.
//!
//! # Failure Modes
//!
//! | Situation                                  | Result                          |
//! |--------------------------------------------|---------------------------------|
//! | Closure form                               | Total by construction           |
//! | Builder without `on_begin` or `on_end`     | [`PresenterError::MissingHook`] |

use core::fmt;
use std::sync::Arc;

/// The two moments a presenter is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    /// The value is becoming active. Start any long-running work.
    Begin,
    /// The value is becoming inactive. Stop everything started on begin.
    End,
}

impl Transition {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Begin => "begin",
            Self::End => "end",
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a presenter call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenterEffect<Fx> {
    /// The effect must complete before teardown finishes. An end effect of
    /// this kind holds the phase at `Cancelling` until the next step.
    Action(Fx),
    /// The effect is launched but does not gate the lifecycle. An end effect
    /// of this kind moves the phase straight to `Dismissed`.
    FireAndForget(Fx),
}

impl<Fx> PresenterEffect<Fx> {
    /// Non-gating outcome carrying the default (empty) effect.
    #[must_use]
    pub fn immediate() -> Self
    where
        Fx: Default,
    {
        Self::FireAndForget(Fx::default())
    }

    /// Whether completion gates the lifecycle.
    #[must_use]
    pub const fn is_gating(&self) -> bool {
        matches!(self, Self::Action(_))
    }

    #[must_use]
    pub const fn effect(&self) -> &Fx {
        match self {
            Self::Action(fx) | Self::FireAndForget(fx) => fx,
        }
    }

    #[must_use]
    pub fn into_effect(self) -> Fx {
        match self {
            Self::Action(fx) | Self::FireAndForget(fx) => fx,
        }
    }

    /// Transform the effect, keeping the gating kind.
    pub fn map<G>(self, f: impl FnOnce(Fx) -> G) -> PresenterEffect<G> {
        match self {
            Self::Action(fx) => PresenterEffect::Action(f(fx)),
            Self::FireAndForget(fx) => PresenterEffect::FireAndForget(f(fx)),
        }
    }
}

type PresenterFn<S, Env, Fx> = dyn Fn(&S, Transition, &Env) -> PresenterEffect<Fx> + Send + Sync;

/// Side-effect contract invoked on begin and end transitions.
///
/// Cloning is cheap: the closure is shared.
pub struct Presenter<S, Env, Fx> {
    inner: Arc<PresenterFn<S, Env, Fx>>,
}

impl<S, Env, Fx> Clone for Presenter<S, Env, Fx> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, Env, Fx> fmt::Debug for Presenter<S, Env, Fx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Presenter").finish_non_exhaustive()
    }
}

impl<S, Env, Fx> Presenter<S, Env, Fx> {
    /// Create a presenter from a closure. The closure must handle both
    /// transitions, which a `match` on [`Transition`] enforces.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&S, Transition, &Env) -> PresenterEffect<Fx> + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// Create a presenter from separate begin and end hooks.
    pub fn begin_end<B, E>(begin: B, end: E) -> Self
    where
        B: Fn(&S, &Env) -> PresenterEffect<Fx> + Send + Sync + 'static,
        E: Fn(&S, &Env) -> PresenterEffect<Fx> + Send + Sync + 'static,
    {
        Self::new(move |s, transition, env| match transition {
            Transition::Begin => begin(s, env),
            Transition::End => end(s, env),
        })
    }

    /// Presenter that runs nothing and never gates the lifecycle.
    ///
    /// With this presenter a dismissal completes in a single step.
    #[must_use]
    pub fn immediate() -> Self
    where
        Fx: Default,
    {
        Self::new(|_, _, _| PresenterEffect::immediate())
    }

    /// Start a builder that checks both hooks are present.
    #[must_use]
    pub fn builder() -> PresenterBuilder<S, Env, Fx> {
        PresenterBuilder {
            begin: None,
            end: None,
        }
    }

    /// Invoke the presenter.
    pub fn call(&self, value: &S, transition: Transition, env: &Env) -> PresenterEffect<Fx> {
        (self.inner)(value, transition, env)
    }

    /// Presenter for an outer value that projects into this presenter's value.
    pub fn pullback<T, Env2>(
        &self,
        value: impl Fn(&T) -> &S + Send + Sync + 'static,
        env: impl Fn(&Env2) -> &Env + Send + Sync + 'static,
    ) -> Presenter<T, Env2, Fx>
    where
        S: 'static,
        Env: 'static,
        Fx: 'static,
    {
        let inner = Arc::clone(&self.inner);
        Presenter::new(move |t, transition, e| inner(value(t), transition, env(e)))
    }

    /// Presenter whose effects are transformed by `f`.
    pub fn map_effect<G>(
        &self,
        f: impl Fn(Fx) -> G + Send + Sync + 'static,
    ) -> Presenter<S, Env, G>
    where
        S: 'static,
        Env: 'static,
        Fx: 'static,
    {
        let inner = Arc::clone(&self.inner);
        Presenter::new(move |s, transition, env| inner(s, transition, env).map(&f))
    }
}

/// Error raised when a presenter is not total over [`Transition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenterError {
    /// No hook was supplied for this transition.
    MissingHook(Transition),
}

impl fmt::Display for PresenterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingHook(t) => write!(f, "presenter has no hook for the {t} transition"),
        }
    }
}

impl std::error::Error for PresenterError {}

type HookFn<S, Env, Fx> = Box<dyn Fn(&S, &Env) -> PresenterEffect<Fx> + Send + Sync>;

/// Builder for a [`Presenter`] assembled from separate hooks.
pub struct PresenterBuilder<S, Env, Fx> {
    begin: Option<HookFn<S, Env, Fx>>,
    end: Option<HookFn<S, Env, Fx>>,
}

impl<S, Env, Fx> fmt::Debug for PresenterBuilder<S, Env, Fx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresenterBuilder")
            .field("begin", &self.begin.is_some())
            .field("end", &self.end.is_some())
            .finish()
    }
}

impl<S, Env, Fx> PresenterBuilder<S, Env, Fx> {
    #[must_use]
    pub fn on_begin(
        mut self,
        hook: impl Fn(&S, &Env) -> PresenterEffect<Fx> + Send + Sync + 'static,
    ) -> Self {
        self.begin = Some(Box::new(hook));
        self
    }

    #[must_use]
    pub fn on_end(
        mut self,
        hook: impl Fn(&S, &Env) -> PresenterEffect<Fx> + Send + Sync + 'static,
    ) -> Self {
        self.end = Some(Box::new(hook));
        self
    }

    /// Finish the presenter.
    ///
    /// # Errors
    ///
    /// Returns [`PresenterError::MissingHook`] naming the first transition
    /// without a hook.
    pub fn build(self) -> Result<Presenter<S, Env, Fx>, PresenterError>
    where
        S: 'static,
        Env: 'static,
        Fx: 'static,
    {
        let begin = self
            .begin
            .ok_or(PresenterError::MissingHook(Transition::Begin))?;
        let end = self.end.ok_or(PresenterError::MissingHook(Transition::End))?;
        Ok(Presenter::begin_end(begin, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closure_presenter_receives_inputs() {
        let presenter: Presenter<u32, u32, u32> = Presenter::new(|s, t, env| match t {
            Transition::Begin => PresenterEffect::Action(s + env),
            Transition::End => PresenterEffect::FireAndForget(s * env),
        });
        assert_eq!(presenter.call(&3, Transition::Begin, &4), PresenterEffect::Action(7));
        assert_eq!(
            presenter.call(&3, Transition::End, &4),
            PresenterEffect::FireAndForget(12)
        );
    }

    #[test]
    fn immediate_presenter_never_gates() {
        let presenter: Presenter<u8, (), Vec<u8>> = Presenter::immediate();
        for t in [Transition::Begin, Transition::End] {
            let outcome = presenter.call(&1, t, &());
            assert!(!outcome.is_gating());
            assert!(outcome.effect().is_empty());
        }
    }

    #[test]
    fn builder_requires_both_hooks() {
        let missing_end = Presenter::<u8, (), u8>::builder()
            .on_begin(|_, _| PresenterEffect::Action(1))
            .build();
        assert_eq!(
            missing_end.err(),
            Some(PresenterError::MissingHook(Transition::End))
        );

        let missing_begin = Presenter::<u8, (), u8>::builder()
            .on_end(|_, _| PresenterEffect::Action(1))
            .build();
        assert_eq!(
            missing_begin.err(),
            Some(PresenterError::MissingHook(Transition::Begin))
        );
    }

    #[test]
    fn builder_dispatches_hooks() {
        let presenter = Presenter::<u8, (), &str>::builder()
            .on_begin(|_, _| PresenterEffect::Action("begin"))
            .on_end(|_, _| PresenterEffect::FireAndForget("end"))
            .build()
            .expect("both hooks supplied");
        assert_eq!(*presenter.call(&0, Transition::Begin, &()).effect(), "begin");
        assert_eq!(*presenter.call(&0, Transition::End, &()).effect(), "end");
    }

    #[test]
    fn missing_hook_display() {
        let err = PresenterError::MissingHook(Transition::Begin);
        assert_eq!(err.to_string(), "presenter has no hook for the begin transition");
    }

    #[test]
    fn map_keeps_gating_kind() {
        let gated = PresenterEffect::Action(2).map(|n| n * 10);
        assert_eq!(gated, PresenterEffect::Action(20));
        let free = PresenterEffect::FireAndForget(2).map(|n| n + 1);
        assert_eq!(free, PresenterEffect::FireAndForget(3));
    }

    #[test]
    fn pullback_projects_value_and_env() {
        struct Outer {
            inner: u32,
        }
        let presenter: Presenter<u32, u32, u32> =
            Presenter::new(|s, _, env| PresenterEffect::Action(s + env));
        let outer: Presenter<Outer, (u32, &'static str), u32> =
            presenter.pullback(|o: &Outer| &o.inner, |e: &(u32, &'static str)| &e.0);
        assert_eq!(
            outer.call(&Outer { inner: 5 }, Transition::Begin, &(1, "x")),
            PresenterEffect::Action(6)
        );
    }

    #[test]
    fn map_effect_wraps_output() {
        let presenter: Presenter<u8, (), u8> =
            Presenter::new(|s, _, _| PresenterEffect::FireAndForget(*s));
        let mapped = presenter.map_effect(|n| vec![n]);
        assert_eq!(
            mapped.call(&9, Transition::End, &()),
            PresenterEffect::FireAndForget(vec![9])
        );
    }
}
