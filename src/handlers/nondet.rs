//! Nondeterministic choice effect.
//!
//! `choose()` suspends with a handler that invokes the continuation once
//! per branch and folds the branch results together. How they fold is
//! supplied by the concrete instantiation through the [`Alternative`]
//! trait: list concatenation enumerates every outcome, `Option` keeps the
//! first success, and so on.
//!
//! The branch for `false` is always enumerated before the branch for
//! `true`, so n independent `choose()` calls under the `Vec` instance
//! enumerate all 2^n outcomes in a fixed order.

use std::convert::Infallible;
use std::fmt;

use crate::multishot::{reset_multi, MultiScope};
use crate::scope::Continuation;

/// A result type that nondeterministic branches can fold into.
///
/// `combine` takes its right-hand side lazily so that first-success
/// instances never run the second branch once the first one succeeded.
pub trait Alternative: Send + Sized + 'static {
    /// The identity of `combine`: the result of a choice with no branches.
    fn empty() -> Self;

    /// Fold another branch's result into this one.
    fn combine(self, rhs: impl FnOnce() -> Self) -> Self;
}

impl<T: Send + 'static> Alternative for Vec<T> {
    fn empty() -> Self {
        Vec::new()
    }

    fn combine(mut self, rhs: impl FnOnce() -> Self) -> Self {
        self.extend(rhs());
        self
    }
}

impl<T: Send + 'static> Alternative for Option<T> {
    fn empty() -> Self {
        None
    }

    fn combine(self, rhs: impl FnOnce() -> Self) -> Self {
        if self.is_some() {
            self
        } else {
            rhs()
        }
    }
}

impl<T: Send + 'static, E: Default + Send + 'static> Alternative for Result<T, E> {
    fn empty() -> Self {
        Err(E::default())
    }

    fn combine(self, rhs: impl FnOnce() -> Self) -> Self {
        if self.is_ok() {
            self
        } else {
            rhs()
        }
    }
}

/// The choice effect, bound to one multi-shot scope.
pub struct Choice<R> {
    scope: MultiScope<R>,
}

impl<R> Clone for Choice<R> {
    fn clone(&self) -> Self {
        Self {
            scope: self.scope.clone(),
        }
    }
}

impl<R> fmt::Debug for Choice<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Choice").field("scope", &self.scope).finish()
    }
}

impl<R: Alternative> Choice<R> {
    /// Fork the computation: the rest of the block runs once with `false`
    /// and, if the instantiation demands it, again with `true`; the two
    /// outcomes are folded with [`Alternative::combine`].
    pub fn choose(&self) -> bool {
        self.scope.control(|k: Continuation<bool, R>| {
            let left = k.resume(false);
            left.combine(|| k.resume(true))
        })
    }

    /// Prune this branch of the computation.
    ///
    /// The scope's result for the branch is [`Alternative::empty`]; the
    /// rest of the block is abandoned.
    pub fn fail(&self) -> ! {
        let never: Infallible = self.scope.control(|_k| R::empty());
        match never {}
    }

    /// Prune this branch unless `condition` holds.
    pub fn guard(&self, condition: bool) {
        if !condition {
            self.fail();
        }
    }
}

/// Run `block` in a scope with the choice effect, folding all enumerated
/// branches with the [`Alternative`] instance of `R`.
///
/// The block re-runs once per enumerated branch (see the multi-shot replay
/// contract), so it must be side-effect-free or tolerate duplicated
/// effects.
pub fn nondet<R, F>(block: F) -> R
where
    R: Alternative,
    F: Fn(&Choice<R>) -> R + Send + Sync + 'static,
{
    reset_multi(move |scope: &MultiScope<R>| {
        let choice = Choice {
            scope: scope.clone(),
        };
        block(&choice)
    })
}

// ============================================================================
// Tests
// ============================================================================
