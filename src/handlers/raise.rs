//! Short-circuiting error effect.
//!
//! `raise` hands the scope's handler a continuation it never invokes, so
//! the raised value becomes the scope's final result immediately and no
//! block code after the raise point runs. Normal completion is wrapped into
//! the success variant by the scope constructor.
//!
//! The short circuit is a value threaded through the handler-return path,
//! not an unwinding exception: `catch`-style recovery in a block can never
//! intercept it by accident.

use std::convert::Infallible;
use std::fmt;

use crate::scope::{reset, Scope};

/// The error effect, bound to one scope producing `Result<A, E>`.
pub struct Raise<A, E> {
    scope: Scope<Result<A, E>>,
}

impl<A, E> Clone for Raise<A, E> {
    fn clone(&self) -> Self {
        Self {
            scope: self.scope.clone(),
        }
    }
}

impl<A, E> fmt::Debug for Raise<A, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Raise").field("scope", &self.scope).finish()
    }
}

impl<A: Send + 'static, E: Send + 'static> Raise<A, E> {
    /// Short-circuit the enclosing [`either`] scope with `error`.
    ///
    /// Never returns; the rest of the block is abandoned.
    pub fn raise(&self, error: E) -> ! {
        let never: Infallible = self.scope.control(move |_k| Err(error));
        match never {}
    }

    /// Unwrap `Ok` or short-circuit with the carried error.
    pub fn bind<T>(&self, value: Result<T, E>) -> T {
        match value {
            Ok(t) => t,
            Err(e) => self.raise(e),
        }
    }

    /// Short-circuit with `error()` unless `condition` holds.
    pub fn ensure(&self, condition: bool, error: impl FnOnce() -> E) {
        if !condition {
            self.raise(error());
        }
    }
}

/// Run `block` in a scope with the error effect.
///
/// The block's return value surfaces as `Ok`; a [`Raise::raise`] call
/// surfaces as `Err` without executing any further block code.
pub fn either<A, E, F>(block: F) -> Result<A, E>
where
    A: Send + 'static,
    E: Send + 'static,
    F: FnOnce(&Raise<A, E>) -> A + Send + 'static,
{
    reset(move |scope: &Scope<Result<A, E>>| {
        let raise = Raise {
            scope: scope.clone(),
        };
        Ok(block(&raise))
    })
}

/// Run `block` with the error effect and fold a raised error into a value.
pub fn recover<A, E, F, H>(block: F, on_error: H) -> A
where
    A: Send + 'static,
    E: Send + 'static,
    F: FnOnce(&Raise<A, E>) -> A + Send + 'static,
    H: FnOnce(E) -> A,
{
    match either(block) {
        Ok(value) => value,
        Err(error) => on_error(error),
    }
}

/// The optionality effect, bound to one scope producing `Option<A>`.
pub struct Fail<A> {
    scope: Scope<Option<A>>,
}

impl<A> Clone for Fail<A> {
    fn clone(&self) -> Self {
        Self {
            scope: self.scope.clone(),
        }
    }
}

impl<A> fmt::Debug for Fail<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fail").field("scope", &self.scope).finish()
    }
}

impl<A: Send + 'static> Fail<A> {
    /// Short-circuit the enclosing [`option`] scope with `None`.
    pub fn fail(&self) -> ! {
        let never: Infallible = self.scope.control(|_k| None);
        match never {}
    }

    /// Unwrap `Some` or short-circuit.
    pub fn bind<T>(&self, value: Option<T>) -> T {
        match value {
            Some(t) => t,
            None => self.fail(),
        }
    }

    /// Short-circuit unless `condition` holds.
    pub fn ensure(&self, condition: bool) {
        if !condition {
            self.fail();
        }
    }
}

/// Run `block` in a scope with the optionality effect.
pub fn option<A, F>(block: F) -> Option<A>
where
    A: Send + 'static,
    F: FnOnce(&Fail<A>) -> A + Send + 'static,
{
    reset(move |scope: &Scope<Option<A>>| {
        let fail = Fail {
            scope: scope.clone(),
        };
        Some(block(&fail))
    })
}

// ============================================================================
// Tests
// ============================================================================
