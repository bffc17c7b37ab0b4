//! List-builder effect.
//!
//! A comprehension over the multi-shot scope: `bind` nondeterministically
//! picks an element of a list by invoking the continuation once per
//! element and concatenating the per-element enumerations. The block
//! produces one outcome per path; the builder collects them all, in
//! left-to-right order, exactly as the equivalent nested `flat_map` would.

use std::convert::Infallible;
use std::fmt;

use crate::multishot::{reset_multi, MultiScope};
use crate::scope::Continuation;

/// The list effect, bound to one multi-shot scope producing `Vec<T>`.
pub struct ListScope<T> {
    scope: MultiScope<Vec<T>>,
}

impl<T> Clone for ListScope<T> {
    fn clone(&self) -> Self {
        Self {
            scope: self.scope.clone(),
        }
    }
}

impl<T> fmt::Debug for ListScope<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListScope")
            .field("scope", &self.scope)
            .finish()
    }
}

impl<T: Send + 'static> ListScope<T> {
    /// Pick each element of `items` in turn; the rest of the block runs
    /// once per element and the enumerations concatenate.
    ///
    /// An empty `items` yields no outcomes for this branch.
    pub fn bind<I>(&self, items: Vec<I>) -> I
    where
        I: Clone + Send + Sync + 'static,
    {
        self.scope.control(move |k: Continuation<I, Vec<T>>| {
            let mut out = Vec::new();
            for item in items {
                out.extend(k.resume(item));
            }
            out
        })
    }

    /// Fork on a boolean, `false` first.
    pub fn choose(&self) -> bool {
        self.bind(vec![false, true])
    }

    /// Prune this path unless `condition` holds.
    pub fn guard(&self, condition: bool) {
        if !condition {
            let never: Infallible = self.scope.control(|_k| Vec::new());
            match never {}
        }
    }
}

/// Run `block` as a list comprehension: one produced value per
/// nondeterministic path, collected in enumeration order.
///
/// The block re-runs once per path (see the multi-shot replay contract),
/// so it must be side-effect-free or tolerate duplicated effects.
pub fn list<T, F>(block: F) -> Vec<T>
where
    T: Send + 'static,
    F: Fn(&ListScope<T>) -> T + Send + Sync + 'static,
{
    reset_multi(move |scope: &MultiScope<Vec<T>>| {
        let ctx = ListScope {
            scope: scope.clone(),
        };
        vec![block(&ctx)]
    })
}

// ============================================================================
// Tests
// ============================================================================
