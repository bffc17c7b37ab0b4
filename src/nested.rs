//! # Nested Scope Chaining
//!
//! Lets a `control` call made inside an inner scope target an ancestor
//! scope's handler, so effects declared by an outer `reset` stay reachable
//! from code running inside an inner one.
//!
//! ## Design
//!
//! Nesting is structural composition, not a new algorithm. Scope
//! capabilities are `Clone + Send`: an inner block captures a clone of the
//! ancestor capability it wants to reach, and calling `control` on that
//! clone routes the suspension through the ancestor's own channels to the
//! ancestor's driver, no matter which strand issued it. [`reset_nested`]
//! additionally records the parent link so the chain is observable through
//! [`Scope::parent`].
//!
//! ## Resumption ordering policy
//!
//! When an ancestor's handler runs while an inner scope is still open:
//!
//! - if the handler resumes, the value flows back to the inner call site
//!   and the inner scope continues under its own driver, which must still
//!   drive it to completion before the ancestor's block can proceed;
//! - if the handler returns without resuming, the ancestor completes and
//!   every still-suspended descendant strand unwinds silently as its
//!   channels disconnect, deepest first.
//!
//! Either way the ordering is deterministic; there is no path on which a
//! descendant outlives its ancestor's final result other than the brief
//! unwind cascade.

use crate::config::ScopeConfig;
use crate::multishot::MultiScope;
use crate::scope::{run_scope, Scope, ScopeId};

/// Common surface of the scope capabilities, used to chain a child to any
/// kind of parent.
pub trait DelimitedScope {
    /// The scope's identifier.
    fn scope_id(&self) -> ScopeId;

    /// The identifier of the lexically enclosing scope, if any.
    fn parent_scope(&self) -> Option<ScopeId>;
}

impl<R: Send + 'static> DelimitedScope for Scope<R> {
    fn scope_id(&self) -> ScopeId {
        self.id()
    }

    fn parent_scope(&self) -> Option<ScopeId> {
        self.parent()
    }
}

impl<R: Send + 'static> DelimitedScope for MultiScope<R> {
    fn scope_id(&self) -> ScopeId {
        self.id()
    }

    fn parent_scope(&self) -> Option<ScopeId> {
        self.parent()
    }
}

/// Establish a scope chained under `parent`, run `block` inside it, and
/// return its final result.
///
/// The child behaves exactly like a single-shot [`crate::reset`] scope; the
/// parent link marks where the block lexically sits so ancestor-targeted
/// effects are attributable. To actually reach the ancestor, the block
/// captures a clone of the ancestor's capability.
pub fn reset_nested<R, F>(parent: &dyn DelimitedScope, block: F) -> R
where
    R: Send + 'static,
    F: FnOnce(&Scope<R>) -> R + Send + 'static,
{
    reset_nested_with(ScopeConfig::default(), parent, block)
}

/// [`reset_nested`] with an explicit strand configuration.
pub fn reset_nested_with<R, F>(config: ScopeConfig, parent: &dyn DelimitedScope, block: F) -> R
where
    R: Send + 'static,
    F: FnOnce(&Scope<R>) -> R + Send + 'static,
{
    run_scope(config, Some(parent.scope_id()), block)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::reset;

    #[test]
    fn test_parent_link_is_recorded() {
        let (parent_id, child_parent) = reset(|outer: &Scope<(u64, Option<u64>)>| {
            let outer_id = outer.id().as_u64();
            let child_parent = reset_nested(outer, |inner: &Scope<Option<u64>>| {
                inner.parent().map(|p| p.as_u64())
            });
            (outer_id, child_parent)
        });
        assert_eq!(child_parent, Some(parent_id));
    }

    #[test]
    fn test_root_scope_has_no_parent() {
        let parent = reset(|scope: &Scope<Option<ScopeId>>| scope.parent());
        assert!(parent.is_none());
    }

    #[test]
    fn test_inner_block_targets_ancestor() {
        let result = reset(|outer: &Scope<i32>| {
            let reach_outer = outer.clone();
            let inner = reset_nested(outer, move |_inner: &Scope<i32>| {
                // Suspend into the ancestor; its handler decides what value
                // arrives back here.
                let fed: i32 = reach_outer.control(|k| k.resume(40));
                fed + 1
            });
            inner + 1
        });
        assert_eq!(result, 42);
    }

    #[test]
    fn test_ancestor_short_circuit_abandons_inner() {
        let result = reset(|outer: &Scope<&'static str>| {
            let reach_outer = outer.clone();
            let _inner: i32 = reset_nested(outer, move |_inner: &Scope<i32>| {
                let _: i32 = reach_outer.control(|_k| "short");
                unreachable!("inner block must not run past the ancestor shift");
            });
            unreachable!("outer block must not resume after its handler returned");
        });
        assert_eq!(result, "short");
    }

    #[test]
    fn test_both_scopes_usable_from_inner_block() {
        let result = reset(|outer: &Scope<i32>| {
            let reach_outer = outer.clone();
            let inner = reset_nested(outer, move |inner: &Scope<i32>| {
                let a: i32 = inner.control(|k| k.resume(1));
                let b: i32 = reach_outer.control(|k| k.resume(2));
                a + b
            });
            inner * 10
        });
        assert_eq!(result, 30);
    }
}
