//! Usage-error taxonomy.
//!
//! Usage errors are protocol violations by the caller of the continuation
//! API. They are fatal: the panicking entry points (`Continuation::resume`)
//! signal them immediately, and the `try_` variants return them. They are
//! never produced by effect handlers and never recoverable through one.

use thiserror::Error;

/// A violation of the continuation-invocation protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UsageError {
    /// A single-shot continuation was invoked a second time.
    #[error("continuation already resumed (single-shot violation)")]
    AlreadyResumed,

    /// A continuation was invoked after its scope reached its final result.
    #[error("continuation invoked after its scope completed")]
    ScopeCompleted,

    /// Two OS threads entered the same suspension unit at once.
    #[error("concurrent entry into a suspension unit from two threads")]
    ConcurrentEntry,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            UsageError::AlreadyResumed.to_string(),
            "continuation already resumed (single-shot violation)"
        );
        assert_eq!(
            UsageError::ScopeCompleted.to_string(),
            "continuation invoked after its scope completed"
        );
    }
}
