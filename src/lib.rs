//! # Delimit
//!
//! Delimited continuations and algebraic effect handlers for Rust:
//!
//! - **Suspension substrate**: computations reified as steppable strands
//! - **Delimited scopes**: the `reset`/`control` ("shift") primitive
//! - **Multi-shot replay**: invoke one captured continuation many times
//! - **Effect handlers**: short-circuiting errors, nondeterministic
//!   choice, list comprehension, backtracking parser combinators
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          DELIMIT                                │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────────┐  │
//! │  │   raise     │  │   nondet    │  │        parser           │  │
//! │  │  (either)   │  │   (list)    │  │  (attempt, alt, many)   │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────────┘  │
//! │         │                │                     │                │
//! │         └────────────────┼─────────────────────┘                │
//! │                          │                                      │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐           │
//! │  │    scope     │  │  multishot   │  │    nested    │           │
//! │  │  (reset/     │  │  (replay     │  │  (ancestor   │           │
//! │  │   control)   │  │   log)       │  │   chaining)  │           │
//! │  └──────────────┘  └──────────────┘  └──────────────┘           │
//! │                          │                                      │
//! │                  ┌───────────────┐                              │
//! │                  │    strand     │                              │
//! │                  │  (suspension  │                              │
//! │                  │   substrate)  │                              │
//! │                  └───────────────┘                              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use delimit::{either, list};
//!
//! // Short-circuiting error effect.
//! let checked: Result<i32, String> = either(|r| {
//!     let n = r.bind(Ok::<i32, String>(11));
//!     r.ensure(n <= 10, || "too big".to_string());
//!     n
//! });
//! assert_eq!(checked, Err("too big".to_string()));
//!
//! // Nondeterministic list comprehension.
//! let pairs = list(|l| {
//!     let a = l.bind(vec![1, 2]);
//!     let b = l.bind(vec![10, 20]);
//!     a + b
//! });
//! assert_eq!(pairs, vec![11, 21, 12, 22]);
//! ```
//!
//! ## Model
//!
//! There is a single logical thread of control per scope tree. The OS
//! threads behind strands exist only to implement suspension; the only
//! legal suspension points are `control` calls, and effects run in exact
//! left-to-right order. A continuation that is never invoked is abandoned:
//! its strand unwinds silently once the scope is dropped, and resources
//! acquired before the suspension point are the caller's responsibility.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod multishot;
pub mod nested;
mod replay;
pub mod scope;
pub mod strand;

// Re-exports
pub use config::ScopeConfig;
pub use error::UsageError;
pub use handlers::list::{list, ListScope};
pub use handlers::nondet::{nondet, Alternative, Choice};
pub use handlers::parser::{parse, ParseError, Parser};
pub use handlers::raise::{either, option, recover, Fail, Raise};
pub use multishot::{reset_multi, reset_multi_with, MultiScope};
pub use nested::{reset_nested, reset_nested_with, DelimitedScope};
pub use scope::{reset, reset_with, Continuation, Scope, ScopeId, ScopeState};
pub use strand::{Prompt, Strand, StrandId, StrandState};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
