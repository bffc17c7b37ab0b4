//! Effect handler façades.
//!
//! Thin wrappers that translate a domain operation into a `control` call on
//! exactly one scope. None of them introduces new primitive mechanism: the
//! error effect ignores its continuation, the nondeterminism effects invoke
//! it repeatedly through the multi-shot replay machinery, and the parser
//! layers both over a shared cursor.

pub mod list;
pub mod nondet;
pub mod parser;
pub mod raise;
