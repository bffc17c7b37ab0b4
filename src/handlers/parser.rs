//! Backtracking parser combinators.
//!
//! A parser is a block over a [`Parser`] context: an input string, a cursor
//! offset, and the error effect of the enclosing [`parse`] scope. Failure
//! is a raised [`ParseError`]; alternation runs through the choice effect
//! on a multi-shot scope with first-success folding.
//!
//! The cursor moves monotonically forward as input is consumed and is
//! rolled back only by the explicit backtracking combinators:
//! [`Parser::attempt`] and [`Parser::optional`] restore it on failure,
//! [`Parser::look_ahead`] restores it even on success. Everything else
//! commits, including a failing branch's partial consumption.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use thiserror::Error;

use crate::handlers::nondet::{nondet, Choice};
use crate::handlers::raise::{either, Raise};

/// A parse failure at a cursor offset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error at offset {offset}: expected {expected}, found {found}")]
pub struct ParseError {
    /// Cursor offset at which the failure was detected.
    pub offset: usize,
    /// What the failing parser was looking for.
    pub expected: String,
    /// What was actually there.
    pub found: String,
}

impl ParseError {
    /// Create a parse error.
    pub fn new(offset: usize, expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self {
            offset,
            expected: expected.into(),
            found: found.into(),
        }
    }
}

/// The identity element of alternation: the error of a choice with no
/// branches at all.
impl Default for ParseError {
    fn default() -> Self {
        Self::new(0, "an alternative to match", "no branches")
    }
}

/// Erased handle to the error effect of whichever `parse` scope currently
/// contains the cursor, so one `Parser` type serves sub-parses of any
/// result type.
trait RaiseParse: Send + Sync {
    fn raise_parse(&self, error: ParseError);
}

impl<A: Send + 'static> RaiseParse for Raise<A, ParseError> {
    fn raise_parse(&self, error: ParseError) {
        self.raise(error)
    }
}

/// Parsing context: shared input, shared cursor, and the enclosing scope's
/// error effect.
#[derive(Clone)]
pub struct Parser {
    input: Arc<str>,
    pos: Arc<AtomicUsize>,
    raise: Arc<dyn RaiseParse>,
}

impl fmt::Debug for Parser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("offset", &self.offset())
            .field("len", &self.input.len())
            .finish()
    }
}

/// Run a parser block against `input`.
///
/// The block's return value surfaces as `Ok`; any uncontained failure
/// surfaces as `Err` with the cursor's error.
pub fn parse<A, F>(input: impl Into<String>, block: F) -> Result<A, ParseError>
where
    A: Send + 'static,
    F: FnOnce(&Parser) -> A + Send + 'static,
{
    let input: Arc<str> = Arc::from(input.into());
    run_at(input, Arc::new(AtomicUsize::new(0)), block)
}

/// Run a parser block in a fresh error scope against an existing input and
/// cursor. Used by `parse` at offset zero and by the backtracking
/// combinators mid-input.
fn run_at<A, F>(input: Arc<str>, pos: Arc<AtomicUsize>, block: F) -> Result<A, ParseError>
where
    A: Send + 'static,
    F: FnOnce(&Parser) -> A + Send + 'static,
{
    either(move |raise: &Raise<A, ParseError>| {
        let parser = Parser {
            input,
            pos,
            raise: Arc::new(raise.clone()),
        };
        block(&parser)
    })
}

impl Parser {
    /// Current cursor offset in bytes.
    pub fn offset(&self) -> usize {
        self.pos.load(Ordering::SeqCst)
    }

    fn set_offset(&self, offset: usize) {
        self.pos.store(offset, Ordering::SeqCst);
    }

    fn advance(&self, bytes: usize) {
        self.pos.fetch_add(bytes, Ordering::SeqCst);
    }

    fn rest(&self) -> &str {
        &self.input[self.offset()..]
    }

    fn describe_next(&self) -> String {
        match self.rest().chars().next() {
            Some(c) => format!("{c:?}"),
            None => "end of input".to_string(),
        }
    }

    /// Check whether the whole input has been consumed.
    pub fn at_end(&self) -> bool {
        self.rest().is_empty()
    }

    /// Fail the current parse scope with `error`.
    pub fn fail<T>(&self, error: ParseError) -> T {
        self.raise.raise_parse(error);
        unreachable!("raise_parse short-circuits the parse scope")
    }

    /// Look at the next character without consuming it.
    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Consume and return the next character; fails at end of input.
    pub fn any_char(&self) -> char {
        match self.peek() {
            Some(c) => {
                self.advance(c.len_utf8());
                c
            }
            None => self.fail(ParseError::new(
                self.offset(),
                "any character",
                "end of input",
            )),
        }
    }

    /// Consume the next character if it satisfies `pred`; fail otherwise.
    pub fn satisfy(&self, expected: &str, pred: impl Fn(char) -> bool) -> char {
        match self.peek() {
            Some(c) if pred(c) => {
                self.advance(c.len_utf8());
                c
            }
            _ => self.fail(ParseError::new(
                self.offset(),
                expected,
                self.describe_next(),
            )),
        }
    }

    /// Consume exactly `expected`.
    pub fn ch(&self, expected: char) -> char {
        self.satisfy(&format!("{expected:?}"), |c| c == expected)
    }

    /// Consume the exact string `expected`.
    pub fn literal(&self, expected: &str) {
        if self.rest().starts_with(expected) {
            self.advance(expected.len());
        } else {
            self.fail::<()>(ParseError::new(
                self.offset(),
                format!("{expected:?}"),
                self.describe_next(),
            ));
        }
    }

    /// Consume the longest (possibly empty) prefix whose characters all
    /// satisfy `pred`.
    pub fn take_while(&self, pred: impl Fn(char) -> bool) -> String {
        let rest = self.rest();
        let end = rest
            .char_indices()
            .find(|(_, c)| !pred(*c))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let matched = rest[..end].to_string();
        self.advance(end);
        matched
    }

    /// Like [`take_while`](Self::take_while) but fails on an empty match.
    pub fn take_while1(&self, expected: &str, pred: impl Fn(char) -> bool) -> String {
        let matched = self.take_while(pred);
        if matched.is_empty() {
            self.fail(ParseError::new(
                self.offset(),
                expected,
                self.describe_next(),
            ))
        } else {
            matched
        }
    }

    /// Consume one or more ASCII digits.
    pub fn digits(&self) -> String {
        self.take_while1("digits", |c| c.is_ascii_digit())
    }

    /// Consume one or more digits and parse them as an integer.
    pub fn integer(&self) -> i64 {
        let start = self.offset();
        let text = self.digits();
        match text.parse::<i64>() {
            Ok(n) => n,
            Err(_) => self.fail(ParseError::new(start, "an integer", format!("{text:?}"))),
        }
    }

    /// Skip any whitespace.
    pub fn ws(&self) {
        self.take_while(|c| c.is_whitespace());
    }

    /// Fail unless the whole input has been consumed.
    pub fn end(&self) {
        if !self.at_end() {
            self.fail::<()>(ParseError::new(
                self.offset(),
                "end of input",
                self.describe_next(),
            ));
        }
    }

    /// Run `p` in a contained sub-parse.
    ///
    /// On failure the cursor is restored to where it was before the
    /// attempt; on success it stays exactly where `p` advanced it.
    pub fn attempt<A, P>(&self, p: P) -> Result<A, ParseError>
    where
        A: Send + 'static,
        P: FnOnce(&Parser) -> A + Send + 'static,
    {
        let saved = self.offset();
        let result = run_at(Arc::clone(&self.input), Arc::clone(&self.pos), p);
        if result.is_err() {
            self.set_offset(saved);
        }
        result
    }

    /// Run `p`, mapping failure to `None` with the cursor restored.
    pub fn optional<A, P>(&self, p: P) -> Option<A>
    where
        A: Send + 'static,
        P: FnOnce(&Parser) -> A + Send + 'static,
    {
        self.attempt(p).ok()
    }

    /// Run `p` and restore the cursor whether it succeeded or failed;
    /// failure propagates.
    pub fn look_ahead<A, P>(&self, p: P) -> A
    where
        A: Send + 'static,
        P: FnOnce(&Parser) -> A + Send + 'static,
    {
        let saved = self.offset();
        let result = run_at(Arc::clone(&self.input), Arc::clone(&self.pos), p);
        self.set_offset(saved);
        match result {
            Ok(value) => value,
            Err(error) => self.fail(error),
        }
    }

    /// Apply `p` zero or more times until it fails, collecting the
    /// results. Stops after a match that consumed no input.
    pub fn many<A, P>(&self, p: P) -> Vec<A>
    where
        A: Send + 'static,
        P: Fn(&Parser) -> A + Send + Sync + 'static,
    {
        let p = Arc::new(p);
        let mut out = Vec::new();
        loop {
            let before = self.offset();
            let step = Arc::clone(&p);
            match self.attempt(move |c| (*step)(c)) {
                Ok(item) => {
                    out.push(item);
                    if self.offset() == before {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
        out
    }

    /// Apply `p` one or more times; the first application's failure is the
    /// combinator's failure.
    pub fn many1<A, P>(&self, p: P) -> Vec<A>
    where
        A: Send + 'static,
        P: Fn(&Parser) -> A + Send + Sync + 'static,
    {
        let p = Arc::new(p);
        let first = (*p)(self);
        let rest = self.many(move |c| (*p)(c));
        let mut out = vec![first];
        out.extend(rest);
        out
    }

    /// Parse zero or more `p` separated by `sep`.
    pub fn sep_by<A, P, S>(&self, p: P, sep: S) -> Vec<A>
    where
        A: Send + 'static,
        P: Fn(&Parser) -> A + Send + Sync + 'static,
        S: Fn(&Parser) + Send + Sync + 'static,
    {
        let p = Arc::new(p);
        let sep = Arc::new(sep);
        let mut out = Vec::new();
        let head = {
            let p = Arc::clone(&p);
            self.attempt(move |c| (*p)(c))
        };
        match head {
            Ok(item) => out.push(item),
            Err(_) => return out,
        }
        loop {
            let p = Arc::clone(&p);
            let sep = Arc::clone(&sep);
            match self.attempt(move |c| {
                (*sep)(c);
                (*p)(c)
            }) {
                Ok(item) => out.push(item),
                Err(_) => break,
            }
        }
        out
    }

    /// Try `p`, and if it fails, `q`, through the choice effect with
    /// first-success folding. Each branch starts from the current offset;
    /// a branch's failure is contained, but the losing branch's partial
    /// consumption is only undone by the next branch's restart.
    pub fn alt<A, P, Q>(&self, p: P, q: Q) -> A
    where
        A: Send + 'static,
        P: Fn(&Parser) -> A + Send + Sync + 'static,
        Q: Fn(&Parser) -> A + Send + Sync + 'static,
    {
        let saved = self.offset();
        let input = Arc::clone(&self.input);
        let pos = Arc::clone(&self.pos);
        let p = Arc::new(p);
        let q = Arc::new(q);
        let outcome: Result<A, ParseError> =
            nondet(move |ch: &Choice<Result<A, ParseError>>| {
                let second = ch.choose();
                pos.store(saved, Ordering::SeqCst);
                if second {
                    let q = Arc::clone(&q);
                    run_at(Arc::clone(&input), Arc::clone(&pos), move |c| (*q)(c))
                } else {
                    let p = Arc::clone(&p);
                    run_at(Arc::clone(&input), Arc::clone(&pos), move |c| (*p)(c))
                }
            });
        match outcome {
            Ok(value) => value,
            Err(error) => self.fail(error),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
