//! # Delimited Scope
//!
//! The central "reset"/"shift" primitive, built on the suspension substrate.
//!
//! ## Design
//!
//! [`reset`] establishes a boundary: it creates a scope, runs a block inside
//! it on a strand, and drives that strand to a single final result. The
//! block suspends by calling [`Scope::control`] with a handler function; the
//! handler receives a [`Continuation`] for the rest of the block and decides
//! the scope's result, invoking the continuation zero or one times (or, for
//! multi-shot scopes, many times).
//!
//! ## Driving and waiters
//!
//! A `control` call ships its handler to the driver as the strand's
//! suspension value. The driver invokes the handler; if the handler invokes
//! its continuation, the driver re-enters the same machinery for the next
//! suspension, so nested resumptions stack up as blocked `resume` calls.
//! Each such call is a waiter on the scope's eventual value: once the root
//! result is known it returns through the blocked calls in reverse
//! completion order, unwinding every pending suspension deterministically.
//! The last handler to return decides the scope's final result.
//!
//! ## Single-shot
//!
//! Continuations captured by [`reset`] may be invoked at most once.
//! Invoking one a second time delegates to the scope's reinvocation seam:
//! single-shot scopes reject it as a usage error, while the multi-shot
//! variant replays (see the `multishot` module).

use std::cell::{Cell, RefCell};
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::config::ScopeConfig;
use crate::error::UsageError;
use crate::replay::{clone_log, ErasedValue, LoggedValue};
use crate::strand::{Prompt, Strand};

/// Unique identifier for a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u64);

impl ScopeId {
    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scope({})", self.0)
    }
}

/// Global scope ID counter.
static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

/// Generate a new unique scope ID.
pub(crate) fn next_scope_id() -> ScopeId {
    ScopeId(NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed))
}

/// Scope lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeState {
    /// The block is executing between suspension points.
    Running,
    /// The block is stopped at a `control` call.
    Suspended,
    /// The final result has been produced.
    Completed,
}

/// Driver-side surface of a scope, shared by the single-shot and multi-shot
/// variants. The reinvocation seam is where the two differ: re-invoking a
/// consumed continuation is a usage error on a single-shot scope and a
/// replay on a multi-shot one.
pub(crate) trait Driver<R> {
    /// The scope's identifier, for diagnostics.
    fn id(&self) -> ScopeId;

    /// The strand executing the scope's block.
    fn strand(&self) -> &RefCell<Strand>;

    /// Current lifecycle state.
    fn state(&self) -> ScopeState;

    /// Advance the lifecycle state.
    fn set_state(&self, state: ScopeState);

    /// Record a live resume value. No-op for single-shot scopes, which
    /// never replay.
    fn append_log(&self, value: LoggedValue);

    /// Snapshot of the replay log at this instant. Empty for single-shot
    /// scopes.
    fn snapshot(&self) -> Vec<LoggedValue>;

    /// Re-run the scope's block from the start against a seeded replay log.
    fn reinvoke(&self, seed: Vec<LoggedValue>) -> Result<R, UsageError>;
}

/// The suspension value shipped from a `control` call to the driver.
pub(crate) struct ControlRequest<R> {
    pub(crate) handler: Box<dyn FnOnce(RawContinuation<R>) -> R + Send>,
}

/// Untyped continuation state built driver-side and handed to the erased
/// handler, which wraps it into a typed [`Continuation`].
pub(crate) struct RawContinuation<R> {
    pub(crate) driver: Rc<dyn Driver<R>>,
    pub(crate) snapshot: Vec<LoggedValue>,
}

/// A recorder turning a typed resume value into a replay-log entry.
pub(crate) type Recorder<A> = Box<dyn Fn(&A) -> LoggedValue + Send>;

/// Run the block's strand from the beginning and drive it to the scope's
/// final result.
pub(crate) fn drive_start<R: Send + 'static>(driver: Rc<dyn Driver<R>>) -> R {
    driver.strand().borrow_mut().start();
    dispatch(driver)
}

/// Feed a resume value into the suspended strand and drive to the scope's
/// final result.
pub(crate) fn drive_resume<R: Send + 'static>(driver: Rc<dyn Driver<R>>, value: ErasedValue) -> R {
    driver.set_state(ScopeState::Running);
    driver.strand().borrow_mut().resume(value);
    dispatch(driver)
}

/// Inspect the strand after an advance: either the block finished and its
/// value is the result, or it suspended and the pending handler decides.
fn dispatch<R: Send + 'static>(driver: Rc<dyn Driver<R>>) -> R {
    let payload = {
        let mut strand = driver.strand().borrow_mut();
        if strand.is_done() {
            let result = strand
                .result()
                .expect("completed strand must leave a result");
            drop(strand);
            driver.set_state(ScopeState::Completed);
            debug!(scope = %driver.id(), "block completed");
            return *result
                .downcast::<R>()
                .expect("scope result type mismatch");
        }
        strand
            .value()
            .expect("suspended strand must yield a control request")
    };
    driver.set_state(ScopeState::Suspended);
    debug!(scope = %driver.id(), "control suspension");
    let request = payload
        .downcast::<ControlRequest<R>>()
        .expect("suspension must carry a control request");
    let raw = RawContinuation {
        snapshot: driver.snapshot(),
        driver: Rc::clone(&driver),
    };
    let result = (request.handler)(raw);
    driver.set_state(ScopeState::Completed);
    result
}

/// The rest of a scope's computation, waiting for a value of type `A`.
///
/// Owned by the handler that received it from a `control` call. Invoking it
/// transfers control back into the scope's block and returns the scope's
/// eventual final result.
pub struct Continuation<A, R> {
    raw: RawContinuation<R>,
    consumed: Cell<bool>,
    record: Option<Recorder<A>>,
    _marker: PhantomData<fn(A)>,
}

impl<A: Send + 'static, R: Send + 'static> Continuation<A, R> {
    pub(crate) fn from_raw(raw: RawContinuation<R>, record: Option<Recorder<A>>) -> Self {
        Self {
            raw,
            consumed: Cell::new(false),
            record,
            _marker: PhantomData,
        }
    }

    /// Resume the scope's block with `value` and drive it to the scope's
    /// final result, which becomes this call's return value.
    ///
    /// # Panics
    ///
    /// Panics with a [`UsageError`] message if this is a second invocation
    /// of a single-shot continuation, or if the scope already completed.
    pub fn resume(&self, value: A) -> R {
        match self.try_resume(value) {
            Ok(result) => result,
            Err(e) => panic!("{e}"),
        }
    }

    /// Resume, reporting protocol violations instead of panicking.
    ///
    /// # Errors
    ///
    /// [`UsageError::AlreadyResumed`] on a second invocation of a
    /// single-shot continuation; [`UsageError::ScopeCompleted`] if the
    /// scope's final result was already produced elsewhere.
    pub fn try_resume(&self, value: A) -> Result<R, UsageError> {
        if self.consumed.get() {
            // Consumed: fall through to the scope's reinvocation seam.
            let recorded = match &self.record {
                Some(record) => record(&value),
                None => return Err(UsageError::AlreadyResumed),
            };
            let mut seed = clone_log(&self.raw.snapshot);
            seed.push(recorded);
            return self.raw.driver.reinvoke(seed);
        }
        if self.raw.driver.state() == ScopeState::Completed {
            return Err(UsageError::ScopeCompleted);
        }
        self.consumed.set(true);
        if let Some(record) = &self.record {
            self.raw.driver.append_log(record(&value));
        }
        Ok(drive_resume(Rc::clone(&self.raw.driver), Box::new(value)))
    }

    /// Check whether the live strand behind this continuation has been
    /// consumed.
    pub fn is_consumed(&self) -> bool {
        self.consumed.get()
    }
}

impl<A, R> fmt::Debug for Continuation<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Continuation")
            .field("scope", &self.raw.driver.id())
            .field("consumed", &self.consumed.get())
            .finish()
    }
}

/// Single-shot scope internals: the strand plus lifecycle bookkeeping.
struct ScopeCore<R> {
    id: ScopeId,
    state: Cell<ScopeState>,
    strand: RefCell<Strand>,
    _marker: PhantomData<fn() -> R>,
}

impl<R: Send + 'static> Driver<R> for ScopeCore<R> {
    fn id(&self) -> ScopeId {
        self.id
    }

    fn strand(&self) -> &RefCell<Strand> {
        &self.strand
    }

    fn state(&self) -> ScopeState {
        self.state.get()
    }

    fn set_state(&self, state: ScopeState) {
        self.state.set(state);
    }

    fn append_log(&self, _value: LoggedValue) {}

    fn snapshot(&self) -> Vec<LoggedValue> {
        Vec::new()
    }

    fn reinvoke(&self, _seed: Vec<LoggedValue>) -> Result<R, UsageError> {
        Err(UsageError::AlreadyResumed)
    }
}

/// The capability a single-shot block receives: its handle for suspending
/// into the enclosing boundary.
///
/// Cloneable and sendable so nested blocks can capture it and target this
/// scope from inside an inner one.
pub struct Scope<R> {
    pub(crate) id: ScopeId,
    pub(crate) parent: Option<ScopeId>,
    pub(crate) prompt: Prompt,
    pub(crate) _marker: PhantomData<fn() -> R>,
}

impl<R> Clone for Scope<R> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            parent: self.parent,
            prompt: self.prompt.clone(),
            _marker: PhantomData,
        }
    }
}

impl<R> fmt::Debug for Scope<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.id)
            .field("parent", &self.parent)
            .finish()
    }
}

impl<R: Send + 'static> Scope<R> {
    /// This scope's identifier.
    pub fn id(&self) -> ScopeId {
        self.id
    }

    /// The lexically enclosing scope, if this one was opened with
    /// `reset_nested`.
    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    /// Suspend the block and hand the rest of it to `handler` as a
    /// [`Continuation`].
    ///
    /// The handler's return value becomes the scope's final result. The
    /// block's remaining code runs only if the handler invokes the
    /// continuation, and the value it later produces resolves the
    /// continuation call, not this scope directly. This call returns the
    /// value the continuation was eventually resumed with.
    pub fn control<A, H>(&self, handler: H) -> A
    where
        A: Send + 'static,
        H: FnOnce(Continuation<A, R>) -> R + Send + 'static,
    {
        let request = ControlRequest {
            handler: Box::new(move |raw: RawContinuation<R>| {
                handler(Continuation::from_raw(raw, None))
            }),
        };
        let answer = self.prompt.suspend(Box::new(request));
        *answer
            .downcast::<A>()
            .expect("control resumed with a mismatched value type")
    }
}

/// Establish a delimited boundary, run `block` inside it, and return the
/// scope's final result.
///
/// For a block that never calls [`Scope::control`], this is the identity:
/// the block's return value is the result.
pub fn reset<R, F>(block: F) -> R
where
    R: Send + 'static,
    F: FnOnce(&Scope<R>) -> R + Send + 'static,
{
    reset_with(ScopeConfig::default(), block)
}

/// [`reset`] with an explicit strand configuration.
pub fn reset_with<R, F>(config: ScopeConfig, block: F) -> R
where
    R: Send + 'static,
    F: FnOnce(&Scope<R>) -> R + Send + 'static,
{
    run_scope(config, None, block)
}

/// Shared constructor for root and nested single-shot scopes.
pub(crate) fn run_scope<R, F>(config: ScopeConfig, parent: Option<ScopeId>, block: F) -> R
where
    R: Send + 'static,
    F: FnOnce(&Scope<R>) -> R + Send + 'static,
{
    let id = next_scope_id();
    let task = move |prompt: &Prompt| {
        let scope = Scope {
            id,
            parent,
            prompt: prompt.clone(),
            _marker: PhantomData,
        };
        Box::new(block(&scope)) as ErasedValue
    };
    let core: Rc<dyn Driver<R>> = Rc::new(ScopeCore {
        id,
        state: Cell::new(ScopeState::Running),
        strand: RefCell::new(Strand::new(&config, task)),
        _marker: PhantomData,
    });
    drive_start(core)
}

// ============================================================================
// Tests
// ============================================================================
