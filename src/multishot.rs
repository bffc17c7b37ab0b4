//! # Multi-Shot Replay Scope
//!
//! A variant of the delimited scope whose continuations may be invoked more
//! than once. The substrate can only be driven forward once, so multi-shot
//! is simulated by deterministic replay: every live resume value is
//! recorded in an append-only log, and re-invoking a consumed continuation
//! re-executes the whole block from the start on a fresh scope, answering
//! `control` calls from the log until the recorded prefix is exhausted and
//! the execution diverges back onto the live substrate.
//!
//! ## API contract
//!
//! Block code before the matched prefix is re-executed verbatim on every
//! re-invocation. Blocks must be side-effect-free up to their last
//! `control` call, or the caller must accept duplicated side effects.
//!
//! Given a deterministic block, re-executions are fully deterministic: the
//! log is consumed in the order it was written.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::config::ScopeConfig;
use crate::error::UsageError;
use crate::replay::{clone_log, ErasedValue, LoggedValue};
use crate::scope::{
    drive_start, next_scope_id, Continuation, ControlRequest, Driver, RawContinuation, Recorder,
    ScopeId, ScopeState,
};
use crate::strand::{Prompt, Strand};

/// A re-runnable block, shared by the original execution and every replay.
pub(crate) type BlockFn<R> = dyn Fn(&MultiScope<R>) -> R + Send + Sync;

/// Multi-shot scope internals: strand bookkeeping plus the canonical replay
/// log and the block needed to re-execute it.
struct MultiCore<R> {
    id: ScopeId,
    parent: Option<ScopeId>,
    state: Cell<ScopeState>,
    strand: RefCell<Strand>,
    block: Arc<BlockFn<R>>,
    log: Mutex<Vec<LoggedValue>>,
    config: ScopeConfig,
}

impl<R: Send + 'static> Driver<R> for MultiCore<R> {
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

    fn append_log(&self, value: LoggedValue) {
        self.log.lock().push(value);
    }

    fn snapshot(&self) -> Vec<LoggedValue> {
        clone_log(&self.log.lock())
    }

    fn reinvoke(&self, seed: Vec<LoggedValue>) -> Result<R, UsageError> {
        debug!(scope = %self.id, prefix = seed.len(), "re-executing block for replay");
        Ok(run_seeded(
            Arc::clone(&self.block),
            seed,
            self.config.clone(),
            self.parent,
        ))
    }
}

/// The capability a multi-shot block receives.
///
/// Identical surface to the single-shot `Scope`, except that resume values
/// must be `Clone` (they are recorded for replay) and the block itself must
/// be re-runnable.
pub struct MultiScope<R> {
    id: ScopeId,
    parent: Option<ScopeId>,
    prompt: Prompt,
    /// Recorded prefix this execution fast-forwards through.
    prefix: Arc<Vec<LoggedValue>>,
    /// Number of `control` calls seen so far in this execution.
    depth: Arc<AtomicUsize>,
    _marker: PhantomData<fn() -> R>,
}

impl<R> Clone for MultiScope<R> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            parent: self.parent,
            prompt: self.prompt.clone(),
            prefix: Arc::clone(&self.prefix),
            depth: Arc::clone(&self.depth),
            _marker: PhantomData,
        }
    }
}

impl<R> fmt::Debug for MultiScope<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiScope")
            .field("id", &self.id)
            .field("parent", &self.parent)
            .field("replay_prefix", &self.prefix.len())
            .finish()
    }
}

impl<R: Send + 'static> MultiScope<R> {
    /// This scope's identifier.
    pub fn id(&self) -> ScopeId {
        self.id
    }

    /// The lexically enclosing scope, if any.
    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    /// Suspend the block and hand the rest of it to `handler`.
    ///
    /// While this execution is within its recorded prefix the call returns
    /// the logged value immediately without suspending; past the end of the
    /// log it behaves exactly like the single-shot `control` and the value
    /// eventually resumed is appended to the log.
    pub fn control<A, H>(&self, handler: H) -> A
    where
        A: Clone + Send + Sync + 'static,
        H: FnOnce(Continuation<A, R>) -> R + Send + 'static,
    {
        let depth = self.depth.fetch_add(1, Ordering::SeqCst);
        if depth < self.prefix.len() {
            let value = self.prefix[depth].clone_boxed().into_erased();
            return *value
                .downcast::<A>()
                .expect("replay log holds a mismatched value type at this depth");
        }
        let recorder: Recorder<A> = Box::new(|value: &A| Box::new(value.clone()) as LoggedValue);
        let request = ControlRequest {
            handler: Box::new(move |raw: RawContinuation<R>| {
                handler(Continuation::from_raw(raw, Some(recorder)))
            }),
        };
        let answer = self.prompt.suspend(Box::new(request));
        *answer
            .downcast::<A>()
            .expect("control resumed with a mismatched value type")
    }
}

/// Establish a multi-shot boundary, run `block` inside it, and return the
/// scope's final result.
///
/// Handlers may invoke their continuation any number of times; every
/// invocation after the first re-executes `block` from the start with the
/// recorded suspension results replayed (see the module docs for the
/// side-effect contract).
pub fn reset_multi<R, F>(block: F) -> R
where
    R: Send + 'static,
    F: Fn(&MultiScope<R>) -> R + Send + Sync + 'static,
{
    reset_multi_with(ScopeConfig::default(), block)
}

/// [`reset_multi`] with an explicit strand configuration.
pub fn reset_multi_with<R, F>(config: ScopeConfig, block: F) -> R
where
    R: Send + 'static,
    F: Fn(&MultiScope<R>) -> R + Send + Sync + 'static,
{
    run_seeded(Arc::new(block), Vec::new(), config, None)
}

/// Run one execution of a multi-shot block against a seeded replay log.
pub(crate) fn run_seeded<R: Send + 'static>(
    block: Arc<BlockFn<R>>,
    seed: Vec<LoggedValue>,
    config: ScopeConfig,
    parent: Option<ScopeId>,
) -> R {
    let id = next_scope_id();
    let log = Mutex::new(clone_log(&seed));
    let prefix = Arc::new(seed);
    let task = {
        let block = Arc::clone(&block);
        let prefix = Arc::clone(&prefix);
        move |prompt: &Prompt| {
            let scope = MultiScope {
                id,
                parent,
                prompt: prompt.clone(),
                prefix,
                depth: Arc::new(AtomicUsize::new(0)),
                _marker: PhantomData,
            };
            Box::new((*block)(&scope)) as ErasedValue
        }
    };
    let strand = RefCell::new(Strand::new(&config, task));
    let core: Rc<dyn Driver<R>> = Rc::new(MultiCore {
        id,
        parent,
        state: Cell::new(ScopeState::Running),
        strand,
        block,
        log,
        config,
    });
    drive_start(core)
}

// ============================================================================
// Tests
// ============================================================================
