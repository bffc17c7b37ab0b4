//! # Suspension Substrate
//!
//! Reifies a computation as a *strand*: a steppable unit that runs until it
//! reaches a suspension point or completes, and can later be fed a value to
//! continue running.
//!
//! ## Design
//!
//! Rust has no native delimited-continuation capture, so each strand is
//! backed by one OS thread and a pair of single-slot channels:
//!
//! - `events`: block thread -> driver (suspension values, completion, panics)
//! - `resumes`: driver -> block thread (resume values)
//!
//! The two sides strictly alternate, so each channel holds at most one
//! message at a time. The strand is the only place in the crate that knows
//! how to pause mid-computation and come back later; every higher layer is
//! built from `start`, `resume`, `is_done`, `value`, and `result`.
//!
//! ## Abandonment
//!
//! A suspended strand whose driver goes away (an abandoned continuation) is
//! unwound with the private [`Abandoned`] marker as soon as its channels
//! disconnect. The thread root recognizes the marker and terminates
//! silently. The marker is raised with `resume_unwind`, so it never reaches
//! the panic hook, and it is excluded from the panic-propagation path by
//! construction: it can never surface as an error to user code.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::trace;

use crate::config::ScopeConfig;
use crate::error::UsageError;
use crate::replay::ErasedValue;

/// Unique identifier for a strand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StrandId(u64);

impl StrandId {
    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for StrandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Strand({})", self.0)
    }
}

/// Global strand ID counter.
static NEXT_STRAND_ID: AtomicU64 = AtomicU64::new(1);

/// Generate a new unique strand ID.
fn next_strand_id() -> StrandId {
    StrandId(NEXT_STRAND_ID.fetch_add(1, Ordering::Relaxed))
}

/// Strand execution state, as seen by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrandState {
    /// Constructed but not yet started; no thread exists.
    #[default]
    Created,
    /// Stopped at a suspension point, waiting for a resume value.
    Suspended,
    /// The computation has completed (normally or by panic).
    Done,
}

/// Marker payload used to unwind an abandoned strand thread.
///
/// Raised via `resume_unwind` so the panic hook never fires, and matched by
/// type at the thread root. Not an error: ordinary catch-all recovery logic
/// in the crate never treats it as one.
pub(crate) struct Abandoned;

/// Unwind the current strand because its driver disappeared.
pub(crate) fn abandon() -> ! {
    trace!("strand abandoned, unwinding");
    panic::resume_unwind(Box::new(Abandoned))
}

/// An event reported by the block thread to the driver.
enum StrandEvent {
    /// The computation suspended, yielding a value.
    Suspended(ErasedValue),
    /// The computation completed with a final value.
    Completed(ErasedValue),
    /// The computation panicked; the payload is re-raised by the driver.
    Panicked(Box<dyn std::any::Any + Send>),
}

/// The block-side capability of a strand: the sole suspension point.
///
/// Handed by reference to the computation a strand runs. Cloneable so that
/// scope capabilities built on top of it can be captured by nested blocks.
#[derive(Clone)]
pub struct Prompt {
    events: Sender<StrandEvent>,
    resumes: Receiver<ErasedValue>,
}

impl Prompt {
    /// Suspend the computation, yielding `value` to the driver, and block
    /// until the driver feeds a resume value back.
    ///
    /// If the driver has gone away the calling thread unwinds silently; the
    /// code after the suspension point is never executed.
    pub fn suspend(&self, value: ErasedValue) -> ErasedValue {
        if self.events.send(StrandEvent::Suspended(value)).is_err() {
            abandon();
        }
        match self.resumes.recv() {
            Ok(v) => v,
            Err(_) => abandon(),
        }
    }
}

impl fmt::Debug for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Prompt").finish_non_exhaustive()
    }
}

/// A suspendable computation and the driver-side handles to step it.
pub struct Strand {
    /// Unique identifier.
    id: StrandId,
    /// Current state, from the driver's point of view.
    state: StrandState,
    /// Compare-and-swap entry guard. Rejects accidental concurrent entry
    /// from a second OS thread; it does not make strands parallel-safe.
    entry: AtomicBool,
    /// The computation, consumed when the backing thread is spawned.
    task: Option<Box<dyn FnOnce(&Prompt) -> ErasedValue + Send>>,
    /// Block-side endpoints, moved into the backing thread on start.
    prompt: Option<Prompt>,
    /// Driver-side endpoints.
    events: Receiver<StrandEvent>,
    resumes: Sender<ErasedValue>,
    /// Last yielded suspension value, if not yet taken.
    last_value: Option<ErasedValue>,
    /// Final value, if completed and not yet taken.
    final_result: Option<ErasedValue>,
    /// Thread name and stack size for the backing thread.
    thread_name: String,
    stack_size: usize,
}

impl Strand {
    /// Create a strand for a computation. No thread is spawned until
    /// [`start`](Self::start).
    pub fn new<F>(config: &ScopeConfig, task: F) -> Self
    where
        F: FnOnce(&Prompt) -> ErasedValue + Send + 'static,
    {
        let id = next_strand_id();
        let (event_tx, event_rx) = bounded(1);
        let (resume_tx, resume_rx) = bounded(1);
        Self {
            id,
            state: StrandState::Created,
            entry: AtomicBool::new(false),
            task: Some(Box::new(task)),
            prompt: Some(Prompt {
                events: event_tx,
                resumes: resume_rx,
            }),
            events: event_rx,
            resumes: resume_tx,
            last_value: None,
            final_result: None,
            thread_name: format!("{}-{}", config.name_prefix(), id.as_u64()),
            stack_size: config.stack_size,
        }
    }

    /// Get the strand ID.
    pub fn id(&self) -> StrandId {
        self.id
    }

    /// Get the current state.
    pub fn state(&self) -> StrandState {
        self.state
    }

    /// Check if the computation has completed.
    pub fn is_done(&self) -> bool {
        self.state == StrandState::Done
    }

    /// Take the last yielded suspension value.
    pub fn value(&mut self) -> Option<ErasedValue> {
        self.last_value.take()
    }

    /// Take the final value of a completed computation.
    pub fn result(&mut self) -> Option<ErasedValue> {
        self.final_result.take()
    }

    /// Spawn the backing thread and run the computation until it suspends
    /// or completes.
    ///
    /// # Panics
    ///
    /// Re-raises any panic from inside the computation. Panics on a second
    /// `start`, or if the strand is entered concurrently.
    pub fn start(&mut self) {
        self.enter();
        let task = self.task.take().expect("strand already started");
        let prompt = self.prompt.take().expect("strand bootstrap consumed");
        trace!(strand = %self.id, "starting");

        let builder = thread::Builder::new()
            .name(self.thread_name.clone())
            .stack_size(self.stack_size);
        builder
            .spawn(move || {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| task(&prompt)));
                match outcome {
                    Ok(value) => {
                        let _ = prompt.events.send(StrandEvent::Completed(value));
                    }
                    Err(payload) if payload.is::<Abandoned>() => {
                        // Normal termination of an abandoned strand.
                    }
                    Err(payload) => {
                        let _ = prompt.events.send(StrandEvent::Panicked(payload));
                    }
                }
            })
            .expect("failed to spawn strand thread");

        self.wait_event();
        self.leave();
    }

    /// Feed a resume value to a suspended computation and run it until the
    /// next suspension or completion.
    ///
    /// # Panics
    ///
    /// Re-raises any panic from inside the computation. Panics if the
    /// strand is not suspended, or if it is entered concurrently.
    pub fn resume(&mut self, value: ErasedValue) {
        self.enter();
        assert_eq!(
            self.state,
            StrandState::Suspended,
            "resume on a strand that is not suspended"
        );
        trace!(strand = %self.id, "resuming");
        self.resumes
            .send(value)
            .unwrap_or_else(|_| panic!("strand {} terminated while suspended", self.id));
        self.wait_event();
        self.leave();
    }

    /// Block until the computation reports its next event.
    fn wait_event(&mut self) {
        match self.events.recv() {
            Ok(StrandEvent::Suspended(value)) => {
                trace!(strand = %self.id, "suspended");
                self.state = StrandState::Suspended;
                self.last_value = Some(value);
            }
            Ok(StrandEvent::Completed(value)) => {
                trace!(strand = %self.id, "completed");
                self.state = StrandState::Done;
                self.final_result = Some(value);
            }
            Ok(StrandEvent::Panicked(payload)) => {
                trace!(strand = %self.id, "panicked");
                self.state = StrandState::Done;
                self.leave();
                panic::resume_unwind(payload);
            }
            Err(_) => {
                // The strand vanished without an event. That only happens
                // when a scope higher up was abandoned and the disconnect is
                // cascading through nested drivers; continue the unwind.
                trace!(strand = %self.id, "driver abandoned mid-drive");
                self.leave();
                abandon();
            }
        }
    }

    /// Acquire the entry guard.
    fn enter(&self) {
        if self
            .entry
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            panic!("{}", UsageError::ConcurrentEntry);
        }
    }

    /// Release the entry guard.
    fn leave(&self) {
        self.entry.store(false, Ordering::Release);
    }
}

impl fmt::Debug for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Strand")
            .field("id", &self.id)
            .field("state", &self.state)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
