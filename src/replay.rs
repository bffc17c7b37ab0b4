//! Replay Log
//!
//! Clone-boxed, type-erased resume values for the multi-shot replay
//! strategy. A multi-shot scope records every value fed to it during a live
//! run; re-invoking a captured continuation re-executes the block from the
//! start and answers the first N `control` calls from this record instead of
//! suspending.
//!
//! Values must be `Clone` because the same recorded entry is replayed by any
//! number of re-executions, each of which takes an owned copy.

use std::any::Any;

/// A type-erased value that can cross the driver/strand boundary.
pub(crate) type ErasedValue = Box<dyn Any + Send>;

/// A recorded resume value: cloneable, sendable, type-erased.
pub(crate) type LoggedValue = Box<dyn ReplayValue>;

/// Object-safe clone-and-erase surface for recorded resume values.
pub(crate) trait ReplayValue: Send + Sync {
    /// Clone the value behind a fresh box.
    fn clone_boxed(&self) -> LoggedValue;

    /// Convert the box into the erasure used by the suspension substrate.
    fn into_erased(self: Box<Self>) -> ErasedValue;
}

impl<T: Clone + Send + Sync + 'static> ReplayValue for T {
    fn clone_boxed(&self) -> LoggedValue {
        Box::new(self.clone())
    }

    fn into_erased(self: Box<Self>) -> ErasedValue {
        self
    }
}

/// Clone a whole log. Used to seed replay re-executions.
pub(crate) fn clone_log(log: &[LoggedValue]) -> Vec<LoggedValue> {
    log.iter().map(|entry| entry.as_ref().clone_boxed()).collect()
}
