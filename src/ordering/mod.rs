//! Ordering Engine
//!
//! Drag-reorder resequencing for catalog lists whose backend only accepts
//! single-item position writes:
//! - collection: client-visible order, always positions 1..N
//! - planner: minimal diff between two orders
//! - sequencer: strictly sequential writes of a diff
//! - rollback: restore the pre-move snapshot after a failed write
//! - resync: refetch the canonical order
//! - session: per-scope state machine with single-flight semantics

mod error;
mod collection;
mod planner;
mod sequencer;
mod rollback;
mod resync;
mod observer;
mod session;


use std::sync::{Mutex, MutexGuard, PoisonError};

pub use error::ReorderError;
pub use collection::{renumber, OrderedCollection, Snapshot};
pub use planner::{PositionChange, PositionDiff, ReorderPlanner};
pub use sequencer::{PersistenceSequencer, SequenceFailure};
pub use rollback::RollbackController;
pub use resync::{Resynced, Resynchronizer};
pub use observer::{ChannelObserver, ReorderEvent, ReorderObserver};
pub use session::{MoveReport, ReorderSession, SessionState};

/// Lock a std mutex, recovering the data if a holder panicked
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
